#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use eventree::{
    topic::{resolve, WildcardMatcher},
    Args, Dispatcher, HandlerRef, Pattern, Propagate, PublishOptions, Topic,
};
use serde_json::Value;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    pattern: String,
    topics: Vec<String>,
    deep: bool,
}

fuzz_target!(|input: FuzzInput| {
    let Ok(pattern) = Pattern::new(&input.pattern) else {
        return;
    };
    let registered: Vec<Topic> = input
        .topics
        .iter()
        .filter_map(|t| Topic::new(t).ok())
        .collect();

    // Без passthrough результат - отсортированное подмножество
    // зарегистрированных топиков.
    let Ok(resolved) = resolve(&pattern, &registered, false) else {
        return;
    };
    if pattern.is_wildcard() {
        assert!(resolved.windows(2).all(|w| w[0] <= w[1]));
        let Ok(matcher) = WildcardMatcher::new(pattern.as_str()) else {
            return;
        };
        for topic in &resolved {
            assert!(registered.contains(topic));
            assert!(matcher.is_match(topic.as_str()));
        }
    } else {
        assert_eq!(resolved.len(), 1);
    }

    // Диспетчер не должен паниковать ни на каких именах.
    let events = Dispatcher::new();
    let handler = HandlerRef::new(|_: &Args| Ok(Value::Null));
    for topic in &registered {
        let _ = events.subscribe(topic, &handler);
    }
    let _ = events.subscribe(pattern.as_str(), &handler);
    let options = if input.deep {
        PublishOptions::default().with_propagate(Propagate::all())
    } else {
        PublishOptions::default()
    };
    let _ = events.publish(pattern.as_str(), &Args::new(), &options);
});
