//! Потребители поверх общего диспетчера: настройки и прогресс.

use std::sync::Arc;

use eventree::{
    events, Args, ConfigStore, Dispatcher, HandlerRef, Progress, ProgressEvent, Propagate,
    PublishOptions,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Тест проверяет сценарий приложения: виджет слушает все изменения
/// параметров через предка `config`, другой компонент меняет настройки
/// командой через диспетчер.
#[test]
fn test_widget_reacts_to_config_commands() {
    let bus = Arc::new(Dispatcher::new());
    let store = ConfigStore::attach(bus.clone()).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let widget = HandlerRef::named("widget", move |args: &Args| {
        if let Some(key) = args.kw("key").and_then(Value::as_str) {
            sink.lock().push(key.to_string());
        }
        Ok(Value::Null)
    });
    bus.subscribe("config", &widget).unwrap();

    // команды публикуются без подъёма к предкам, иначе виджет увидит и их
    let only_current = PublishOptions::default().with_propagate(Propagate::CURRENT);
    bus.publish(
        events::DO_SET_PARAMETER,
        &Args::new().kwarg("key", "theme").kwarg("value", "dark"),
        &only_current,
    )
    .unwrap();
    bus.publish_args(
        events::DO_UPDATE_CONFIG,
        Args::new()
            .kwarg("config", json!({ "lang": "en", "theme": "dark" }))
            .with_options(only_current),
    )
    .unwrap();

    assert_eq!(store.get("theme"), Some(json!("dark")));
    assert_eq!(store.get("lang"), Some(json!("en")));
    assert_eq!(*seen.lock(), ["theme", "lang"]);
}

#[test]
fn test_progress_reports_through_dispatcher() {
    let bus = Arc::new(Dispatcher::new());
    let store = ConfigStore::attach(bus.clone()).unwrap();
    let progress = Progress::new(store.clone()).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    Progress::watch(&bus, move |event| sink.lock().push(event)).unwrap();

    progress.new_run(None).unwrap();
    for _ in 0..3 {
        progress.tick(1).unwrap();
    }
    progress.release().unwrap();

    assert_eq!(progress.max(), 100);
    assert_eq!(store.get("main_progress_position"), Some(json!(3)));
    assert_eq!(
        *seen.lock(),
        [
            ProgressEvent::Visible(true),
            ProgressEvent::Position(1),
            ProgressEvent::Position(2),
            ProgressEvent::Position(3),
            ProgressEvent::Visible(false),
        ]
    );
}

/// Тест проверяет, что шаблон `config:~:changed` находит только уже
/// существующие топики параметров.
#[test]
fn test_wildcard_subscription_sees_existing_parameters_only() {
    let bus = Arc::new(Dispatcher::new());
    let store = ConfigStore::attach(bus.clone()).unwrap();

    let seen = Arc::new(Mutex::new(0usize));
    let registrar = HandlerRef::new(|_: &Args| Ok(Value::Null));
    bus.subscribe(events::config_parameter_changed("a"), &registrar)
        .unwrap();

    let sink = seen.clone();
    bus.subscribe(
        "config:~:changed",
        HandlerRef::new(move |_: &Args| {
            *sink.lock() += 1;
            Ok(Value::Null)
        }),
    )
    .unwrap();

    store.set("a", json!(1)).unwrap();
    store.set("b", json!(1)).unwrap();
    assert_eq!(*seen.lock(), 1);
}
