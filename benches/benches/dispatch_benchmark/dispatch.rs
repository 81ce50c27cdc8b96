use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use eventree::{
    make_options, topic::resolve, Args, Dispatcher, HandlerRef, Pattern, Propagate,
    PublishOptions, Topic, UniqueCall,
};
use serde_json::Value;

/// Дерево `n0`, `n0:n1`, ... глубины `depth` и ширины `width` на каждом
/// уровне, по одному обработчику на топик.
fn make_tree(
    depth: usize,
    width: usize,
) -> (Dispatcher, Vec<String>) {
    let events = Dispatcher::new();
    let mut level = vec![String::new()];
    let mut all = Vec::new();

    for _ in 0..depth {
        let mut next = Vec::with_capacity(level.len() * width);
        for prefix in &level {
            for i in 0..width {
                let name = if prefix.is_empty() {
                    format!("n{i}")
                } else {
                    format!("{prefix}:n{i}")
                };
                events
                    .subscribe(name.as_str(), HandlerRef::new(|_: &Args| Ok(Value::Null)))
                    .unwrap();
                next.push(name);
            }
        }
        all.extend(next.iter().cloned());
        level = next;
    }
    (events, all)
}

fn bench_publish_to_top(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_to_top");

    for &depth in &[2usize, 4, 6] {
        let (events, all) = make_tree(depth, 3);
        let leaf = all.last().cloned().unwrap();
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &leaf, |b, leaf| {
            let options = PublishOptions::default();
            b.iter(|| {
                black_box(
                    events
                        .publish(leaf.as_str(), &Args::new(), &options)
                        .unwrap(),
                )
            })
        });
    }
    group.finish();
}

fn bench_publish_to_deep(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_to_deep");

    for &width in &[2usize, 4, 8] {
        let (events, all) = make_tree(3, width);
        group.throughput(Throughput::Elements(all.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            let options = make_options(
                Some(UniqueCall::Every),
                None,
                Some(Propagate::CURRENT | Propagate::TO_DEEP),
            );
            b.iter(|| black_box(events.publish("n0", &Args::new(), &options).unwrap()))
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("wildcard_resolve");
    let (_, all) = make_tree(3, 6);
    let registered: Vec<Topic> = all.iter().map(|s| Topic::new(s).unwrap()).collect();

    for pattern in ["n1:~:n2", "n3:*", "~:~:~", "*:n5"] {
        let pattern = Pattern::new(pattern).unwrap();
        group.throughput(Throughput::Elements(registered.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(pattern.as_str()),
            &pattern,
            |b, pattern| b.iter(|| black_box(resolve(pattern, &registered, false).unwrap())),
        );
    }
    group.finish();
}

fn bench_subscribe(c: &mut Criterion) {
    let (events, _) = make_tree(3, 4);
    let handler = HandlerRef::new(|_: &Args| Ok(Value::Null));
    c.bench_function("subscribe_existing_wildcard", |b| {
        b.iter(|| {
            events.subscribe("n0:~", &handler).unwrap();
            events.unsubscribe_everywhere(&handler).unwrap();
        })
    });
}

criterion_group!(
    benches,
    bench_publish_to_top,
    bench_publish_to_deep,
    bench_resolve,
    bench_subscribe
);
criterion_main!(benches);
