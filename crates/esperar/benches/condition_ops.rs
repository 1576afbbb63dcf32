//! Condition and Poller Benchmarks
//!
//! Benchmarks for condition evaluation, failure rendering, and the overhead of
//! a poll that succeeds on the first attempt.
//!
//! Run with: `cargo bench --bench condition_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use esperar::prelude::*;

fn collection(n: usize) -> Subject {
    Subject::Collection(
        (0..n)
            .map(|i| Element::new("li", format!("item {i}")).with_attribute("class", "row"))
            .collect(),
    )
}

fn bench_condition_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("condition_apply");

    let conditions = vec![
        ("visible", Condition::visible()),
        ("css_class", Condition::css_class("row")),
        ("text", Condition::text("item")),
        ("match_text", Condition::match_text(r"item \d+").unwrap()),
        ("size_le", Condition::size_less_than_or_equal(100)),
    ];

    for size in [1_usize, 10, 100] {
        let subject = collection(size);
        for (name, condition) in &conditions {
            group.bench_with_input(
                BenchmarkId::new(*name, size),
                &subject,
                |bench, subject| {
                    bench.iter(|| black_box(condition.apply(black_box(subject)).unwrap()));
                },
            );
        }
    }

    group.finish();
}

fn bench_failure_rendering(c: &mut Criterion) {
    let clock = Arc::new(FakeClock::new());
    let poller = Poller::new().with_clock(clock);
    let locator = FnLocator::new(Selector::css(".row"), || Ok(collection(25)));
    let spec = WaitSpec::new(0, 100).unwrap();
    let error = poller
        .poll_until(&locator, &Condition::size(3), &spec)
        .unwrap_err();

    c.bench_function("diagnostic_to_string", |bench| {
        bench.iter(|| black_box(error.to_string()));
    });
}

fn bench_immediate_success(c: &mut Criterion) {
    let poller = Poller::new().with_clock(Arc::new(FakeClock::new()));
    let locator = FnLocator::new(Selector::css("#go"), || {
        Ok(Subject::Single(Element::new("button", "Go")))
    });
    let spec = WaitSpec::default();
    let condition = Condition::visible();

    c.bench_function("poll_until_first_attempt", |bench| {
        bench.iter(|| black_box(poller.poll_until(&locator, &condition, &spec).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_condition_apply,
    bench_failure_rendering,
    bench_immediate_success
);
criterion_main!(benches);
