//! End-to-end behaviour of waits, diagnostics and soft assertions through the
//! public API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use esperar::prelude::*;

fn divs(n: usize) -> impl Fn() -> Result<Subject, LocateError> {
    move || {
        Ok(Subject::Collection(
            ["Niff", "Naff", "Nuff", "Noff"]
                .iter()
                .cycle()
                .take(n)
                .map(|text| Element::new("div", *text).displayed(false))
                .collect(),
        ))
    }
}

#[test]
fn size_mismatch_lists_every_element() {
    let poller = Poller::new().with_clock(Arc::new(FakeClock::new()));
    let locator = FnLocator::new(Selector::css(".item"), divs(3));
    let spec = WaitSpec::new(1000, 200).unwrap();

    let error = poller
        .poll_until(&locator, &Condition::size(10), &spec)
        .unwrap_err();

    assert_eq!(
        error.to_string(),
        "List size mismatch: expected: = 10, actual: 3, collection: .item\n\
         Elements: [\n\
         \t<div displayed:false>Niff</div>,\n\
         \t<div displayed:false>Naff</div>,\n\
         \t<div displayed:false>Nuff</div>\n\
         ]\n\
         Timeout: 1 s."
    );
}

#[test]
fn explanation_follows_expected_value() {
    let poller = Poller::new().with_clock(Arc::new(FakeClock::new()));
    let locator = FnLocator::new(Selector::css(".item"), divs(3));
    let spec = WaitSpec::new(1000, 200)
        .unwrap()
        .because("the page lists ten items");

    let message = poller
        .poll_until(&locator, &Condition::size(10), &spec)
        .unwrap_err()
        .to_string();

    assert!(message.contains("expected: = 10 (because the page lists ten items), actual: 3"));
}

#[test]
fn soft_mode_without_collector_fails_before_any_wait() {
    let config = EsperarConfig::default().with_assertion_mode(AssertionMode::Soft);

    let err = TestExecution::start("no collector", config, Arc::new(ListenerRegistry::new()))
        .unwrap_err();

    assert!(matches!(err, EsperarError::Configuration { .. }));
    assert!(err.to_string().contains("ErrorsCollector::register"));
}

#[test]
fn zero_timeout_evaluates_once_without_sleeping() {
    let clock = Arc::new(FakeClock::new());
    let poller = Poller::new().with_clock(clock.clone());
    let attempts = AtomicUsize::new(0);
    let locator = FnLocator::new(Selector::css("#save"), || {
        attempts.fetch_add(1, Ordering::SeqCst);
        Ok(Subject::Single(Element::new("button", "Save").displayed(false)))
    });

    let error = poller
        .poll_until(&locator, &Condition::visible(), &WaitSpec::new(0, 200).unwrap())
        .unwrap_err();

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(clock.sleep_count(), 0);
    assert_eq!(error.kind, DiagnosticKind::ConditionNotMet);
    assert!(error.to_string().ends_with("Timeout: 0 ms."));
}

#[test]
fn soft_test_reports_all_failures_at_finish() {
    let config = EsperarConfig::default()
        .with_timeout_ms(400)
        .with_poll_interval_ms(100);
    let test = TestExecution::soft("listing", config)
        .unwrap()
        .with_clock(Arc::new(FakeClock::new()));
    let items = FnLocator::new(Selector::css(".item"), divs(4));
    let missing = FnLocator::new(Selector::test_id("toast"), || {
        Err(LocateError::not_found("[data-testid=\"toast\"]"))
    });

    assert!(test.should(&items, &Condition::size_greater_than(2)).unwrap().is_some());
    assert!(test.should(&items, &Condition::visible()).unwrap().is_none());
    assert!(test.should(&missing, &Condition::visible()).unwrap().is_none());
    assert!(test.should(&missing, &Condition::hidden()).unwrap().is_some());

    let failure = test.finish().unwrap_err();
    let message = failure.to_string();

    assert!(message.starts_with("Test listing failed.\n2 checks failed"));
    assert!(message.contains("FAIL #1: Each element should be visible {.item}"));
    assert!(message.contains("FAIL #2: Element not found {[data-testid=\"toast\"]}"));
    let kinds: Vec<_> = failure.errors().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![DiagnosticKind::ConditionNotMet, DiagnosticKind::ElementNotFound]
    );
}

#[test]
fn listeners_see_every_wait() {
    let registry = Arc::new(ListenerRegistry::new());
    let collector = ErrorsCollector::register(&registry);
    registry.add(TracingListener::LISTENER_NAME, Arc::new(TracingListener));
    let poller = Poller::new()
        .with_clock(Arc::new(FakeClock::new()))
        .with_listeners(Arc::clone(&registry));
    let locator = FnLocator::new(Selector::css(".item"), divs(2));
    let spec = WaitSpec::new(200, 100).unwrap();

    poller.poll_until(&locator, &Condition::size(2), &spec).unwrap();
    poller.poll_until(&locator, &Condition::size(5), &spec).unwrap_err();
    poller.poll_while(&locator, &Condition::size(2), &spec).unwrap_err();

    let recorded = collector.errors();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[0].kind, DiagnosticKind::ListSizeMismatch);
    assert_eq!(recorded[1].kind, DiagnosticKind::ConditionMet);
    assert!(recorded[1]
        .to_string()
        .starts_with("Collection should not have size = 2 {.item}"));
}
