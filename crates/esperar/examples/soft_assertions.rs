//! Example: Soft Assertions
//!
//! Demonstrates: polling a simulated page, STRICT failures, and collecting
//! several failures in SOFT mode before reporting them together
//!
//! Run with: `cargo run --example soft_assertions`
//! Set `ESPERAR_LOG=debug` to see every wait.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use esperar::prelude::*;

fn main() -> EsperarResult<()> {
    init_tracing();
    println!("=== Soft Assertions Example ===\n");

    let config = EsperarConfig::default()
        .with_timeout_ms(600)
        .with_poll_interval_ms(100)
        .with_env_overrides()?;

    // 1. A spinner that disappears after a few polls
    println!("1. Waiting for a spinner to go away...");
    let polls = Arc::new(AtomicUsize::new(0));
    let spinner = {
        let polls = Arc::clone(&polls);
        FnLocator::new(Selector::css("#spinner"), move || {
            if polls.fetch_add(1, Ordering::SeqCst) < 3 {
                Ok(Subject::Single(Element::new("div", "Loading...")))
            } else {
                Err(LocateError::not_found("#spinner"))
            }
        })
    };
    let strict = TestExecution::start(
        "spinner",
        config.clone(),
        Arc::new(ListenerRegistry::new()),
    )?;
    match strict.should(&spinner, &Condition::hidden()) {
        Ok(_) => println!("   spinner gone after {} polls", polls.load(Ordering::SeqCst)),
        Err(error) => println!("   unexpected failure:\n{error}"),
    }

    // 2. A STRICT failure with full diagnostics
    println!("\n2. STRICT failure...");
    let rows = FnLocator::new(Selector::css("#results .row"), || {
        Ok(Subject::Collection(vec![
            Element::new("tr", "Alpha"),
            Element::new("tr", "Beta").displayed(false),
            Element::new("tr", "Gamma"),
        ]))
    });
    let spec = config.wait_spec()?.because("search returns at most two hits");
    if let Err(error) = strict.should_with(&rows, &Condition::size_less_than_or_equal(2), &spec) {
        println!("{error}");
    }
    if strict.finish().is_ok() {
        println!("   STRICT test leaves nothing to report at finish");
    }

    // 3. SOFT mode collects every failure and reports once
    println!("\n3. SOFT mode...");
    let soft = TestExecution::soft("search results", config)?;
    let _ = soft.should(&rows, &Condition::visible());
    let _ = soft.should(&rows, &Condition::exact_text("Alpha"));
    let _ = soft.should(&rows, &Condition::size(3));
    println!(
        "   {} failures collected (not stopped)",
        soft.collector().map_or(0, |c| c.len())
    );

    match soft.finish() {
        Ok(()) => println!("   all checks passed"),
        Err(failure) => println!("{failure}"),
    }

    println!("\n=== Soft Assertions Example Complete ===");
    Ok(())
}
