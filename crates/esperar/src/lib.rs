//! Esperar: polling assertions for browser UI tests
//!
//! Esperar (Spanish: "to wait") re-resolves a page element on every attempt
//! and checks a [`Condition`] against it until the condition holds or a
//! timeout passes. Failures come back as [`DiagnosticError`]s that say what
//! was expected, what was seen, which elements were involved and what went
//! wrong underneath. In SOFT mode failures are collected and reported once
//! at the end of the test.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌──────────────┐   ┌─────────────────┐
//! │ Locator    │──►│ Poller     │──►│ ErrorFactory │──►│ DiagnosticError │
//! │ Condition  │   │ (Clock)    │   └──────────────┘   └────────┬────────┘
//! │ WaitSpec   │   └─────┬──────┘                               │
//! └────────────┘         │ LogEvent                             ▼
//!                        ▼                               STRICT: Err(..)
//!                  ListenerRegistry ──► ErrorsCollector  SOFT: recorded,
//!                                                        TestFailure at finish
//! ```
//!
//! # Example
//!
//! ```
//! use esperar::prelude::*;
//!
//! let save = FnLocator::new(Selector::css("#save"), || {
//!     Ok(Subject::Single(Element::new("button", "Save")))
//! });
//! let spec = WaitSpec::new(500, 50).unwrap();
//!
//! let subject = Poller::new()
//!     .poll_until(&save, &Condition::visible(), &spec)
//!     .unwrap();
//! assert_eq!(subject.size(), 1);
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod clock;
mod collector;
mod condition;
mod config;
mod element;
mod error;
mod event;
mod execution;
mod locator;
mod poller;
mod result;
mod wait;

pub use clock::{Clock, FakeClock, SystemClock};
pub use collector::{validate_assertion_mode, ErrorsCollector, SoftAssertionError, TestFailure};
pub use condition::{
    Aggregation, ComparisonOp, Condition, CustomActual, CustomPredicate, ElementPredicate,
    EvalError,
};
pub use config::{
    AssertionMode, EsperarConfig, ASSERTION_MODE_ENV, POLL_INTERVAL_ENV, TIMEOUT_ENV,
};
pub use element::{render_element_list, Element, Subject};
pub use error::{
    format_timeout, DiagnosticError, DiagnosticKind, ErrorFactory, FailureClass, FailureContext,
    PollFailure, ELEMENT_NOT_FOUND,
};
pub use event::{
    init_tracing, EventStatus, ListenerRegistry, LogEvent, LogEventListener, TracingListener,
    LOG_ENV,
};
pub use execution::TestExecution;
pub use locator::{FnLocator, LocateError, Locator, Selector};
pub use poller::{PollOutcome, Poller};
pub use result::{EsperarError, EsperarResult};
pub use wait::{WaitSpec, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::clock::*;
    pub use super::collector::*;
    pub use super::condition::*;
    pub use super::config::*;
    pub use super::element::*;
    pub use super::error::*;
    pub use super::event::*;
    pub use super::execution::*;
    pub use super::locator::*;
    pub use super::poller::*;
    pub use super::result::*;
    pub use super::wait::*;
}
