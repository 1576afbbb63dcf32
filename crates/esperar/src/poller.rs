//! The retry engine.
//!
//! [`Poller::poll_until`] resolves the locator and evaluates the condition
//! repeatedly until the condition holds, the deadline passes, or a fatal
//! error aborts the wait. Attempts are strictly sequential on the calling
//! thread; the only suspension point is the fixed-interval sleep between
//! attempts, clamped so that the last attempt happens at the deadline.
//!
//! ```text
//! start ──► resolve ──► apply ──► Success ──────────────► Ok(subject)
//!              │          │
//!              │          └─► Mismatch / Transient ──┬─► now < deadline: sleep, retry
//!              │                                     └─► now ≥ deadline: DiagnosticError
//!              └─► Fatal ──────────────────────────────► DiagnosticError
//! ```

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::condition::Condition;
use crate::element::Subject;
use crate::error::{
    DiagnosticError, ErrorFactory, FailureClass, FailureContext, PollFailure, ELEMENT_NOT_FOUND,
};
use crate::event::{ListenerRegistry, LogEvent};
use crate::locator::Locator;
use crate::wait::WaitSpec;

/// Result of a single poll attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The wait is satisfied
    Success(Subject),
    /// The condition was evaluated and did not give the wanted answer
    Mismatch {
        /// Subject snapshot; `None` when nothing was found
        subject: Option<Subject>,
        /// Actual value
        actual: String,
    },
    /// Possibly recoverable failure
    TransientError(PollFailure),
    /// Non-recoverable failure
    FatalError(PollFailure),
}

impl PollOutcome {
    /// Check if the outcome ends the wait successfully
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    fn from_failure(failure: PollFailure) -> Self {
        match failure.class() {
            FailureClass::Fatal => Self::FatalError(failure),
            FailureClass::Transient | FailureClass::NotFound => Self::TransientError(failure),
        }
    }
}

/// Which answer a wait is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Polarity {
    /// Wait until the condition holds
    Until,
    /// Wait until the condition stops holding
    While,
}

/// Retry engine with an injectable clock and optional listeners
#[derive(Debug, Clone)]
pub struct Poller {
    clock: Arc<dyn Clock>,
    listeners: Option<Arc<ListenerRegistry>>,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new()
    }
}

impl Poller {
    /// Create a poller on the system clock with no listeners
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock::new()),
            listeners: None,
        }
    }

    /// Use `clock` for time and sleeps
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Emit one event per wait to `listeners`
    #[must_use]
    pub fn with_listeners(mut self, listeners: Arc<ListenerRegistry>) -> Self {
        self.listeners = Some(listeners);
        self
    }

    /// Wait until `condition` holds for the subject `locator` resolves to
    ///
    /// Returns the subject from the successful attempt; if the condition
    /// holds for a missing element (e.g. `hidden`), an empty collection.
    ///
    /// # Errors
    ///
    /// Returns a [`DiagnosticError`] when the deadline passes or a fatal
    /// error occurs
    pub fn poll_until<L>(
        &self,
        locator: &L,
        condition: &Condition,
        spec: &WaitSpec,
    ) -> Result<Subject, DiagnosticError>
    where
        L: Locator + ?Sized,
    {
        self.observed(locator, condition, spec, Polarity::Until)
    }

    /// Wait until `condition` stops holding
    ///
    /// # Errors
    ///
    /// Returns a [`DiagnosticError`] of kind `ConditionMet` when the
    /// condition still holds at the deadline, or a fatal error
    pub fn poll_while<L>(
        &self,
        locator: &L,
        condition: &Condition,
        spec: &WaitSpec,
    ) -> Result<Subject, DiagnosticError>
    where
        L: Locator + ?Sized,
    {
        self.observed(locator, condition, spec, Polarity::While)
    }

    fn observed<L>(
        &self,
        locator: &L,
        condition: &Condition,
        spec: &WaitSpec,
        polarity: Polarity,
    ) -> Result<Subject, DiagnosticError>
    where
        L: Locator + ?Sized,
    {
        let name = match polarity {
            Polarity::Until => condition.name(),
            Polarity::While => format!("not {}", condition.name()),
        };
        let event = LogEvent::start(locator.description(), name);
        if let Some(listeners) = &self.listeners {
            listeners.before_event(&event);
        }

        let start = self.clock.now();
        let result = self.run(locator, condition, spec, polarity);

        if let Some(listeners) = &self.listeners {
            let finished = match &result {
                Ok(_) => event.pass(self.clock.now().saturating_sub(start)),
                Err(error) => event.fail(error.clone()),
            };
            listeners.after_event(&finished);
        }
        result
    }

    fn run<L>(
        &self,
        locator: &L,
        condition: &Condition,
        spec: &WaitSpec,
        polarity: Polarity,
    ) -> Result<Subject, DiagnosticError>
    where
        L: Locator + ?Sized,
    {
        let start = self.clock.now();
        let timeout = spec.timeout();
        let description = locator.description();
        let mut last_cause: Option<PollFailure> = None;
        let mut attempts: u64 = 0;

        loop {
            attempts += 1;
            let outcome = Self::attempt(locator, condition, polarity, &mut last_cause);
            let elapsed = self.clock.now().saturating_sub(start);
            let ctx = FailureContext {
                locator: &description,
                condition,
                explanation: spec.explanation(),
                elapsed,
                negated: polarity == Polarity::While,
            };

            match outcome {
                PollOutcome::Success(subject) => {
                    debug!(
                        locator = %description,
                        condition = %condition,
                        attempts,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "condition satisfied"
                    );
                    return Ok(subject);
                }
                PollOutcome::FatalError(failure) => {
                    warn!(locator = %description, attempts, "wait aborted: {failure}");
                    return Err(ErrorFactory::fatal(&ctx, failure));
                }
                PollOutcome::TransientError(_) | PollOutcome::Mismatch { .. } => {
                    if elapsed >= timeout {
                        let error = ErrorFactory::from_outcome(&ctx, &outcome, last_cause.as_ref());
                        warn!(
                            locator = %description,
                            condition = %condition,
                            attempts,
                            elapsed_ms = elapsed.as_millis() as u64,
                            "wait timed out"
                        );
                        return Err(error);
                    }
                    trace!(locator = %description, attempts, "condition not met yet: {outcome:?}");
                }
            }

            let remaining = timeout.saturating_sub(elapsed);
            self.clock.sleep(spec.poll_interval().min(remaining));
        }
    }

    fn attempt<L>(
        locator: &L,
        condition: &Condition,
        polarity: Polarity,
        last_cause: &mut Option<PollFailure>,
    ) -> PollOutcome
    where
        L: Locator + ?Sized,
    {
        let wanted = polarity == Polarity::Until;

        let subject = match locator.resolve() {
            Ok(subject) => subject,
            Err(err) => {
                let failure = PollFailure::from(err);
                if failure.class() != FailureClass::NotFound {
                    *last_cause = Some(failure.clone());
                    return PollOutcome::from_failure(failure);
                }
                // Not found is a mismatch, never a cause.
                if condition.holds_when_missing() == wanted {
                    return PollOutcome::Success(Subject::Collection(Vec::new()));
                }
                let actual = if condition.is_size() {
                    "0".to_string()
                } else {
                    ELEMENT_NOT_FOUND.to_string()
                };
                return PollOutcome::Mismatch {
                    subject: None,
                    actual,
                };
            }
        };

        match condition.apply(&subject) {
            Ok(holds) if holds == wanted => PollOutcome::Success(subject),
            Ok(_) => PollOutcome::Mismatch {
                actual: ErrorFactory::actual_or_placeholder(condition, &subject),
                subject: Some(subject),
            },
            Err(err) => {
                let failure = PollFailure::from(err);
                *last_cause = Some(failure.clone());
                PollOutcome::from_failure(failure)
            }
        }
    }
}
