//! Soft assertions.
//!
//! An [`ErrorsCollector`] is a [`LogEventListener`] that records the error of
//! every failed wait. At the end of a test, [`ErrorsCollector::fail_if_errors`]
//! drains what was recorded and turns it into one [`TestFailure`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use esperar::{AssertionMode, ErrorsCollector, EsperarConfig, ListenerRegistry};
//!
//! let registry = ListenerRegistry::new();
//! let config = EsperarConfig::default().with_assertion_mode(AssertionMode::Soft);
//! assert!(esperar::validate_assertion_mode(&config, &registry).is_err());
//!
//! let collector = ErrorsCollector::register(&registry);
//! assert!(esperar::validate_assertion_mode(&config, &registry).is_ok());
//! assert!(collector.fail_if_errors("login").is_ok());
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::debug;

use crate::config::{AssertionMode, EsperarConfig};
use crate::error::DiagnosticError;
use crate::event::{EventStatus, ListenerRegistry, LogEvent, LogEventListener};
use crate::result::{EsperarError, EsperarResult};

// =============================================================================
// ERRORS
// =============================================================================

/// Several failures recorded during one test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftAssertionError {
    /// Test label
    pub test_name: String,
    /// Failures, in recording order
    pub errors: Vec<DiagnosticError>,
}

impl fmt::Display for SoftAssertionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test {} failed.", self.test_name)?;
        write!(f, "{} checks failed", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "\n\nFAIL #{}: {error}", i + 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for SoftAssertionError {}

/// Failure reported at the end of a test
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TestFailure {
    /// Exactly one assertion failed; it is reported unchanged
    #[error(transparent)]
    Assertion(DiagnosticError),
    /// Several failures, or a single non-assertion one
    #[error(transparent)]
    Soft(SoftAssertionError),
}

impl TestFailure {
    /// Every underlying failure, in recording order
    #[must_use]
    pub fn errors(&self) -> Vec<&DiagnosticError> {
        match self {
            Self::Assertion(error) => vec![error],
            Self::Soft(soft) => soft.errors.iter().collect(),
        }
    }
}

// =============================================================================
// COLLECTOR
// =============================================================================

/// Listener recording the errors of failed waits
#[derive(Debug, Default)]
pub struct ErrorsCollector {
    errors: Mutex<Vec<DiagnosticError>>,
}

impl ErrorsCollector {
    /// Registry name; SOFT mode requires a listener under this name
    pub const LISTENER_NAME: &'static str = "softAssert";

    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collector and register it in `registry`
    pub fn register(registry: &ListenerRegistry) -> Arc<Self> {
        let collector = Arc::new(Self::new());
        registry.add(Self::LISTENER_NAME, collector.clone());
        collector
    }

    /// Record one failure
    pub fn record(&self, error: DiagnosticError) {
        debug!(locator = %error.locator, "soft assertion failed");
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }

    /// Snapshot of the recorded failures
    #[must_use]
    pub fn errors(&self) -> Vec<DiagnosticError> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded failures
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything recorded
    pub fn clear(&self) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Drain the recorded failures and report them
    ///
    /// The collector is empty afterwards, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`TestFailure::Assertion`] for a single assertion failure and
    /// [`TestFailure::Soft`] otherwise
    pub fn fail_if_errors(&self, test_name: &str) -> Result<(), TestFailure> {
        let mut errors =
            std::mem::take(&mut *self.errors.lock().unwrap_or_else(PoisonError::into_inner));

        match errors.len() {
            0 => Ok(()),
            1 if errors[0].is_assertion() => Err(TestFailure::Assertion(errors.remove(0))),
            _ => Err(TestFailure::Soft(SoftAssertionError {
                test_name: test_name.to_string(),
                errors,
            })),
        }
    }
}

impl LogEventListener for ErrorsCollector {
    fn before_event(&self, _event: &LogEvent) {}

    fn after_event(&self, event: &LogEvent) {
        if event.status == EventStatus::Fail {
            if let Some(error) = &event.error {
                self.record(error.clone());
            }
        }
    }

    fn as_errors_collector(self: Arc<Self>) -> Option<Arc<Self>> {
        Some(self)
    }
}

/// Check that the configured mode can be honoured by `registry`
///
/// # Errors
///
/// Returns [`EsperarError::Configuration`] when the mode is SOFT and no
/// collector is registered
pub fn validate_assertion_mode(
    config: &EsperarConfig,
    registry: &ListenerRegistry,
) -> EsperarResult<()> {
    if config.assertion_mode == AssertionMode::Soft
        && !registry.has_listener(ErrorsCollector::LISTENER_NAME)
    {
        return Err(EsperarError::Configuration {
            message: format!(
                "assertion mode is SOFT but no \"{}\" listener is registered; \
                 register one with ErrorsCollector::register or start the test with TestExecution::soft",
                ErrorsCollector::LISTENER_NAME
            ),
        });
    }
    Ok(())
}
