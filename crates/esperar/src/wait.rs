//! Wait specifications.
//!
//! A [`WaitSpec`] governs exactly one poller invocation: how long to keep
//! trying, how long to sleep between attempts, and an optional reason that is
//! echoed in the failure message.

use std::time::Duration;

use crate::result::{EsperarError, EsperarResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (4 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 4_000;

/// Default polling interval (200ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;

// =============================================================================
// WAIT SPEC
// =============================================================================

/// Timeout, poll interval and explanation for one wait
///
/// The poll interval is always positive; constructors reject zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSpec {
    timeout_ms: u64,
    poll_interval_ms: u64,
    explanation: Option<String>,
}

impl Default for WaitSpec {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            explanation: None,
        }
    }
}

impl WaitSpec {
    /// Create a wait spec
    ///
    /// # Errors
    ///
    /// Returns [`EsperarError::Configuration`] if `poll_interval_ms` is zero
    pub fn new(timeout_ms: u64, poll_interval_ms: u64) -> EsperarResult<Self> {
        Self::default()
            .with_timeout(timeout_ms)
            .with_poll_interval(poll_interval_ms)
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    ///
    /// # Errors
    ///
    /// Returns [`EsperarError::Configuration`] if `poll_interval_ms` is zero
    pub fn with_poll_interval(mut self, poll_interval_ms: u64) -> EsperarResult<Self> {
        if poll_interval_ms == 0 {
            return Err(EsperarError::Configuration {
                message: "poll interval must be greater than 0 ms".to_string(),
            });
        }
        self.poll_interval_ms = poll_interval_ms;
        Ok(self)
    }

    /// Attach a reason, rendered as `(because ...)` in failures
    #[must_use]
    pub fn because(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Timeout in milliseconds
    #[must_use]
    pub const fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Poll interval in milliseconds
    #[must_use]
    pub const fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The explanation, if any
    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Lower bound on attempts a never-satisfied wait makes: `ceil(timeout / interval)`
    #[must_use]
    pub const fn min_attempts(&self) -> u64 {
        self.timeout_ms.div_ceil(self.poll_interval_ms)
    }
}
