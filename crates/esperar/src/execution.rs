//! Per-test execution scope.
//!
//! A [`TestExecution`] bundles everything one test needs: its label, the
//! configuration, the listener registry, the poller and, in SOFT mode, the
//! [`ErrorsCollector`]. Nothing is global; two tests running on two threads
//! each own their own scope.

use std::sync::Arc;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::collector::{validate_assertion_mode, ErrorsCollector, TestFailure};
use crate::condition::Condition;
use crate::config::{AssertionMode, EsperarConfig};
use crate::element::Subject;
use crate::error::DiagnosticError;
use crate::event::ListenerRegistry;
use crate::locator::Locator;
use crate::poller::Poller;
use crate::result::{EsperarError, EsperarResult};
use crate::wait::WaitSpec;

/// One test's assertion scope
#[derive(Debug)]
pub struct TestExecution {
    label: String,
    config: EsperarConfig,
    registry: Arc<ListenerRegistry>,
    poller: Poller,
    collector: Option<Arc<ErrorsCollector>>,
}

impl TestExecution {
    /// Start a test with an existing registry
    ///
    /// In SOFT mode the [`ErrorsCollector`] registered under
    /// [`ErrorsCollector::LISTENER_NAME`] is attached and drained at
    /// [`TestExecution::finish`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid, or is SOFT and
    /// `registry` has no collector under that name
    pub fn start(
        label: impl Into<String>,
        config: EsperarConfig,
        registry: Arc<ListenerRegistry>,
    ) -> EsperarResult<Self> {
        config.validate()?;
        validate_assertion_mode(&config, &registry)?;
        let collector = match config.assertion_mode {
            AssertionMode::Strict => None,
            AssertionMode::Soft => Some(
                registry
                    .get(ErrorsCollector::LISTENER_NAME)
                    .and_then(|listener| listener.as_errors_collector())
                    .ok_or_else(|| EsperarError::Configuration {
                        message: format!(
                            "the \"{}\" listener is not an ErrorsCollector; \
                             register one with ErrorsCollector::register",
                            ErrorsCollector::LISTENER_NAME
                        ),
                    })?,
            ),
        };
        let label = label.into();
        info!(test = %label, mode = %config.assertion_mode, "test started");
        Ok(Self {
            label,
            config,
            poller: Poller::new().with_listeners(Arc::clone(&registry)),
            registry,
            collector,
        })
    }

    /// Start a SOFT-mode test with a fresh registry and collector
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid
    pub fn soft(label: impl Into<String>, config: EsperarConfig) -> EsperarResult<Self> {
        let registry = Arc::new(ListenerRegistry::new());
        ErrorsCollector::register(&registry);
        Self::start(
            label,
            config.with_assertion_mode(AssertionMode::Soft),
            registry,
        )
    }

    /// Use `clock` for every wait in this test
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.poller = self.poller.with_clock(clock);
        self
    }

    /// Test label
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &EsperarConfig {
        &self.config
    }

    /// Listener registry shared by this test's waits
    #[must_use]
    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    /// The collector drained at [`TestExecution::finish`] (SOFT mode only)
    #[must_use]
    pub fn collector(&self) -> Option<&Arc<ErrorsCollector>> {
        self.collector.as_ref()
    }

    /// Assert `condition` with the configured timeout and interval
    ///
    /// Returns `Ok(Some(subject))` on success and `Ok(None)` when a failure
    /// was recorded in SOFT mode.
    ///
    /// # Errors
    ///
    /// Returns the [`DiagnosticError`] in STRICT mode
    pub fn should<L>(
        &self,
        locator: &L,
        condition: &Condition,
    ) -> Result<Option<Subject>, DiagnosticError>
    where
        L: Locator + ?Sized,
    {
        self.should_with(locator, condition, &self.default_spec())
    }

    /// Assert `condition` with an explicit wait spec
    ///
    /// # Errors
    ///
    /// Returns the [`DiagnosticError`] in STRICT mode
    pub fn should_with<L>(
        &self,
        locator: &L,
        condition: &Condition,
        spec: &WaitSpec,
    ) -> Result<Option<Subject>, DiagnosticError>
    where
        L: Locator + ?Sized,
    {
        self.settle(self.poller.poll_until(locator, condition, spec))
    }

    /// Assert that `condition` stops holding
    ///
    /// # Errors
    ///
    /// Returns the [`DiagnosticError`] in STRICT mode
    pub fn should_not<L>(
        &self,
        locator: &L,
        condition: &Condition,
    ) -> Result<Option<Subject>, DiagnosticError>
    where
        L: Locator + ?Sized,
    {
        self.should_not_with(locator, condition, &self.default_spec())
    }

    /// Assert that `condition` stops holding, with an explicit wait spec
    ///
    /// # Errors
    ///
    /// Returns the [`DiagnosticError`] in STRICT mode
    pub fn should_not_with<L>(
        &self,
        locator: &L,
        condition: &Condition,
        spec: &WaitSpec,
    ) -> Result<Option<Subject>, DiagnosticError>
    where
        L: Locator + ?Sized,
    {
        self.settle(self.poller.poll_while(locator, condition, spec))
    }

    /// End the test, reporting anything recorded in SOFT mode
    ///
    /// # Errors
    ///
    /// Returns the collected failures as a [`TestFailure`]
    pub fn finish(self) -> Result<(), TestFailure> {
        let result = match &self.collector {
            Some(collector) => collector.fail_if_errors(&self.label),
            None => Ok(()),
        };
        info!(test = %self.label, passed = result.is_ok(), "test finished");
        result
    }

    fn default_spec(&self) -> WaitSpec {
        // validate() already rejected a zero interval
        WaitSpec::new(self.config.timeout_ms, self.config.poll_interval_ms).unwrap_or_default()
    }

    fn settle(
        &self,
        result: Result<Subject, DiagnosticError>,
    ) -> Result<Option<Subject>, DiagnosticError> {
        match result {
            Ok(subject) => Ok(Some(subject)),
            Err(error) if self.config.assertion_mode == AssertionMode::Soft => {
                // The collector saw this failure through after_event.
                debug!(test = %self.label, locator = %error.locator, "recorded soft failure");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}
