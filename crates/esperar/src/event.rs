//! Wait events and listeners.
//!
//! Every wait emits `before_event` when it starts and `after_event` when it
//! ends. Listeners live in an explicit [`ListenerRegistry`], keyed by name and
//! invoked synchronously in registration order.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::collector::ErrorsCollector;
use crate::error::DiagnosticError;
use crate::result::EsperarResult;

/// Environment variable holding the log filter for [`init_tracing`]
pub const LOG_ENV: &str = "ESPERAR_LOG";

/// Status of a wait event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Wait started, not finished
    InProgress,
    /// Condition satisfied
    Pass,
    /// Wait failed
    Fail,
}

impl EventStatus {
    /// Upper-case status label
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

/// One wait, as seen by listeners
#[derive(Debug, Clone)]
pub struct LogEvent {
    /// Unique event ID, shared by the before/after pair
    pub id: Uuid,
    /// Locator description
    pub subject: String,
    /// Condition name
    pub condition: String,
    /// Current status
    pub status: EventStatus,
    /// Time spent so far
    pub elapsed: Duration,
    /// Failure, for `Fail` events
    pub error: Option<DiagnosticError>,
}

impl LogEvent {
    /// Start a new in-progress event
    #[must_use]
    pub fn start(subject: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject: subject.into(),
            condition: condition.into(),
            status: EventStatus::InProgress,
            elapsed: Duration::ZERO,
            error: None,
        }
    }

    /// Mark the event passed
    #[must_use]
    pub fn pass(mut self, elapsed: Duration) -> Self {
        self.status = EventStatus::Pass;
        self.elapsed = elapsed;
        self
    }

    /// Mark the event failed with `error`
    #[must_use]
    pub fn fail(mut self, error: DiagnosticError) -> Self {
        self.status = EventStatus::Fail;
        self.elapsed = error.elapsed;
        self.error = Some(error);
        self
    }

    /// JSON view of the event (the error is rendered as its message)
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "subject": self.subject,
            "condition": self.condition,
            "status": self.status,
            "elapsed_ms": self.elapsed.as_millis() as u64,
            "error": self.error.as_ref().map(ToString::to_string),
        })
    }

    /// Pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json_string(&self) -> EsperarResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_json())?)
    }
}

/// Observer of wait events
pub trait LogEventListener: Send + Sync {
    /// Called when a wait starts
    fn before_event(&self, event: &LogEvent);

    /// Called when a wait ends
    fn after_event(&self, event: &LogEvent);

    /// This listener as an [`ErrorsCollector`], if it is one
    fn as_errors_collector(self: Arc<Self>) -> Option<Arc<ErrorsCollector>> {
        None
    }
}

/// Named listeners, invoked in registration order
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<(String, Arc<dyn LogEventListener>)>>,
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl ListenerRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` under `name`, replacing any listener with that name
    /// in place
    pub fn add(&self, name: impl Into<String>, listener: Arc<dyn LogEventListener>) {
        let name = name.into();
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = listeners.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = listener;
        } else {
            listeners.push((name, listener));
        }
    }

    /// Remove the listener registered under `name`
    pub fn remove(&self, name: &str) -> Option<Arc<dyn LogEventListener>> {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let index = listeners.iter().position(|(n, _)| n == name)?;
        Some(listeners.remove(index).1)
    }

    /// The listener registered under `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn LogEventListener>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, l)| Arc::clone(l))
    }

    /// Whether a listener is registered under `name`
    #[must_use]
    pub fn has_listener(&self, name: &str) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|(n, _)| n == name)
    }

    /// Registered names in order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    fn snapshot(&self) -> Vec<Arc<dyn LogEventListener>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect()
    }

    /// Dispatch `before_event` to every listener
    pub fn before_event(&self, event: &LogEvent) {
        for listener in self.snapshot() {
            listener.before_event(event);
        }
    }

    /// Dispatch `after_event` to every listener
    pub fn after_event(&self, event: &LogEvent) {
        for listener in self.snapshot() {
            listener.after_event(event);
        }
    }
}

/// Listener that reports waits through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl TracingListener {
    /// Name this listener is usually registered under
    pub const LISTENER_NAME: &'static str = "tracing";
}

impl LogEventListener for TracingListener {
    fn before_event(&self, event: &LogEvent) {
        debug!(id = %event.id, subject = %event.subject, condition = %event.condition, "wait started");
    }

    fn after_event(&self, event: &LogEvent) {
        let elapsed_ms = event.elapsed.as_millis() as u64;
        match (&event.status, &event.error) {
            (EventStatus::Fail, Some(error)) => warn!(
                id = %event.id,
                subject = %event.subject,
                condition = %event.condition,
                elapsed_ms,
                "wait failed: {error}"
            ),
            _ => info!(
                id = %event.id,
                subject = %event.subject,
                condition = %event.condition,
                status = event.status.as_str(),
                elapsed_ms,
                "wait finished"
            ),
        }
    }
}

/// Install a `tracing` subscriber filtered by `ESPERAR_LOG`, then `RUST_LOG`,
/// then `info`
///
/// Returns `false` if a global subscriber was already set.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
