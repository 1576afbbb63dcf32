//! Result and error types for Esperar.
//!
//! Wait failures are [`crate::DiagnosticError`]s and soft-assertion failures are
//! [`crate::TestFailure`]s; this module covers everything around them
//! (configuration and loading).

use thiserror::Error;

/// Result type for Esperar operations
pub type EsperarResult<T> = Result<T, EsperarError>;

/// Errors that can occur in Esperar outside of a wait
#[derive(Debug, Error)]
pub enum EsperarError {
    /// Invalid or inconsistent configuration; raised eagerly
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// A configuration value could not be parsed
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue {
        /// Setting name
        key: String,
        /// Raw value
        value: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
