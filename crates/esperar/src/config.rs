//! Engine configuration.
//!
//! Settings come from defaults, optionally a YAML file, and finally
//! `ESPERAR_*` environment variables:
//!
//! ```yaml
//! assertion_mode: soft
//! timeout_ms: 6000
//! poll_interval_ms: 100
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::result::{EsperarError, EsperarResult};
use crate::wait::{WaitSpec, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};

/// Environment variable overriding [`EsperarConfig::assertion_mode`]
pub const ASSERTION_MODE_ENV: &str = "ESPERAR_ASSERTION_MODE";
/// Environment variable overriding [`EsperarConfig::timeout_ms`]
pub const TIMEOUT_ENV: &str = "ESPERAR_TIMEOUT_MS";
/// Environment variable overriding [`EsperarConfig::poll_interval_ms`]
pub const POLL_INTERVAL_ENV: &str = "ESPERAR_POLL_INTERVAL_MS";

/// How failed `should` checks are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionMode {
    /// Fail immediately
    #[default]
    Strict,
    /// Record the failure and continue; report at the end of the test
    Soft,
}

impl fmt::Display for AssertionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "STRICT"),
            Self::Soft => write!(f, "SOFT"),
        }
    }
}

impl FromStr for AssertionMode {
    type Err = EsperarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "soft" => Ok(Self::Soft),
            _ => Err(EsperarError::InvalidValue {
                key: ASSERTION_MODE_ENV.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EsperarConfig {
    /// STRICT or SOFT
    pub assertion_mode: AssertionMode,
    /// Default wait timeout in milliseconds
    pub timeout_ms: u64,
    /// Default poll interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for EsperarConfig {
    fn default() -> Self {
        Self {
            assertion_mode: AssertionMode::Strict,
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl EsperarConfig {
    /// Set the assertion mode
    #[must_use]
    pub const fn with_assertion_mode(mut self, mode: AssertionMode) -> Self {
        self.assertion_mode = mode;
        self
    }

    /// Set the default timeout
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the default poll interval
    #[must_use]
    pub const fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Parse a YAML document; missing keys keep their defaults
    ///
    /// # Errors
    ///
    /// Returns error if the YAML is malformed or the result is invalid
    pub fn from_yaml_str(yaml: &str) -> EsperarResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_yaml_file(path: impl AsRef<Path>) -> EsperarResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> EsperarResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply `ESPERAR_*` environment overrides
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an unparseable value
    pub fn with_env_overrides(self) -> EsperarResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup keyed by variable name
    ///
    /// # Errors
    ///
    /// Returns error if a value cannot be parsed or the result is invalid
    pub fn with_overrides_from<F>(mut self, lookup: F) -> EsperarResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ASSERTION_MODE_ENV) {
            self.assertion_mode = mode.parse()?;
        }
        if let Some(timeout) = lookup(TIMEOUT_ENV) {
            self.timeout_ms = parse_millis(TIMEOUT_ENV, &timeout)?;
        }
        if let Some(interval) = lookup(POLL_INTERVAL_ENV) {
            self.poll_interval_ms = parse_millis(POLL_INTERVAL_ENV, &interval)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns [`EsperarError::Configuration`] for a zero poll interval
    pub fn validate(&self) -> EsperarResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(EsperarError::Configuration {
                message: "poll_interval_ms must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Wait spec built from the configured defaults
    ///
    /// # Errors
    ///
    /// Returns error if the poll interval is zero
    pub fn wait_spec(&self) -> EsperarResult<WaitSpec> {
        WaitSpec::new(self.timeout_ms, self.poll_interval_ms)
    }
}

fn parse_millis(key: &str, raw: &str) -> EsperarResult<u64> {
    raw.trim().parse().map_err(|_| EsperarError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    mod mode_tests {
        use super::*;

        #[test]
        fn test_default_is_strict() {
            assert_eq!(AssertionMode::default(), AssertionMode::Strict);
            assert_eq!(EsperarConfig::default().assertion_mode, AssertionMode::Strict);
        }

        #[test]
        fn test_parse_is_case_insensitive() {
            assert_eq!("SOFT".parse::<AssertionMode>().unwrap(), AssertionMode::Soft);
            assert_eq!(" strict ".parse::<AssertionMode>().unwrap(), AssertionMode::Strict);
        }

        #[test]
        fn test_parse_rejects_unknown() {
            let err = "lenient".parse::<AssertionMode>().unwrap_err();
            assert!(err.to_string().contains("lenient"));
        }

        #[test]
        fn test_display() {
            assert_eq!(AssertionMode::Soft.to_string(), "SOFT");
        }
    }

    mod yaml_tests {
        use super::*;

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let config = EsperarConfig::from_yaml_str("assertion_mode: soft\n").unwrap();
            assert_eq!(config.assertion_mode, AssertionMode::Soft);
            assert_eq!(config.timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
            assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_zero_interval_rejected() {
            let err = EsperarConfig::from_yaml_str("poll_interval_ms: 0\n").unwrap_err();
            assert!(matches!(err, EsperarError::Configuration { .. }));
        }

        #[test]
        fn test_malformed_yaml() {
            let err = EsperarConfig::from_yaml_str("timeout_ms: [1, 2").unwrap_err();
            assert!(matches!(err, EsperarError::Yaml(_)));
        }

        #[test]
        fn test_from_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "timeout_ms: 1500\npoll_interval_ms: 50").unwrap();

            let config = EsperarConfig::from_yaml_file(file.path()).unwrap();

            assert_eq!(config.timeout_ms, 1500);
            assert_eq!(config.poll_interval_ms, 50);
        }

        #[test]
        fn test_missing_file_is_io_error() {
            let dir = tempfile::tempdir().unwrap();
            let err = EsperarConfig::from_yaml_file(dir.path().join("nope.yaml")).unwrap_err();
            assert!(matches!(err, EsperarError::Io(_)));
        }

        #[test]
        fn test_yaml_output_parses_back() {
            let config = EsperarConfig::default().with_assertion_mode(AssertionMode::Soft);
            let yaml = config.to_yaml().unwrap();
            assert!(yaml.contains("assertion_mode: soft"));
            assert_eq!(EsperarConfig::from_yaml_str(&yaml).unwrap(), config);
        }
    }

    mod override_tests {
        use super::*;

        #[test]
        fn test_overrides_apply() {
            let config = EsperarConfig::default()
                .with_overrides_from(lookup(&[
                    (ASSERTION_MODE_ENV, "soft"),
                    (TIMEOUT_ENV, "250"),
                    (POLL_INTERVAL_ENV, "25"),
                ]))
                .unwrap();
            assert_eq!(config.assertion_mode, AssertionMode::Soft);
            assert_eq!(config.timeout_ms, 250);
            assert_eq!(config.poll_interval_ms, 25);
        }

        #[test]
        fn test_no_overrides_is_identity() {
            let config = EsperarConfig::default().with_overrides_from(lookup(&[])).unwrap();
            assert_eq!(config, EsperarConfig::default());
        }

        #[test]
        fn test_bad_number() {
            let err = EsperarConfig::default()
                .with_overrides_from(lookup(&[(TIMEOUT_ENV, "soon")]))
                .unwrap_err();
            assert_eq!(err.to_string(), "Invalid value \"soon\" for ESPERAR_TIMEOUT_MS");
        }

        #[test]
        fn test_zero_interval_override_rejected() {
            assert!(EsperarConfig::default()
                .with_overrides_from(lookup(&[(POLL_INTERVAL_ENV, "0")]))
                .is_err());
        }
    }

    #[test]
    fn test_wait_spec_from_config() {
        let spec = EsperarConfig::default()
            .with_timeout_ms(900)
            .with_poll_interval_ms(30)
            .wait_spec()
            .unwrap();
        assert_eq!(spec.timeout_ms(), 900);
        assert_eq!(spec.poll_interval_ms(), 30);
    }
}
