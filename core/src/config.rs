//! Knob configuration: pacing delay, worker count and target URI

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Smallest accepted pacing delay in milliseconds
pub const MIN_DELAY_MILLIS: u64 = 100;
/// Largest accepted pacing delay in milliseconds
pub const MAX_DELAY_MILLIS: u64 = 10_000;
/// Smallest accepted worker count
pub const MIN_WORKERS: usize = 1;
/// Largest accepted worker count
pub const MAX_WORKERS: usize = 20;

/// Default pacing delay
pub const DEFAULT_DELAY_MILLIS: u64 = 1_000;
/// Default worker count
pub const DEFAULT_WORKERS: usize = 4;
/// Default target endpoint
pub const DEFAULT_TARGET_URI: &str = "http://127.0.0.1:8080/ok.json";

/// Knob configuration
///
/// `delay_millis` may change at any time and is picked up by every worker on
/// its next wait. `worker_count` and `target_uri` are frozen while a run is
/// active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnobConfig {
    /// Pacing interval per worker
    pub delay_millis: u64,

    /// Number of concurrent producer loops
    pub worker_count: usize,

    /// Endpoint every worker requests
    pub target_uri: String,
}

impl Default for KnobConfig {
    fn default() -> Self {
        Self {
            delay_millis: DEFAULT_DELAY_MILLIS,
            worker_count: DEFAULT_WORKERS,
            target_uri: DEFAULT_TARGET_URI.to_string(),
        }
    }
}

impl KnobConfig {
    /// Create a config with the given knobs
    pub fn new(delay_millis: u64, worker_count: usize, target_uri: impl Into<String>) -> Self {
        Self {
            delay_millis,
            worker_count,
            target_uri: target_uri.into(),
        }
    }

    /// Load and validate a JSON config file
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            source: err,
        })?;
        let config: KnobConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Pacing delay as a [`Duration`]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_millis)
    }

    /// Validate every field against its bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigUpdate::DelayMillis(self.delay_millis).validate()?;
        ConfigUpdate::WorkerCount(self.worker_count).validate()?;
        ConfigUpdate::TargetUri(self.target_uri.clone()).validate()
    }

    /// Validate and apply a single field update
    pub fn apply(&mut self, update: ConfigUpdate) -> Result<(), ConfigError> {
        update.validate()?;
        match update {
            ConfigUpdate::DelayMillis(ms) => self.delay_millis = ms,
            ConfigUpdate::WorkerCount(n) => self.worker_count = n,
            ConfigUpdate::TargetUri(uri) => self.target_uri = uri.trim().to_string(),
        }
        Ok(())
    }
}

/// Identifies one configuration field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigField {
    /// `delay_millis`
    DelayMillis,
    /// `worker_count`
    WorkerCount,
    /// `target_uri`
    TargetUri,
}

impl ConfigField {
    /// Whether the field is frozen while a run is active
    pub fn locked_while_running(self) -> bool {
        matches!(self, ConfigField::WorkerCount | ConfigField::TargetUri)
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigField::DelayMillis => "delay_millis",
            ConfigField::WorkerCount => "worker_count",
            ConfigField::TargetUri => "target_uri",
        })
    }
}

/// A single-field configuration change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigUpdate {
    /// Set the pacing delay
    DelayMillis(u64),
    /// Set the number of workers
    WorkerCount(usize),
    /// Set the target endpoint
    TargetUri(String),
}

impl ConfigUpdate {
    /// Field touched by this update
    pub fn field(&self) -> ConfigField {
        match self {
            ConfigUpdate::DelayMillis(_) => ConfigField::DelayMillis,
            ConfigUpdate::WorkerCount(_) => ConfigField::WorkerCount,
            ConfigUpdate::TargetUri(_) => ConfigField::TargetUri,
        }
    }

    /// Check the new value against its bounds
    ///
    /// Out-of-range values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ConfigUpdate::DelayMillis(ms) => {
                if !(MIN_DELAY_MILLIS..=MAX_DELAY_MILLIS).contains(ms) {
                    return Err(ConfigError::OutOfRange {
                        field: ConfigField::DelayMillis,
                        value: *ms,
                        min: MIN_DELAY_MILLIS,
                        max: MAX_DELAY_MILLIS,
                    });
                }
            }
            ConfigUpdate::WorkerCount(n) => {
                if !(MIN_WORKERS..=MAX_WORKERS).contains(n) {
                    return Err(ConfigError::OutOfRange {
                        field: ConfigField::WorkerCount,
                        value: *n as u64,
                        min: MIN_WORKERS as u64,
                        max: MAX_WORKERS as u64,
                    });
                }
            }
            ConfigUpdate::TargetUri(uri) => {
                if uri.trim().is_empty() {
                    return Err(ConfigError::EmptyUri);
                }
            }
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Numeric value outside its accepted range
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        /// Offending field
        field: ConfigField,
        /// Rejected value
        value: u64,
        /// Inclusive lower bound
        min: u64,
        /// Inclusive upper bound
        max: u64,
    },

    /// Target URI is blank
    #[error("target_uri must not be empty")]
    EmptyUri,

    /// Field cannot change while workers are running
    #[error("{0} cannot be changed while running; stop first")]
    LockedWhileRunning(ConfigField),

    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that was read
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`KnobConfig`]
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = KnobConfig::default();
        assert_eq!(config.delay_millis, 1_000);
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.target_uri, DEFAULT_TARGET_URI);
        assert!(config.validate().is_ok());
        assert_eq!(config.delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_apply_valid_updates() {
        let mut config = KnobConfig::default();
        config.apply(ConfigUpdate::DelayMillis(100)).unwrap();
        config.apply(ConfigUpdate::WorkerCount(20)).unwrap();
        config
            .apply(ConfigUpdate::TargetUri("  /ok.json ".to_string()))
            .unwrap();

        assert_eq!(config, KnobConfig::new(100, 20, "/ok.json"));
    }

    #[test]
    fn test_delay_bounds_rejected() {
        let mut config = KnobConfig::default();
        for ms in [0, 99, 10_001] {
            let err = config.apply(ConfigUpdate::DelayMillis(ms)).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::OutOfRange {
                    field: ConfigField::DelayMillis,
                    ..
                }
            ));
        }
        assert_eq!(config.delay_millis, DEFAULT_DELAY_MILLIS);
    }

    #[test]
    fn test_worker_bounds_rejected() {
        let mut config = KnobConfig::default();
        assert!(config.apply(ConfigUpdate::WorkerCount(0)).is_err());
        assert!(config.apply(ConfigUpdate::WorkerCount(21)).is_err());
        assert_eq!(config.worker_count, DEFAULT_WORKERS);
    }

    #[test]
    fn test_empty_uri_rejected() {
        let mut config = KnobConfig::default();
        let err = config
            .apply(ConfigUpdate::TargetUri("   ".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyUri));
    }

    #[test]
    fn test_locked_fields() {
        assert!(!ConfigField::DelayMillis.locked_while_running());
        assert!(ConfigField::WorkerCount.locked_while_running());
        assert!(ConfigField::TargetUri.locked_while_running());
    }

    #[test]
    fn test_error_message_names_field() {
        let err = ConfigUpdate::WorkerCount(50).validate().unwrap_err();
        assert_eq!(err.to_string(), "worker_count must be within [1, 20], got 50");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: KnobConfig = serde_json::from_str(r#"{"worker_count": 6}"#).unwrap();
        assert_eq!(config.worker_count, 6);
        assert_eq!(config.delay_millis, DEFAULT_DELAY_MILLIS);
        assert_eq!(config.target_uri, DEFAULT_TARGET_URI);
    }

    #[test]
    fn test_from_json_file_validates() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("loadknob-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"delay_millis": 50}"#).unwrap();

        let err = KnobConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_from_json_file_missing() {
        let err = KnobConfig::from_json_file("/nonexistent/loadknob.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
