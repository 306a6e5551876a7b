//! Configuration for the monitor and its pipeline
//!
//! Loaded from a TOML file; every field has a default matching the original
//! monitoring setup, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorConfig {
    /// Bounded capacity of each agent's inbound mailbox.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    /// Batching window of the ingestion loop, in milliseconds.
    #[serde(default = "default_batch_interval_ms")]
    pub batch_interval_ms: u64,

    /// Fallback boundary radius used when a position arrives for an agent
    /// with no recorded boundary.
    #[serde(default = "default_boundary_radius")]
    pub default_boundary_radius: i32,
}

fn default_mailbox_capacity() -> usize {
    100
}

fn default_batch_interval_ms() -> u64 {
    70
}

fn default_boundary_radius() -> i32 {
    1
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: default_mailbox_capacity(),
            batch_interval_ms: default_batch_interval_ms(),
            default_boundary_radius: default_boundary_radius(),
        }
    }
}

impl MonitorConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field-level constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mailbox_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "mailbox_capacity must be at least 1".to_string(),
            ));
        }
        if self.batch_interval_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "batch_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.default_boundary_radius < 1 {
            return Err(ConfigError::InvalidConfig(
                "default_boundary_radius must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Batching window as a [`Duration`].
    pub fn batch_interval(&self) -> Duration {
        Duration::from_millis(self.batch_interval_ms)
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_monitor() {
        let config = MonitorConfig::default();
        assert_eq!(config.mailbox_capacity, 100);
        assert_eq!(config.batch_interval_ms, 70);
        assert_eq!(config.default_boundary_radius, 1);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = MonitorConfig::from_toml("").expect("empty config should parse");
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides_single_field() {
        let config =
            MonitorConfig::from_toml("mailbox_capacity = 10\n").expect("config should parse");
        assert_eq!(config.mailbox_capacity, 10);
        assert_eq!(config.batch_interval_ms, 70);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = MonitorConfig::from_toml("mailbox_capacity = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = MonitorConfig::from_toml("batch_interval_ms = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_non_positive_radius_rejected() {
        let result = MonitorConfig::from_toml("default_boundary_radius = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let result = MonitorConfig::from_toml("mailbox_capacity = \"lots\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_batch_interval_duration() {
        let config = MonitorConfig {
            batch_interval_ms: 250,
            ..Default::default()
        };
        assert_eq!(config.batch_interval(), Duration::from_millis(250));
    }
}
