//! Configuration management for taskbind
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use taskbind::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Pool workers: {}", config.pool.workers);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `TASKBIND__<section>__<key>`
//!
//! Examples:
//! - `TASKBIND__POOL__WORKERS=32`
//! - `TASKBIND__POOL__SATURATION=reject`
//! - `TASKBIND__DISPATCH__DEFAULT_TIMEOUT=500ms`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/taskbind.toml`.
//! This can be overridden using the `TASKBIND_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{Config, DispatchConfig, PoolConfig, SaturationPolicy, TelemetryConfig};
pub use validation::{MAX_QUEUE_CAPACITY, MAX_WORKERS, ValidationError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`TASKBIND__*`)
    /// 2. TOML file (default: `config/taskbind.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[pool]
workers = 2
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.pool.workers, 2);
        assert_eq!(config.pool.queue_capacity, 50);
    }

    #[test]
    fn test_validation_catches_zero_workers() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[pool]
workers = 0
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::NoWorkers)
        ));
    }

    #[test]
    fn test_oversized_queue_fails_validation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[pool]\nqueue_capacity = 9223372036854775807\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::QueueTooLarge { .. })
        ));
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[pool]\nsaturation = \"drop_oldest\"\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(result.unwrap_err(), ConfigError::LoadError(_)));
    }

    #[test]
    fn test_full_config_example() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[pool]
workers = 16
queue_capacity = 128
saturation = "reject"

[dispatch]
default_timeout = "1m"

[telemetry]
log_filter = "info,taskbind=debug"
json_logs = false
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();

        assert_eq!(config.pool.workers, 16);
        assert_eq!(config.pool.queue_capacity, 128);
        assert_eq!(config.pool.saturation, SaturationPolicy::Reject);
        assert_eq!(config.dispatch.timeout(), Some(Duration::from_secs(60)));
        assert!(!config.telemetry.json_logs);
    }
}
