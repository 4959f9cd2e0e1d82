//! Run configuration for the augmentation pipeline.

use std::time::Duration;
use thiserror::Error;

use crate::documents::DEFAULT_EXTENSION;

/// Upper bound on retries; keeps `base_delay * 2^attempt` in a sane range.
pub const MAX_RETRIES_LIMIT: u32 = 16;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration for an augmentation run.
#[derive(Debug, Clone)]
pub struct AugmentConfig {
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub base_delay: Duration,
    /// Timeout for a single generation request.
    pub request_timeout: Duration,
    /// Extension of document files, without the dot.
    pub extension: String,
    /// Whether to probe the backend before touching any document.
    pub preflight: bool,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            extension: DEFAULT_EXTENSION.to_string(),
            preflight: true,
        }
    }
}

impl AugmentConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `NEWSFORGE_MAX_RETRIES`: Retries for transient failures (default: 5)
    /// - `NEWSFORGE_BASE_DELAY_SECS`: First backoff delay in seconds (default: 10)
    /// - `NEWSFORGE_REQUEST_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    /// - `NEWSFORGE_EXTENSION`: Document file extension (default: json)
    /// - `NEWSFORGE_PREFLIGHT`: Probe the backend before the run (default: true)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("NEWSFORGE_MAX_RETRIES") {
            config.max_retries = parse_env_value(&val, "NEWSFORGE_MAX_RETRIES")?;
        }

        if let Ok(val) = std::env::var("NEWSFORGE_BASE_DELAY_SECS") {
            let secs: u64 = parse_env_value(&val, "NEWSFORGE_BASE_DELAY_SECS")?;
            config.base_delay = Duration::from_secs(secs);
        }

        if let Ok(val) = std::env::var("NEWSFORGE_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_env_value(&val, "NEWSFORGE_REQUEST_TIMEOUT_SECS")?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Ok(val) = std::env::var("NEWSFORGE_EXTENSION") {
            config.extension = val;
        }

        if let Ok(val) = std::env::var("NEWSFORGE_PREFLIGHT") {
            config.preflight = parse_env_bool(&val, "NEWSFORGE_PREFLIGHT")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values, normalizing the extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::ValidationFailed(format!(
                "max_retries must be at most {}",
                MAX_RETRIES_LIMIT
            )));
        }

        if self.base_delay.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "base_delay must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        self.extension = self.extension.trim().trim_start_matches('.').to_string();
        if self.extension.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "extension cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder method to set max retries.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Builder method to set the base backoff delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Builder method to set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builder method to set the document extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Builder method to enable or disable the preflight probe.
    pub fn with_preflight(mut self, enabled: bool) -> Self {
        self.preflight = enabled;
        self
    }
}

/// Parses an environment variable value into the specified type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
}

/// Parses a boolean environment variable value.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean, got '{}'", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let mut config = AugmentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.base_delay, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.extension, "json");
        assert!(config.preflight);
    }

    #[test]
    fn test_builder_pattern() {
        let config = AugmentConfig::new()
            .with_max_retries(2)
            .with_base_delay(Duration::from_millis(5))
            .with_request_timeout(Duration::from_secs(3))
            .with_extension("ndjson")
            .with_preflight(false);

        assert_eq!(config.max_retries, 2);
        assert_eq!(config.base_delay, Duration::from_millis(5));
        assert_eq!(config.extension, "ndjson");
        assert!(!config.preflight);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AugmentConfig::new().with_base_delay(Duration::ZERO);
        assert!(config.validate().is_err());

        let mut config = AugmentConfig::new().with_request_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let mut config = AugmentConfig::new().with_max_retries(MAX_RETRIES_LIMIT + 1);
        assert!(config.validate().is_err());

        let mut config = AugmentConfig::new().with_extension(" . ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_strips_leading_dot() {
        let mut config = AugmentConfig::new().with_extension(".json");
        config.validate().expect("valid");
        assert_eq!(config.extension, "json");
    }

    #[test]
    fn test_parse_env_value() {
        assert_eq!(parse_env_value::<u32>(" 42 ", "TEST").unwrap(), 42);
        assert!(parse_env_value::<u32>("abc", "TEST").is_err());
    }

    #[test]
    fn test_parse_env_bool() {
        assert!(parse_env_bool("yes", "TEST").unwrap());
        assert!(!parse_env_bool("OFF", "TEST").unwrap());
        assert!(parse_env_bool("maybe", "TEST").is_err());
    }
}
