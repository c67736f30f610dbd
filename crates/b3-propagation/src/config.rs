// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Sampler configuration.
//!
//! Configuration can be loaded from:
//! - **Environment variables**: [`SamplerConfig::from_env`]
//! - **Documents**: any serde format, using the field names of [`SamplerConfig`]
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `DD_TRACE_B3_SAMPLE_RATE` | `sample_rate` | `0.0` |
//! | `DD_TRACE_B3_DONT_SAMPLE_LIST` | `dont_sample_list` | empty |
//! | `DD_LOG_LEVEL` | `log_level` | `info` |

use std::env;

use serde::{Deserialize, Deserializer};

use crate::sampler::parse_sample_rate;

pub const SAMPLE_RATE_ENV: &str = "DD_TRACE_B3_SAMPLE_RATE";
pub const DONT_SAMPLE_LIST_ENV: &str = "DD_TRACE_B3_DONT_SAMPLE_LIST";
pub const LOG_LEVEL_ENV: &str = "DD_LOG_LEVEL";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Fatal configuration errors, raised when a sampler is built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: sample rate {0} is not between 0 and 1")]
    SampleRateOutOfRange(f64),

    #[error("Invalid log level '{0}'. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Raw sampler configuration.
///
/// Values are kept as strings: interpretation (and fallback for malformed
/// numbers) is owned by the [`Sampler`](crate::Sampler).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Probability in `[0, 1]` that an undecided request is sampled.
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub sample_rate: Option<String>,
    /// Comma separated path prefixes that are never sampled.
    pub dont_sample_list: Option<String>,
    pub log_level: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sample_rate: None,
            dont_sample_list: None,
            log_level: "info".to_string(),
        }
    }
}

impl SamplerConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let sample_rate = env::var(SAMPLE_RATE_ENV).ok();
        let dont_sample_list = env::var(DONT_SAMPLE_LIST_ENV).ok();
        let log_level = env::var(LOG_LEVEL_ENV)
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());

        let config = Self {
            sample_rate,
            dont_sample_list,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_sample_rate(self.sample_rate.as_deref())?;

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }

        Ok(())
    }
}

/// Accepts the sample rate as either a string or a bare number.
fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;

    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(other) => {
            tracing::debug!("Ignoring sample rate {other}, expected a number");
            None
        }
        None => None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        env::remove_var(SAMPLE_RATE_ENV);
        env::remove_var(DONT_SAMPLE_LIST_ENV);
        env::remove_var(LOG_LEVEL_ENV);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SamplerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = SamplerConfig {
            log_level: "verbose".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel("verbose".to_string()))
        );
    }

    #[test]
    fn test_validate_sample_rate_out_of_range() {
        let config = SamplerConfig {
            sample_rate: Some("1.1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::SampleRateOutOfRange(1.1))
        );
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        env::set_var(SAMPLE_RATE_ENV, "0.25");
        env::set_var(DONT_SAMPLE_LIST_ENV, "health,metrics");
        env::set_var(LOG_LEVEL_ENV, "DEBUG");

        let config = SamplerConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.sample_rate.as_deref(), Some("0.25"));
        assert_eq!(config.dont_sample_list.as_deref(), Some("health,metrics"));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();

        let config = SamplerConfig::from_env().unwrap();

        assert_eq!(config, SamplerConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_out_of_range_rate() {
        clear_env();
        env::set_var(SAMPLE_RATE_ENV, "-0.5");

        let result = SamplerConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(ConfigError::SampleRateOutOfRange(_))));
    }

    #[test]
    fn test_deserialize_document() {
        let config: SamplerConfig = serde_json::from_str(
            r#"{"sample_rate": 0.5, "dont_sample_list": "health", "log_level": "warn"}"#,
        )
        .unwrap();

        assert_eq!(config.sample_rate.as_deref(), Some("0.5"));
        assert_eq!(config.dont_sample_list.as_deref(), Some("health"));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_deserialize_partial_document() {
        let config: SamplerConfig = serde_json::from_str(r#"{"sample_rate": "0.1"}"#).unwrap();

        assert_eq!(config.sample_rate.as_deref(), Some("0.1"));
        assert_eq!(config.dont_sample_list, None);
        assert_eq!(config.log_level, "info");
    }
}
