//! # Configuration Settings
//!
//! Defines the configuration structure for the translation core.

use crate::errors::{Result, TranslatorError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Environment variable prefix for layered settings
pub const ENV_PREFIX: &str = "ROUTEWEAVE";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Proxy-side validation configuration
    #[validate(nested)]
    pub validation: ValidationConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from `ROUTEWEAVE__<SECTION>__<FIELD>` environment variables.
    ///
    /// Unset fields keep their defaults. The loaded configuration is validated
    /// before it is returned.
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(TranslatorError::from)?;

        if self.validation.enabled && self.validation.envoy_binary.trim().is_empty() {
            return Err(TranslatorError::validation_field(
                "Envoy binary path cannot be blank when validation is enabled",
                "envoy_binary",
            ));
        }

        Ok(())
    }
}

/// Settings for validating generated filter configuration against the proxy
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ValidationConfig {
    /// Run the external validator at all
    pub enabled: bool,

    /// Path or name of the proxy binary used in `--mode validate`
    pub envoy_binary: String,

    /// Maximum number of remembered validation outcomes
    #[validate(range(
        min = 1,
        max = 1048576,
        message = "Cache capacity must be between 1 and 1048576 entries"
    ))]
    pub cache_capacity: usize,

    /// Upper bound for a single external validation run, in seconds
    #[validate(range(min = 1, max = 600, message = "Timeout must be between 1 and 600 seconds"))]
    pub timeout_seconds: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            envoy_binary: "envoy".to_string(),
            cache_capacity: 1024,
            timeout_seconds: 30,
        }
    }
}

impl ValidationConfig {
    /// Get the validation timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Observability configuration for logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Emit counters through the `metrics` facade
    pub enable_metrics: bool,

    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { enable_metrics: true, log_level: "info".to_string(), json_logging: false }
    }
}
