//! # Structured Logging
//!
//! Subscriber setup and span helpers built on the tracing ecosystem.

use crate::config::ObservabilityConfig;
use crate::errors::{Result, TranslatorError};
use tracing_subscriber::EnvFilter;

/// Create a tracing span for translating a single route.
///
/// ```rust,ignore
/// let span = translation_span!("transformation", route_name);
/// let span = translation_span!("headers", route_name, destinations = 2);
/// ```
#[macro_export]
macro_rules! translation_span {
    ($plugin:expr, $route:expr) => {
        tracing::debug_span!(
            "route_translation",
            plugin = %$plugin,
            route = %$route
        )
    };
    ($plugin:expr, $route:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "route_translation",
            plugin = %$plugin,
            route = %$route,
            $($field)*
        )
    };
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when it is set. Fails if a
/// global subscriber was already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| {
            TranslatorError::config(format!("Invalid log level '{}': {}", config.log_level, e))
        })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = if config.json_logging {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| TranslatorError::config(format!("Failed to install subscriber: {}", e)))?;

    tracing::info!(
        log_level = %config.log_level,
        json_logging = config.json_logging,
        metrics_enabled = config.enable_metrics,
        "Logging initialized"
    );

    Ok(())
}
