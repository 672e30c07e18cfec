//! # Observability Infrastructure
//!
//! Structured logging setup and validation cache counters.

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use self::metrics::{describe_validation_cache_metrics, ValidationCacheCounters};

use crate::config::ObservabilityConfig;
use crate::errors::Result;

/// Initialize all observability components
pub fn init_observability(config: &ObservabilityConfig) -> Result<()> {
    init_logging(config)?;

    if config.enable_metrics {
        describe_validation_cache_metrics();
    }

    Ok(())
}
