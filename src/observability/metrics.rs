//! # Metrics Collection
//!
//! Validation cache telemetry. Counters are owned by the cache instance and
//! mirrored into the `metrics` facade so whatever recorder the host process
//! installs picks them up.

use metrics::{counter, describe_counter, Unit};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Once;

/// Metric name for validation cache hits
pub const VALIDATION_CACHE_HITS: &str = "transformation_validation_cache_hits_total";

/// Metric name for validation cache misses
pub const VALIDATION_CACHE_MISSES: &str = "transformation_validation_cache_misses_total";

static DESCRIBE: Once = Once::new();

/// Register metric descriptions so exporters show them before the first event.
pub fn describe_validation_cache_metrics() {
    DESCRIBE.call_once(|| {
        describe_counter!(
            VALIDATION_CACHE_HITS,
            Unit::Count,
            "The number of cache hits while validating transformation config"
        );
        describe_counter!(
            VALIDATION_CACHE_MISSES,
            Unit::Count,
            "The number of cache misses while validating transformation config"
        );
    });
}

/// Hit/miss counters for one validation cache
#[derive(Debug, Default)]
pub struct ValidationCacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    emit: bool,
}

impl ValidationCacheCounters {
    /// Create counters; `emit` controls forwarding to the `metrics` facade
    pub fn new(emit: bool) -> Self {
        if emit {
            describe_validation_cache_metrics();
        }
        Self { hits: AtomicU64::new(0), misses: AtomicU64::new(0), emit }
    }

    /// Record a cache hit
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        if self.emit {
            counter!(VALIDATION_CACHE_HITS).increment(1);
        }
    }

    /// Record a cache miss
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        if self.emit {
            counter!(VALIDATION_CACHE_MISSES).increment(1);
        }
    }

    /// Total hits since construction
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Total misses since construction
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Whether events are forwarded to the `metrics` facade
    pub fn emits_metrics(&self) -> bool {
        self.emit
    }
}
