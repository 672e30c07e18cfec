//! Hash-keyed memoization of external validation outcomes.
//!
//! Validating a generated filter config means starting a proxy process, so
//! the outcome for each distinct artifact is remembered in a bounded LRU
//! keyed by the artifact's [`ContentHash`]. Rejections are remembered as
//! well as acceptances. Failures to run the validator at all, cancellation
//! and timeouts are not, so the next call for the same artifact retries.
//!
//! Concurrent calls for the same hash are serialized through a per-key gate:
//! only one of them runs the validator, the others pick up its stored
//! outcome once the gate opens.

use async_trait::async_trait;
use cached::{Cached, SizedCache};
use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::hash::ContentHash;
use crate::config::AppConfig;
use crate::errors::{Result, TranslatorError};
use crate::observability::ValidationCacheCounters;

const OPERATION: &str = "filter config validation";

/// Result of a completed validation run. Both variants are cacheable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
    /// The validator ran and refused the artifact
    Rejected(String),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted)
    }

    /// `Rejected` becomes [`TranslatorError::Rejected`]
    pub fn into_result(self) -> Result<()> {
        match self {
            ValidationOutcome::Accepted => Ok(()),
            ValidationOutcome::Rejected(message) => Err(TranslatorError::rejected(message)),
        }
    }
}

/// The expensive, external check wrapped by [`ValidationCache`].
///
/// Return `Err` only when validation could not be carried out; a config the
/// validator refuses is `Ok(ValidationOutcome::Rejected(..))`.
#[async_trait]
pub trait ConfigValidator: Send + Sync {
    type Artifact: ContentHash + Send + Sync;

    async fn validate(&self, artifact: &Self::Artifact) -> Result<ValidationOutcome>;
}

/// Bounded LRU of validation outcomes in front of a [`ConfigValidator`]
pub struct ValidationCache<V: ConfigValidator> {
    validator: V,
    entries: Mutex<SizedCache<u64, ValidationOutcome>>,
    in_flight: DashMap<u64, Arc<tokio::sync::Mutex<()>>>,
    counters: ValidationCacheCounters,
    timeout: Duration,
}

impl<V: ConfigValidator> ValidationCache<V> {
    /// `validation.cache_capacity` bounds the number of remembered outcomes,
    /// `validation.timeout()` bounds each validator run, and
    /// `observability.enable_metrics` decides whether hits and misses are
    /// also emitted as metrics.
    pub fn new(validator: V, config: &AppConfig) -> Self {
        let validation = &config.validation;
        Self {
            validator,
            entries: Mutex::new(SizedCache::with_size(validation.cache_capacity.max(1))),
            in_flight: DashMap::new(),
            counters: ValidationCacheCounters::new(config.observability.enable_metrics),
            timeout: validation.timeout(),
        }
    }

    /// Validate `artifact`, reusing the remembered outcome for its hash.
    ///
    /// Every call records exactly one hit or one miss, based on the cache
    /// state when the call starts.
    pub async fn validate(&self, cancel: &CancellationToken, artifact: &V::Artifact) -> Result<()> {
        let hash = artifact.content_hash().map_err(|e| {
            error!(error = %e, "failed to hash validation artifact");
            e
        })?;

        if let Some(outcome) = self.lookup(hash) {
            self.counters.record_hit();
            debug!(hash = %format_args!("{:016x}", hash), "validation cache hit");
            return outcome.into_result();
        }
        self.counters.record_miss();
        debug!(hash = %format_args!("{:016x}", hash), "validation cache miss");

        let gate = self
            .in_flight
            .entry(hash)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();

        let result = self.validate_gated(cancel, hash, artifact, &gate).await;
        self.in_flight.remove_if(&hash, |_, current| Arc::ptr_eq(current, &gate));

        result?.into_result()
    }

    /// Number of remembered outcomes
    pub fn len(&self) -> usize {
        self.lock_entries().cache_size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.counters.hits()
    }

    pub fn misses(&self) -> u64 {
        self.counters.misses()
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    pub fn emits_metrics(&self) -> bool {
        self.counters.emits_metrics()
    }

    async fn validate_gated(
        &self,
        cancel: &CancellationToken,
        hash: u64,
        artifact: &V::Artifact,
        gate: &tokio::sync::Mutex<()>,
    ) -> Result<ValidationOutcome> {
        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TranslatorError::cancelled(OPERATION)),
            guard = gate.lock() => guard,
        };

        // another caller may have finished while we waited for the gate
        if let Some(outcome) = self.lookup(hash) {
            return Ok(outcome);
        }
        self.run_validator(cancel, hash, artifact).await
    }

    async fn run_validator(
        &self,
        cancel: &CancellationToken,
        hash: u64,
        artifact: &V::Artifact,
    ) -> Result<ValidationOutcome> {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TranslatorError::cancelled(OPERATION)),
            res = tokio::time::timeout(self.timeout, self.validator.validate(artifact)) => match res {
                Ok(outcome) => outcome?,
                Err(_) => {
                    return Err(TranslatorError::timeout(OPERATION, self.timeout.as_millis() as u64))
                }
            },
        };

        if let ValidationOutcome::Rejected(reason) = &outcome {
            info!(hash = %format_args!("{:016x}", hash), reason = %reason, "filter config rejected by validator");
        }

        self.lock_entries().cache_set(hash, outcome.clone());
        Ok(outcome)
    }

    fn lookup(&self, hash: u64) -> Option<ValidationOutcome> {
        self.lock_entries().cache_get(&hash).cloned()
    }

    fn lock_entries(&self) -> MutexGuard<'_, SizedCache<u64, ValidationOutcome>> {
        // entries are only replaced whole, so a poisoned map is still consistent
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
