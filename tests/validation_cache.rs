//! Integration tests for the validation cache

use async_trait::async_trait;
use envoy_types::pb::google::protobuf::StringValue;
use routeweave::config::AppConfig;
use routeweave::validation::{ConfigValidator, ValidationCache, ValidationOutcome};
use routeweave::xds::filters::{any_from_message, FilterConfigArtifact};
use routeweave::{Result, TranslatorError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

const FILTER: &str = "io.solo.transformation";

fn artifact(payload: &str) -> FilterConfigArtifact {
    FilterConfigArtifact::new(
        FILTER,
        any_from_message("type.googleapis.com/google.protobuf.StringValue", &StringValue {
            value: payload.to_string(),
        }),
    )
}

/// Test double: sleeps for `delay`, rejects payloads starting with "bad",
/// fails to run for payloads starting with "broken".
struct FakeValidator {
    calls: AtomicUsize,
    delay: Duration,
}

impl FakeValidator {
    fn new(delay: Duration) -> Self {
        Self { calls: AtomicUsize::new(0), delay }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigValidator for FakeValidator {
    type Artifact = FilterConfigArtifact;

    async fn validate(&self, artifact: &FilterConfigArtifact) -> Result<ValidationOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let payload = String::from_utf8_lossy(&artifact.config.value).to_string();
        if payload.contains("broken") {
            return Err(TranslatorError::validator_invocation("validator binary missing", None));
        }
        if payload.contains("bad") {
            return Ok(ValidationOutcome::Rejected("unknown field 'bad'".to_string()));
        }
        Ok(ValidationOutcome::Accepted)
    }
}

fn quiet_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.observability.enable_metrics = false;
    config
}

fn cache(delay: Duration) -> ValidationCache<FakeValidator> {
    ValidationCache::new(FakeValidator::new(delay), &quiet_config())
}

#[tokio::test]
async fn test_one_miss_then_one_hit() -> Result<()> {
    let cache = cache(Duration::ZERO);
    let token = CancellationToken::new();

    cache.validate(&token, &artifact("ok")).await?;
    cache.validate(&token, &artifact("ok")).await?;

    assert_eq!(cache.misses(), 1);
    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.validator().calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_two_distinct_artifacts_miss_twice() -> Result<()> {
    let cache = cache(Duration::ZERO);
    let token = CancellationToken::new();

    cache.validate(&token, &artifact("one")).await?;
    cache.validate(&token, &artifact("two")).await?;

    assert_eq!(cache.misses(), 2);
    assert_eq!(cache.hits(), 0);
    assert_eq!(cache.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_rejection_is_stable_without_revalidation() {
    let cache = cache(Duration::ZERO);
    let token = CancellationToken::new();

    let first = cache.validate(&token, &artifact("bad")).await.unwrap_err();
    let second = cache.validate(&token, &artifact("bad")).await.unwrap_err();

    assert!(matches!(first, TranslatorError::Rejected { .. }));
    assert_eq!(first.to_string(), second.to_string());
    assert!(!second.is_retryable());
    assert_eq!(cache.validator().calls(), 1);
}

#[tokio::test]
async fn test_invocation_failure_is_retried() {
    let cache = cache(Duration::ZERO);
    let token = CancellationToken::new();

    for _ in 0..2 {
        let err = cache.validate(&token, &artifact("broken")).await.unwrap_err();
        assert!(matches!(err, TranslatorError::ValidatorInvocation { .. }));
        assert!(err.is_retryable());
    }

    assert_eq!(cache.validator().calls(), 2);
    assert_eq!(cache.misses(), 2);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_concurrent_callers_validate_once() -> Result<()> {
    let cache = Arc::new(cache(Duration::from_millis(50)));
    let token = CancellationToken::new();

    let a = artifact("shared");
    let b = artifact("shared");
    let (first, second) = tokio::join!(cache.validate(&token, &a), cache.validate(&token, &b));
    first?;
    second?;

    assert_eq!(cache.validator().calls(), 1);
    assert_eq!(cache.hits() + cache.misses(), 2);
    assert_eq!(cache.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_cancellation_is_not_cached() {
    let cache = cache(Duration::from_secs(5));
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let err = cache.validate(&token, &artifact("slow")).await.unwrap_err();
    assert!(matches!(err, TranslatorError::Cancelled { .. }));
    assert!(cache.is_empty());
    assert_eq!(cache.validator().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_not_cached() {
    let mut config = quiet_config();
    config.validation.timeout_seconds = 1;
    let cache = ValidationCache::new(FakeValidator::new(Duration::from_secs(10)), &config);

    let err = cache.validate(&CancellationToken::new(), &artifact("slow")).await.unwrap_err();
    assert!(matches!(err, TranslatorError::Timeout { duration_ms: 1000, .. }));
    assert!(cache.is_empty());
}

#[traced_test]
#[tokio::test]
async fn test_hits_and_misses_are_logged() -> Result<()> {
    let cache = cache(Duration::ZERO);
    let token = CancellationToken::new();

    cache.validate(&token, &artifact("logged")).await?;
    cache.validate(&token, &artifact("logged")).await?;

    assert!(logs_contain("validation cache miss"));
    assert!(logs_contain("validation cache hit"));
    Ok(())
}
