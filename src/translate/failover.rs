//! Retry controller: bounded retries against the primary provider, then a
//! single attempt against the fallback.
//!
//! Delay before attempt `k` (k >= 1) is `base_delay * k`. After a quota
//! failure on attempt `k` (if another attempt remains) the controller also
//! waits `quota_delay * (k + 1)`, so quota backoff dominates and grows with
//! every rejection.

use super::{
    PipelineError, ProviderError, ProviderErrorKind, TranslationCache, TranslationMetrics,
    TranslationProvider, TranslationRequest, TranslationResult,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

/// Backoff settings for the primary provider.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Maximum number of primary attempts (including the first one)
    pub max_attempts: u32,
    /// Linear delay unit applied before every retry
    pub base_delay: Duration,
    /// Extra delay unit applied after a quota rejection
    pub quota_delay: Duration,
}

impl BackoffPolicy {
    /// Create a policy with the production delays (1s linear, 10s quota).
    /// `max_attempts` below one is raised to one.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_secs(1),
            quota_delay: Duration::from_secs(10),
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_quota_delay(mut self, quota_delay: Duration) -> Self {
        self.quota_delay = quota_delay;
        self
    }

    /// Linear delay before attempt `attempt` (0-indexed)
    pub fn base_delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Extra wait after a quota failure on attempt `attempt` (0-indexed)
    pub fn quota_delay_after(&self, attempt: u32) -> Duration {
        self.quota_delay * (attempt + 1)
    }

    /// Total wait before attempt `attempt` when every earlier attempt hit the quota
    pub fn quota_wait_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.base_delay_for_attempt(attempt) + self.quota_delay_after(attempt - 1)
    }

    /// Decide what happens after a failed attempt.
    pub fn next_step(&self, attempt: &ProviderAttempt) -> NextStep {
        if attempt.attempt_index + 1 >= self.max_attempts {
            return NextStep::Failover;
        }

        match attempt.outcome {
            AttemptOutcome::QuotaError => NextStep::Retry {
                extra_delay: self.quota_delay_after(attempt.attempt_index),
            },
            AttemptOutcome::TransientError => NextStep::Retry {
                extra_delay: Duration::ZERO,
            },
            AttemptOutcome::OtherError | AttemptOutcome::Success => NextStep::Failover,
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    QuotaError,
    /// Network trouble or a malformed body; worth another try
    TransientError,
    /// Retrying will not help (e.g. bad credentials)
    OtherError,
}

impl From<&ProviderError> for AttemptOutcome {
    fn from(err: &ProviderError) -> Self {
        match err.kind {
            ProviderErrorKind::Quota => AttemptOutcome::QuotaError,
            ProviderErrorKind::Network | ProviderErrorKind::Malformed => {
                AttemptOutcome::TransientError
            }
            ProviderErrorKind::Other => AttemptOutcome::OtherError,
        }
    }
}

/// One call against the primary provider. Lives only for the retry decision.
#[derive(Debug, Clone)]
pub struct ProviderAttempt {
    pub attempt_index: u32,
    pub started_at: Instant,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Retry { extra_delay: Duration },
    Failover,
}

pub struct RetryController {
    primary: Arc<dyn TranslationProvider>,
    fallback: Arc<dyn TranslationProvider>,
    cache: TranslationCache,
    policy: BackoffPolicy,
    metrics: Arc<TranslationMetrics>,
}

impl RetryController {
    pub fn new(
        primary: Arc<dyn TranslationProvider>,
        fallback: Arc<dyn TranslationProvider>,
        cache: TranslationCache,
        policy: BackoffPolicy,
        metrics: Arc<TranslationMetrics>,
    ) -> Self {
        Self {
            primary,
            fallback,
            cache,
            policy,
            metrics,
        }
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<TranslationMetrics> {
        &self.metrics
    }

    /// Translate `request`, serving from cache when possible.
    ///
    /// The cache is consulted once, up front. Two concurrent runs for the same
    /// key may both reach the provider; results are idempotent so the second
    /// write simply replaces the first.
    pub async fn translate_with_retry(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResult, PipelineError> {
        match self.run_primary(request, &self.policy).await {
            Ok(result) => Ok(result),
            Err(primary_error) => self.failover(request, primary_error).await,
        }
    }

    /// A single primary call with no retries and no failover. Still served
    /// from and written to the cache.
    pub async fn translate_primary_once(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResult, ProviderError> {
        self.run_primary(request, &BackoffPolicy::new(1)).await
    }

    async fn run_primary(
        &self,
        request: &TranslationRequest,
        policy: &BackoffPolicy,
    ) -> Result<TranslationResult, ProviderError> {
        let key = request.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            self.metrics.record_cache_hit();
            debug!("Cache hit for {} translation", request.target.name());
            return Ok(hit);
        }
        self.metrics.record_cache_miss();

        let primary_name = self.primary.name();
        let mut attempt_index = 0;

        // next_step always fails over on the last attempt, so this terminates
        loop {
            let delay = policy.base_delay_for_attempt(attempt_index);
            if !delay.is_zero() {
                debug!(
                    "{}: Retry attempt {}/{} after {:?}",
                    primary_name,
                    attempt_index + 1,
                    policy.max_attempts,
                    delay
                );
                sleep(delay).await;
            }

            let started_at = Instant::now();
            self.metrics.record_primary_call();

            match self.primary.translate(&request.text, request.target).await {
                Ok(translation) => {
                    if attempt_index > 0 {
                        debug!(
                            "{}: Succeeded on attempt {}/{}",
                            primary_name,
                            attempt_index + 1,
                            policy.max_attempts
                        );
                    }
                    let result = TranslationResult::fresh(translation, primary_name);
                    self.cache.put(key, result.clone());
                    return Ok(result);
                }
                Err(e) => {
                    self.metrics.record_primary_failure();
                    let attempt = ProviderAttempt {
                        attempt_index,
                        started_at,
                        outcome: AttemptOutcome::from(&e),
                    };
                    let step = policy.next_step(&attempt);

                    warn!(
                        "{}: Attempt {}/{} failed after {:?} ({}), next: {:?}",
                        primary_name,
                        attempt_index + 1,
                        policy.max_attempts,
                        attempt.started_at.elapsed(),
                        e,
                        step
                    );

                    match step {
                        NextStep::Retry { extra_delay } => {
                            if !extra_delay.is_zero() {
                                sleep(extra_delay).await;
                            }
                            attempt_index += 1;
                        }
                        NextStep::Failover => return Err(e),
                    }
                }
            }
        }
    }

    async fn failover(
        &self,
        request: &TranslationRequest,
        primary_error: ProviderError,
    ) -> Result<TranslationResult, PipelineError> {
        info!(
            "Trying fallback translation service ({}) for {} target, {:?} after request",
            self.fallback.name(),
            request.target.name(),
            request.age()
        );
        self.metrics.record_fallback_call();

        match self.fallback.translate(&request.text, request.target).await {
            // Not cached: a later primary answer carries real language detection
            Ok(translation) => Ok(TranslationResult::fresh(translation, self.fallback.name())),
            Err(fallback_error) => {
                self.metrics.record_fallback_failure();
                error!(
                    "Fallback translation also failed after {:?}: {}",
                    request.age(),
                    fallback_error
                );
                Err(PipelineError::AllProvidersFailed {
                    primary: primary_error,
                    fallback: fallback_error,
                })
            }
        }
    }
}
