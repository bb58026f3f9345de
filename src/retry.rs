use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one)
    pub max_attempts: u32,
    /// Initial delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff (e.g., 2.0 doubles the delay each time)
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Create a new retry configuration. `max_attempts` below one is raised to one.
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    /// Set the maximum delay between retries
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Set the backoff multiplier
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Preset: Telegram Bot API calls (3 attempts)
    /// Delays: 1s, 2s = 3s total wait time
    pub fn telegram_api() -> Self {
        Self::new(3, Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(5))
            .with_backoff_multiplier(2.0)
    }

    /// Preset: startup calls such as deleteWebhook (5 attempts)
    /// Delays: 1s, 2s, 4s, 8s = 15s total wait time
    pub fn startup() -> Self {
        Self::new(5, Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(8))
            .with_backoff_multiplier(2.0)
    }

    /// Calculate the delay for a given attempt number (0-indexed)
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);

        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::telegram_api()
    }
}

/// What to do about a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAdvice {
    /// Not retryable (e.g. 4xx client errors); fail immediately
    GiveUp,
    /// Retry after the configured exponential delay
    Backoff,
    /// Retry after the server-specified delay (e.g. Telegram's `retry_after`)
    After(Duration),
}

/// Execute an async operation with retries, asking `advise` how to treat each error.
///
/// A server-specified delay replaces the exponential delay for the next attempt
/// but is still capped by `config.max_delay`.
pub async fn with_retry_advice<T, E, F, Fut, A>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    advise: A,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    A: Fn(&E) -> RetryAdvice,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    let mut override_delay: Option<Duration> = None;

    loop {
        // Wait before retry (except for first attempt)
        let delay = override_delay
            .take()
            .map(|d| d.min(config.max_delay))
            .unwrap_or_else(|| config.delay_for_attempt(attempt));
        if !delay.is_zero() {
            debug!(
                "{}: Retry attempt {}/{} after {:?}",
                operation_name,
                attempt + 1,
                max_attempts,
                delay
            );
            sleep(delay).await;
        }

        let e = match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(
                        "{}: Succeeded on attempt {}/{}",
                        operation_name,
                        attempt + 1,
                        max_attempts
                    );
                }
                return Ok(result);
            }
            Err(e) => e,
        };

        match advise(&e) {
            RetryAdvice::GiveUp => {
                debug!(
                    "{}: Error is not retryable, failing immediately: {}",
                    operation_name, e
                );
                return Err(e);
            }
            RetryAdvice::After(wait) => override_delay = Some(wait),
            RetryAdvice::Backoff => {}
        }

        let remaining = max_attempts - attempt - 1;
        if remaining == 0 {
            warn!(
                "{}: All {} attempts failed. Last error: {}",
                operation_name, max_attempts, e
            );
            return Err(e);
        }

        warn!(
            "{}: Attempt {}/{} failed ({}), {} retries remaining",
            operation_name,
            attempt + 1,
            max_attempts,
            e,
            remaining
        );
        attempt += 1;
    }
}
