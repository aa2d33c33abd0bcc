//! Retry policy for per-item generation work.
//!
//! One policy is shared by every pipeline: a number of total attempts, a
//! delay between them and an optional backoff multiplier.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first one. Zero behaves as one.
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub delay: Duration,

    /// Multiplier applied to the delay for each further retry (1.0 = fixed).
    pub backoff_multiplier: f64,

    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_secs(1),
            backoff_multiplier: 1.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self { max_attempts: 1, delay: Duration::ZERO, ..Default::default() }
    }

    /// Fixed-delay policy with the given attempts.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay, ..Default::default() }
    }

    /// Use exponential backoff from the configured delay.
    pub fn with_backoff(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    /// Attempts actually made at most.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let millis = self.delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);

        #[allow(clippy::cast_sign_loss)]
        Duration::from_millis(capped as u64)
    }
}

/// Result of a retried operation.
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The final result (success or last error).
    pub result: Result<T, E>,

    /// Number of attempts made.
    pub attempts: u32,

    /// Total time spent, delays included.
    pub total_time: Duration,
}

impl<T, E> RetryResult<T, E> {
    /// Check if the operation succeeded.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Whether more than one attempt was needed.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Get the result.
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Retry an async operation with the given configuration.
///
/// `on_failure` sees every failed attempt, including the last one.
pub async fn retry_async<T, E, F, Fut, L>(
    config: &RetryConfig,
    mut operation: F,
    mut on_failure: L,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    L: FnMut(u32, &E),
{
    let start = Instant::now();
    let max_attempts = config.attempts();
    let mut attempts = 0;

    loop {
        attempts += 1;
        let result = operation().await;

        match result {
            Ok(_) => {
                return RetryResult { result, attempts, total_time: start.elapsed() };
            }
            Err(ref e) => {
                on_failure(attempts, e);
                if attempts >= max_attempts {
                    return RetryResult { result, attempts, total_time: start.elapsed() };
                }
            }
        }

        tokio::time::sleep(config.delay_for_attempt(attempts)).await;
    }
}
