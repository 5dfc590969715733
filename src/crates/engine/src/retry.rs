//! Retry logic with exponential backoff
//!
//! Wraps a fallible async call: attempts are counted 1..=(max_retries + 1)
//! and the delay before retry i doubles from `base_delay`, capped at
//! [`MAX_BACKOFF`]. Every failed attempt is reported to an observer so the
//! caller can emit per-attempt events.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

/// Hard cap on any single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Retry configuration for one agent call.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,

    /// Delay before the first retry; doubles each attempt.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay after failed attempt `attempt` (0-indexed): `base * 2^attempt`,
    /// capped at [`MAX_BACKOFF`].
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let secs = self.base_delay.as_secs_f64() * 2f64.powi(attempt as i32);
        Duration::from_secs_f64(secs.min(MAX_BACKOFF.as_secs_f64()))
    }
}

/// Outcome of a retried operation.
#[derive(Debug, Clone)]
pub struct RetryResult<T> {
    /// Result of the final successful attempt, if any.
    pub value: Option<T>,

    /// Error of the final failed attempt when all retries exhausted.
    pub error: Option<String>,

    /// Total attempts made, 1..=(max_retries + 1).
    pub attempts: u32,
}

impl<T> RetryResult<T> {
    pub fn succeeded(&self) -> bool {
        self.value.is_some()
    }

    /// Retries consumed beyond the initial attempt.
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Execute `operation` with retry and backoff.
///
/// `on_failure` observes every failed attempt as
/// `(attempt_number, error, will_retry)` with `attempt_number` 1-based.
pub async fn with_retry<T, F, Fut, C>(
    config: &RetryConfig,
    label: &str,
    mut operation: F,
    mut on_failure: C,
) -> RetryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, String>>,
    C: FnMut(u32, &str, bool),
{
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        let attempt_number = attempt + 1;

        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(agent = %label, attempt = attempt_number, "retry succeeded");
                }
                return RetryResult {
                    value: Some(value),
                    error: None,
                    attempts: attempt_number,
                };
            }
            Err(error) => {
                let will_retry = attempt < config.max_retries;
                warn!(
                    agent = %label,
                    attempt = attempt_number,
                    max_attempts = config.max_retries + 1,
                    error = %error,
                    will_retry,
                    "attempt failed"
                );
                on_failure(attempt_number, &error, will_retry);
                last_error = Some(error);

                if will_retry {
                    sleep(config.delay_for(attempt)).await;
                }
            }
        }
    }

    RetryResult {
        value: None,
        error: last_error,
        attempts: config.max_retries + 1,
    }
}
