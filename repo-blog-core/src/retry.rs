//! Bounded retry with exponential backoff, shared by generation and
//! publishing.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::contract::Sleeper;

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    ///
    /// Non-decreasing in `attempt`: `base * 2^(attempt-1)`, capped at
    /// `max_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Real timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Final failure of a retried operation.
#[derive(Debug)]
pub struct RetryFailure<E> {
    /// Attempts actually made, including the failing one.
    pub attempts: u32,
    pub error: E,
    /// Whether the loop stopped because the attempt budget ran out.
    pub exhausted: bool,
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempt budget is spent.
///
/// `op` receives the 1-based attempt number. There is no cancellation: once
/// started the loop runs to success or its cap.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    stage: &'static str,
    is_retryable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(stage, attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) if is_retryable(&error) && attempt < max_attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    stage,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Transient failure, retrying"
                );
                sleeper.sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                let exhausted = is_retryable(&error);
                return Err(RetryFailure {
                    attempts: attempt,
                    error,
                    exhausted,
                });
            }
        }
    }
}
