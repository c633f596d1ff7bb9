//! Bounded retry with linear backoff.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use taleweaver_error::RetryableError;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, warn};

/// How many times to try and how long to wait in between.
///
/// The wait before retry `n` (1-based) is `base_delay_ms * n`; failures
/// classified as timeouts wait twice as long.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use taleweaver_models::RetryPolicy;
///
/// let policy = RetryPolicy::new(3, 2000);
/// assert_eq!(policy.delay_for(1, false), Duration::from_millis(2000));
/// assert_eq!(policy.delay_for(2, false), Duration::from_millis(4000));
/// assert_eq!(policy.delay_for(2, true), Duration::from_millis(8000));
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_getters::Getters,
)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,
    /// Backoff unit in milliseconds
    #[serde(default = "default_base_delay_ms")]
    base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy. Zero attempts is treated as one.
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
        }
    }

    /// A single attempt with no retries.
    pub fn no_retry() -> Self {
        Self::new(1, 0)
    }

    /// Wait before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32, timeout: bool) -> Duration {
        let factor = if timeout { 2 } else { 1 };
        Duration::from_millis(
            self.base_delay_ms
                .saturating_mul(u64::from(attempt))
                .saturating_mul(factor),
        )
    }

    fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let policy = *self;
        (1..policy.max_attempts.max(1)).map(move |n| policy.delay_for(n, false))
    }
}

/// Run `action` until it succeeds, fails permanently, or attempts run out.
///
/// Errors are classified with [`RetryableError`]: permanent errors surface
/// immediately, transient errors are retried after a linearly growing delay,
/// and timeouts wait twice as long. When attempts are exhausted the last
/// error is returned.
///
/// Backoff uses `tokio::time::sleep`, so other tasks keep running.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut action: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + std::fmt::Display,
{
    let policy = *policy;
    let attempt = AtomicU32::new(0);

    Retry::spawn(policy.delays(), || {
        let n = attempt.fetch_add(1, Ordering::SeqCst) + 1;
        let fut = action();
        async move {
            match fut.await {
                Ok(value) => {
                    if n > 1 {
                        debug!(operation, attempt = n, "Succeeded after retry");
                    }
                    Ok(value)
                }
                Err(err) if !err.is_retryable() => {
                    warn!(operation, attempt = n, error = %err, "Permanent error, failing immediately");
                    Err(RetryError::Permanent(err))
                }
                Err(err) => {
                    let timeout = err.is_timeout();
                    let delay = policy.delay_for(n, timeout);
                    if n < policy.max_attempts {
                        warn!(
                            operation,
                            attempt = n,
                            max_attempts = policy.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            timeout,
                            error = %err,
                            "Transient error, will retry"
                        );
                    } else {
                        warn!(operation, attempt = n, error = %err, "Retries exhausted");
                    }
                    Err(RetryError::Transient {
                        err,
                        retry_after: timeout.then_some(delay),
                    })
                }
            }
        }
    })
    .await
}
