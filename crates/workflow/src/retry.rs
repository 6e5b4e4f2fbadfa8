//! Timeout and retry policy for store calls.
//!
//! Every store call made by the workflow goes through [`RetryPolicy::run`].
//! Each attempt gets its own deadline; transient failures are retried with
//! exponential backoff. Store mutations are idempotent or check-then-act, so
//! a retry after a timeout never applies a change twice.

use std::future::Future;
use std::time::Duration;

use storyday_storage::{StorageError, StoreOperation};

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 250;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 4_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Deadline for a single attempt.
    pub timeout: Duration,
    /// Total attempts, including the first. Treated as at least 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    /// One attempt, bounded by `timeout`.
    pub fn no_retry(timeout: Duration) -> Self {
        RetryPolicy {
            timeout,
            max_attempts: 1,
            ..RetryPolicy::default()
        }
    }

    /// Delay before retry number `retry` (0 for the first retry).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `f` until it succeeds, fails permanently, or attempts run out.
    ///
    /// An attempt that exceeds `timeout` counts as
    /// [`StorageError::Timeout`]. The last error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, operation: StoreOperation, mut f: F) -> Result<T, StorageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = match tokio::time::timeout(self.timeout, f()).await {
                Ok(result) => result,
                Err(_) => Err(StorageError::Timeout { operation }),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let backoff = self.backoff_for(attempt - 1);
                    tracing::warn!(
                        %operation,
                        attempt,
                        max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "retryable store error, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_retryable() {
                        tracing::warn!(%operation, attempts = attempt, error = %err, "store call failed after retries");
                    }
                    return Err(err);
                }
            }
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
