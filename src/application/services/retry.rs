//! # Bounded Retry
//!
//! Exponential backoff for ledger writes that may fail transiently.
//!
//! Only transient errors (lost connections) are retried; everything else is
//! returned immediately.

use crate::infrastructure::persistence::RepositoryResult;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded exponential backoff.
///
/// # Examples
///
/// ```
/// use tbill_ledger::application::services::retry::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(3, Duration::from_millis(20), Duration::from_millis(200));
/// assert_eq!(policy.delay_for(0), Duration::from_millis(20));
/// assert_eq!(policy.delay_for(1), Duration::from_millis(40));
/// assert_eq!(policy.delay_for(10), Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// A policy that tries exactly once.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Returns the total number of attempts, first one included.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the sleep before retry number `retry` (0-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// # Errors
    ///
    /// Returns the last error seen.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut op: F) -> RepositoryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RepositoryResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_attempts || !e.is_transient() {
                        return Err(e);
                    }
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "ledger write failed, retrying"
                    );
                    tokio::time::sleep(self.delay_for(attempt - 1)).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(50), Duration::from_secs(1))
    }
}
