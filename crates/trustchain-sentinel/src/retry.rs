//! Bounded exponential backoff for rate-limited upstream calls.
//!
//! Only failures that classify as rate limiting are retried; anything else
//! propagates on the first attempt. The wait before retry `k` (1-based) is
//! `base_delay * 2^(k-1)`. There is no jitter and no state shared between
//! calls: every invocation gets a fresh budget.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;
use trustchain_core::constants::{DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES};
use trustchain_core::error::FetchError;

/// Errors that can signal upstream rate limiting.
pub trait RateLimited {
    fn is_rate_limited(&self) -> bool;
}

impl RateLimited for FetchError {
    fn is_rate_limited(&self) -> bool {
        FetchError::is_rate_limited(self)
    }
}

/// Retry budget for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt; total attempts is `max_retries + 1`.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Wait before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Run `operation` until it succeeds, fails with a non-rate-limit error,
/// or exhausts the retry budget, in which case the last rate-limit error
/// is returned.
pub async fn fetch_with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RateLimited + Display,
{
    let mut retries = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_rate_limited() => {
                retries += 1;
                if retries > policy.max_retries {
                    warn!(retries = policy.max_retries, error = %err, "retry: budget exhausted");
                    return Err(err);
                }
                let wait = policy.delay_for(retries);
                warn!(
                    retry = retries,
                    max_retries = policy.max_retries,
                    wait_ms = wait.as_millis() as u64,
                    "retry: rate limited (429), backing off"
                );
                tokio::time::sleep(wait).await;
            }
            Err(err) => return Err(err),
        }
    }
}
