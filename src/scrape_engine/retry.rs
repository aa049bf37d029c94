//! Classification-aware retry with exponential backoff
//!
//! Wraps a fallible navigation attempt. Only errors on the transient-network
//! allow-list are retried; everything else propagates immediately. The shared
//! [`NavigationThrottle`] is applied before every attempt, first included, so
//! retries never burst past the pacing contract.

use std::time::Duration;

use log::{debug, warn};
use rand::Rng;

use super::rate_limiter::NavigationThrottle;
use super::types::ScrapeError;

/// Retry configuration value; not mutated during use
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: u32,
    /// Base delay for exponential backoff
    pub base_delay: Duration,
    /// Cap applied to the computed delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Whether an error is eligible for retry.
    ///
    /// Typed predicate over the network-kind allow-list; no message inspection.
    #[must_use]
    pub fn is_retryable(&self, error: &ScrapeError) -> bool {
        error.network_kind().is_some()
    }

    /// Backoff delay before retry number `attempt` (1-based count of failures
    /// so far): `min(base × 2^(attempt-1) + jitter, max)`.
    ///
    /// Jitter is uniform in `[0, base)`, which keeps successive delays
    /// non-decreasing: the doubling always outgrows the jitter range.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16));
        let jitter_cap = self.base_delay.as_millis().max(1) as u64;
        let jitter = Duration::from_millis(rand::rng().random_range(0..jitter_cap));
        (exponential + jitter).min(self.max_delay)
    }
}

/// Run `operation` under the retry policy, throttling before every attempt.
///
/// Invokes the operation up to `max_attempts` times for retryable errors,
/// sleeping the backoff delay between attempts. Non-retryable errors and the
/// last retryable error propagate unchanged.
pub async fn run_with_retry<T, F>(
    throttle: &NavigationThrottle,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, ScrapeError>
where
    F: AsyncFnMut() -> Result<T, ScrapeError>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        throttle.throttle().await;

        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if !policy.is_retryable(&error) => {
                debug!("Non-retryable error on attempt {attempt}: {error}");
                return Err(error);
            }
            Err(error) if attempt >= max_attempts => {
                warn!("Giving up after {attempt} attempts: {error}");
                return Err(error);
            }
            Err(error) => {
                let delay = policy.backoff_delay(attempt);
                warn!("Attempt {attempt}/{max_attempts} failed ({error}), retrying in {delay:?}");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape_engine::types::NetworkErrorKind;

    #[test]
    fn retryable_is_the_network_allow_list() {
        let policy = RetryPolicy::default();
        for kind in [
            NetworkErrorKind::ConnectionReset,
            NetworkErrorKind::ConnectionRefused,
            NetworkErrorKind::Timeout,
            NetworkErrorKind::TransportClosed,
        ] {
            assert!(policy.is_retryable(&ScrapeError::network(kind, "transient")));
        }
        assert!(!policy.is_retryable(&ScrapeError::Config("bad".into())));
        assert!(!policy.is_retryable(&ScrapeError::Browser("crash".into())));
        assert!(!policy.is_retryable(&ScrapeError::Extraction("selector".into())));
    }

    #[test]
    fn backoff_is_non_decreasing_and_capped() {
        let policy = RetryPolicy {
            max_attempts: 6,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        };
        let mut previous = Duration::ZERO;
        for attempt in 1..=6 {
            let delay = policy.backoff_delay(attempt);
            assert!(delay >= previous, "delay shrank at attempt {attempt}");
            assert!(delay <= policy.max_delay);
            previous = delay;
        }
    }
}
