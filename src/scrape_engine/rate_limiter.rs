//! Navigation pacing across concurrent crawls
//!
//! Anti-scraping defenses trigger on bursts, not volume, so outbound
//! navigation attempts are spaced by a shared minimum interval. The throttle
//! is an explicit value constructed by the orchestrator and shared via `Arc`
//! across its crawls; its lifetime is the orchestrator's, not the process's.
//!
//! Holding the mutex across the sleep serializes waiters, so the spacing
//! contract holds between *returns*: each `throttle()` call returns at least
//! `min_spacing` after the previous one did, regardless of which crawl made it.

use std::time::{Duration, Instant};

use log::trace;
use tokio::sync::Mutex;

/// Enforces a minimum spacing between outbound navigation attempts
#[derive(Debug)]
pub struct NavigationThrottle {
    min_spacing: Duration,
    last_attempt: Mutex<Option<Instant>>,
}

impl NavigationThrottle {
    /// Create a throttle with the given minimum spacing
    #[must_use]
    pub fn new(min_spacing: Duration) -> Self {
        Self {
            min_spacing,
            last_attempt: Mutex::new(None),
        }
    }

    /// Configured minimum spacing between attempts
    #[must_use]
    pub fn min_spacing(&self) -> Duration {
        self.min_spacing
    }

    /// Suspend until at least `min_spacing` has elapsed since the previous
    /// call returned. Never fails; the only side effect is the wait.
    pub async fn throttle(&self) {
        let mut last = self.last_attempt.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_spacing {
                let wait = self.min_spacing - elapsed;
                trace!("Navigation throttle sleeping {wait:?}");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}
