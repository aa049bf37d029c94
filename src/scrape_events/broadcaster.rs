//! Per-scraper publish/subscribe channel for status events
//!
//! One broadcast channel per scraper id, created lazily on first publish or
//! subscribe. Events for a single crawl are observed in publish order; no
//! ordering exists across scraper ids. The most recent event is buffered per
//! id so a late subscriber immediately sees where the crawl stands
//! (at-least-once for that event, exactly-once is not offered).
//!
//! The channel holds no persistence contract: once the terminal event is
//! published and the registry entry removed, history is gone.

use dashmap::DashMap;
use log::debug;
use tokio::sync::broadcast;

use super::types::StatusEvent;

/// Default per-scraper channel capacity
const DEFAULT_CAPACITY: usize = 256;

struct Channel {
    sender: broadcast::Sender<StatusEvent>,
    latest: Option<StatusEvent>,
}

/// Handle returned by [`StatusBroadcaster::subscribe`]
pub struct StatusSubscription {
    /// Most recent event published before this subscription, if any
    pub latest: Option<StatusEvent>,
    /// Live receiver for subsequent events; dropping it unsubscribes
    pub receiver: broadcast::Receiver<StatusEvent>,
}

/// Registry of per-scraper status streams
pub struct StatusBroadcaster {
    channels: DashMap<String, Channel>,
    capacity: usize,
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl StatusBroadcaster {
    /// Create a broadcaster whose per-scraper channels buffer `capacity` events
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append an event to its scraper's ordered stream.
    ///
    /// Returns the number of live subscribers that received it. Zero is not
    /// an error: the crawl loop never depends on a transport being present.
    pub fn publish(&self, event: StatusEvent) -> usize {
        let mut entry = self
            .channels
            .entry(event.scraper_id.clone())
            .or_insert_with(|| Channel {
                sender: broadcast::channel(self.capacity).0,
                latest: None,
            });

        entry.latest = Some(event.clone());
        match entry.sender.send(event) {
            Ok(count) => count,
            Err(_) => {
                debug!("Published status event with no active subscribers");
                0
            }
        }
    }

    /// Subscribe to a scraper's stream.
    ///
    /// The returned subscription carries the most recent buffered event (if
    /// the crawl already emitted one) plus a receiver for everything after.
    #[must_use]
    pub fn subscribe(&self, scraper_id: &str) -> StatusSubscription {
        let entry = self
            .channels
            .entry(scraper_id.to_string())
            .or_insert_with(|| Channel {
                sender: broadcast::channel(self.capacity).0,
                latest: None,
            });

        StatusSubscription {
            latest: entry.latest.clone(),
            receiver: entry.sender.subscribe(),
        }
    }

    /// Number of live subscribers for a scraper id
    #[must_use]
    pub fn subscriber_count(&self, scraper_id: &str) -> usize {
        self.channels
            .get(scraper_id)
            .map(|c| c.sender.receiver_count())
            .unwrap_or(0)
    }

    /// Drop the stream for a finished crawl.
    ///
    /// Called after the terminal event is published. Receivers already
    /// subscribed keep the underlying channel alive until they drain it;
    /// new subscribers after this point start from an empty stream.
    pub fn finish(&self, scraper_id: &str) {
        self.channels.remove(scraper_id);
    }
}
