//! Scrape status event system
//!
//! Ordered per-scraper progress streams published by the crawl loop and
//! consumed by external observers (realtime push transports, job monitors).

pub mod broadcaster;
pub mod types;

pub use broadcaster::{StatusBroadcaster, StatusSubscription};
pub use types::{CrawlStatus, Severity, StatusEvent, StatusMessage, StatusUpdate};
