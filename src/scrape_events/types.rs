//! Status event definitions for the scrape progress stream
//!
//! Events are append-only per scraper id, consumed by zero or more external
//! observers, and retained only while a subscription is open. The wire types
//! at the bottom are what a status transport collaborator serializes when
//! forwarding events to a remote channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle stage of a crawl as seen by observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    Initializing,
    Running,
    Completed,
    Error,
}

/// Display severity of a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// One progress event for one scraper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub scraper_id: String,
    pub status: CrawlStatus,
    pub current_page: u32,
    pub total_items: usize,
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

impl StatusEvent {
    /// Whether this event ends the stream for its scraper id
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, CrawlStatus::Completed | CrawlStatus::Error)
    }
}

/// Helper constructors for the events the crawl loop emits
impl StatusEvent {
    #[must_use]
    pub fn initializing(scraper_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            scraper_id: scraper_id.into(),
            status: CrawlStatus::Initializing,
            current_page: 0,
            total_items: 0,
            message: message.into(),
            severity: Severity::Info,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn running(
        scraper_id: impl Into<String>,
        current_page: u32,
        total_items: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            scraper_id: scraper_id.into(),
            status: CrawlStatus::Running,
            current_page,
            total_items,
            message: message.into(),
            severity: Severity::Info,
            timestamp: Utc::now(),
        }
    }

    /// A `running` event flagged as a warning (dropdown click failures,
    /// engine fallback)
    #[must_use]
    pub fn warning(
        scraper_id: impl Into<String>,
        current_page: u32,
        total_items: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            scraper_id: scraper_id.into(),
            status: CrawlStatus::Running,
            current_page,
            total_items,
            message: message.into(),
            severity: Severity::Warning,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn completed(
        scraper_id: impl Into<String>,
        current_page: u32,
        total_items: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            scraper_id: scraper_id.into(),
            status: CrawlStatus::Completed,
            current_page,
            total_items,
            message: message.into(),
            severity: Severity::Success,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn error(
        scraper_id: impl Into<String>,
        current_page: u32,
        total_items: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            scraper_id: scraper_id.into(),
            status: CrawlStatus::Error,
            current_page,
            total_items,
            message: message.into(),
            severity: Severity::Error,
            timestamp: Utc::now(),
        }
    }
}

/// One forwarded message inside a [`StatusUpdate`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: Severity,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Wire shape for an event forwarded to a remote status channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: CrawlStatus,
    pub current_page: u32,
    pub total_items: usize,
    pub messages: Vec<StatusMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&StatusEvent> for StatusUpdate {
    fn from(event: &StatusEvent) -> Self {
        let error = match event.severity {
            Severity::Error => Some(event.message.clone()),
            _ => None,
        };
        Self {
            status: event.status,
            current_page: event.current_page,
            total_items: event.total_items,
            messages: vec![StatusMessage {
                id: Uuid::new_v4(),
                kind: event.severity,
                text: event.message.clone(),
                timestamp: event.timestamp,
            }],
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_detection() {
        assert!(StatusEvent::completed("s", 1, 3, "done").is_terminal());
        assert!(StatusEvent::error("s", 1, 0, "boom").is_terminal());
        assert!(!StatusEvent::running("s", 1, 0, "page 1").is_terminal());
        assert!(!StatusEvent::warning("s", 1, 0, "fallback").is_terminal());
    }

    #[test]
    fn wire_shape_uses_camel_case_and_type_alias() {
        let event = StatusEvent::error("s", 2, 0, "secondary engine failed");
        let update = StatusUpdate::from(&event);
        let json = serde_json::to_value(&update).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["currentPage"], 2);
        assert_eq!(json["messages"][0]["type"], "error");
        assert_eq!(json["error"], "secondary engine failed");
    }

    #[test]
    fn non_error_updates_omit_error_field() {
        let event = StatusEvent::running("s", 1, 5, "extracting");
        let json = serde_json::to_value(StatusUpdate::from(&event)).unwrap();
        assert!(json.get("error").is_none());
    }
}
