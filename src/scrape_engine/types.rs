//! Core types for extraction crawls
//!
//! Error taxonomy, raw extraction records, and engine identity. Retryability
//! decisions are made on typed [`NetworkErrorKind`] values; mapping foreign
//! error types (CDP, HTTP client) into the taxonomy happens here at the edge
//! so the retry controller never inspects message strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which engine implementation produced or failed a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// CDP-driven Chrome session
    Browser,
    /// Plain HTTP fetch with static DOM queries
    Static,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Browser => write!(f, "browser"),
            Self::Static => write!(f, "static"),
        }
    }
}

/// Transient network failure signatures eligible for retry.
///
/// A closed allow-list: anything not representable here is not retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    ConnectionReset,
    ConnectionRefused,
    Timeout,
    /// Underlying protocol/transport channel closed (CDP websocket, HTTP/2 stream)
    TransportClosed,
}

impl std::fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionReset => write!(f, "connection reset"),
            Self::ConnectionRefused => write!(f, "connection refused"),
            Self::Timeout => write!(f, "timeout"),
            Self::TransportClosed => write!(f, "transport closed"),
        }
    }
}

/// Error type for scrape operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScrapeError {
    /// Invalid scraper configuration; raised before any session opens
    #[error("configuration error: {0}")]
    Config(String),

    /// Transient network failure, candidate for retry
    #[error("network error ({kind}): {message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
    },

    /// Browser-level fault (launch, CDP command, page crash)
    #[error("browser error: {0}")]
    Browser(String),

    /// Content extraction fault (selector evaluation, DOM parsing)
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Anything else
    #[error("scrape error: {0}")]
    Other(String),
}

impl ScrapeError {
    /// Convenience constructor for network errors
    #[must_use]
    pub fn network(kind: NetworkErrorKind, message: impl Into<String>) -> Self {
        Self::Network {
            kind,
            message: message.into(),
        }
    }

    /// The network kind, when this is a network error
    #[must_use]
    pub fn network_kind(&self) -> Option<NetworkErrorKind> {
        match self {
            Self::Network { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Map a chromiumoxide error into the scrape taxonomy.
///
/// CDP surfaces both genuine network failures and browser faults through one
/// error type; the transient signatures are picked out here so retry logic
/// stays typed.
#[must_use]
pub fn classify_cdp_error(err: &chromiumoxide::error::CdpError) -> ScrapeError {
    use chromiumoxide::error::CdpError;

    match err {
        CdpError::Timeout => ScrapeError::network(NetworkErrorKind::Timeout, err.to_string()),
        CdpError::Ws(_) | CdpError::ChannelSendError(_) => {
            ScrapeError::network(NetworkErrorKind::TransportClosed, err.to_string())
        }
        CdpError::Io(io) => classify_io_error(io),
        other => {
            // Navigation-level net:: failures arrive as Chrome error text
            let msg = other.to_string();
            if msg.contains("net::ERR_CONNECTION_RESET") {
                ScrapeError::network(NetworkErrorKind::ConnectionReset, msg)
            } else if msg.contains("net::ERR_CONNECTION_REFUSED") {
                ScrapeError::network(NetworkErrorKind::ConnectionRefused, msg)
            } else if msg.contains("net::ERR_TIMED_OUT") || msg.contains("net::ERR_CONNECTION_TIMED_OUT") {
                ScrapeError::network(NetworkErrorKind::Timeout, msg)
            } else {
                ScrapeError::Browser(msg)
            }
        }
    }
}

/// Map an HTTP client error into the scrape taxonomy
#[must_use]
pub fn classify_http_error(err: &reqwest::Error) -> ScrapeError {
    if err.is_timeout() {
        return ScrapeError::network(NetworkErrorKind::Timeout, err.to_string());
    }
    if err.is_connect() {
        let msg = err.to_string();
        let kind = if msg.contains("refused") {
            NetworkErrorKind::ConnectionRefused
        } else {
            NetworkErrorKind::ConnectionReset
        };
        return ScrapeError::network(kind, msg);
    }
    if err.is_request() || err.is_body() {
        return ScrapeError::network(NetworkErrorKind::TransportClosed, err.to_string());
    }
    ScrapeError::Other(err.to_string())
}

fn classify_io_error(err: &std::io::Error) -> ScrapeError {
    use std::io::ErrorKind;
    let kind = match err.kind() {
        ErrorKind::ConnectionReset | ErrorKind::BrokenPipe => NetworkErrorKind::ConnectionReset,
        ErrorKind::ConnectionRefused => NetworkErrorKind::ConnectionRefused,
        ErrorKind::TimedOut | ErrorKind::WouldBlock => NetworkErrorKind::Timeout,
        ErrorKind::ConnectionAborted | ErrorKind::NotConnected | ErrorKind::UnexpectedEof => {
            NetworkErrorKind::TransportClosed
        }
        _ => return ScrapeError::Browser(err.to_string()),
    };
    ScrapeError::network(kind, err.to_string())
}

/// One record captured from a single container match on a page.
///
/// Immutable once captured; field values already carry the link-attribute
/// resolution rules (`mailto:`/`tel:` stripping, absolute hrefs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    /// Full visible text of the container
    pub text: String,
    /// Inner HTML of the container
    pub html: String,
    /// Field-name to resolved-value mapping from child selectors
    pub metadata: BTreeMap<String, String>,
}
