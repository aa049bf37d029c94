//! Core configuration types for scrape jobs
//!
//! A `ScraperConfig` describes one source: where to navigate, which CSS
//! selectors delimit records and their fields, which engine to try first,
//! and optional business tags used as normalization defaults.

use serde::{Deserialize, Serialize};

use crate::scrape_engine::ScrapeError;

/// Which crawl engine implementation to run first for a scraper.
///
/// The other variant is always the fallback; there is no tertiary engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnginePreference {
    /// CDP-driven Chrome session (handles client-rendered pages)
    #[default]
    Browser,
    /// Plain HTTP fetch with static DOM queries
    Static,
}

impl EnginePreference {
    /// The engine used when the preferred one fails unrecoverably
    #[must_use]
    pub fn fallback(self) -> Self {
        match self {
            Self::Browser => Self::Static,
            Self::Static => Self::Browser,
        }
    }
}

/// One named child field resolved inside each container match
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSelector {
    /// Canonical field name the value feeds into (e.g. "email", "website")
    pub name: String,
    /// CSS selector evaluated relative to the container element
    pub selector: String,
}

/// The CSS selector set driving extraction for one source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorSet {
    /// Main container selector; one `RawRecord` per match
    pub container: String,
    /// Child field selectors resolved inside each container
    #[serde(default)]
    pub fields: Vec<FieldSelector>,
    /// Selector for the "next page" link
    #[serde(default)]
    pub next_page: Option<String>,
    /// Selector for expandable-dropdown triggers clicked before extraction
    #[serde(default)]
    pub dropdown_trigger: Option<String>,
}

/// Main configuration for one scrape job
///
/// Immutable for the duration of a crawl; owned by the caller. Built via
/// [`ScraperConfig::builder`] or deserialized from the job payload, in which
/// case [`ScraperConfig::validate`] must be called before execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScraperConfig {
    pub(crate) id: String,
    pub(crate) source_url: String,
    pub(crate) selectors: SelectorSet,
    #[serde(default)]
    pub(crate) engine: EnginePreference,
    #[serde(default)]
    pub(crate) country: Option<String>,
    #[serde(default)]
    pub(crate) sector: Option<String>,
}

impl ScraperConfig {
    /// Scraper identifier, used to key status event streams
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// URL the crawl starts from
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Selector set driving extraction
    #[must_use]
    pub fn selectors(&self) -> &SelectorSet {
        &self.selectors
    }

    /// Preferred engine for the first crawl attempt
    #[must_use]
    pub fn engine(&self) -> EnginePreference {
        self.engine
    }

    /// Country tag supplied by the caller, if any
    #[must_use]
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Sector tag supplied by the caller, used as a normalization default
    #[must_use]
    pub fn sector(&self) -> Option<&str> {
        self.sector.as_deref()
    }

    /// Check the two fields no crawl can run without.
    ///
    /// Raised before any session is opened; a config error is never retried
    /// and never triggers engine fallback.
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.source_url.trim().is_empty() {
            return Err(ScrapeError::Config("source URL is required".into()));
        }
        if self.selectors.container.trim().is_empty() {
            return Err(ScrapeError::Config(
                "main container selector is required".into(),
            ));
        }
        Ok(())
    }
}
