pub mod browser_setup;
pub mod config;
pub mod normalizer;
pub mod scrape_engine;
pub mod scrape_events;

pub use browser_setup::{find_browser_executable, launch_browser};
pub use config::{
    EnginePreference, EngineSettings, FieldSelector, ScraperConfig, ScraperConfigBuilder,
    SelectorSet,
};
pub use normalizer::{CanonicalRecord, NO_DATA, Normalizer};
pub use scrape_engine::{
    BrowserEngine, CrawlEngine, EngineKind, NavigationThrottle, RawRecord, RetryPolicy,
    ScrapeError, ScrapeOrchestrator, SessionGate, StaticEngine, run_with_retry,
};
pub use scrape_events::{
    CrawlStatus, Severity, StatusBroadcaster, StatusEvent, StatusSubscription, StatusUpdate,
};

/// Run one scrape job with a fresh orchestrator configured from the
/// environment. Long-lived callers should hold their own
/// [`ScrapeOrchestrator`] so the session gate and navigation throttle span
/// jobs.
pub async fn execute(config: &ScraperConfig) -> Result<Vec<CanonicalRecord>, ScrapeError> {
    let orchestrator = ScrapeOrchestrator::new(EngineSettings::from_env());
    orchestrator.execute(config).await
}
