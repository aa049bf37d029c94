//! Extraction engine module
//!
//! Owns the crawl control loop and everything it runs on: the engine
//! contract with its two implementations, retry and rate-limit wrappers,
//! the session concurrency gate, and the fallback orchestrator.

// Sub-modules
pub mod browser_engine;
pub mod engine;
pub mod orchestrator;
pub mod rate_limiter;
pub mod retry;
pub mod session_gate;
pub mod static_engine;
pub mod types;

// Re-exports for public API
pub use browser_engine::BrowserEngine;
pub use engine::{CrawlContext, CrawlEngine, CrawlRun, run_crawl};
pub use orchestrator::{DefaultEngineFactory, EngineFactory, ScrapeOrchestrator};
pub use rate_limiter::NavigationThrottle;
pub use retry::{RetryPolicy, run_with_retry};
pub use session_gate::{SessionGate, SessionPermit};
pub use static_engine::StaticEngine;
pub use types::{
    EngineKind, NetworkErrorKind, RawRecord, ScrapeError, classify_cdp_error, classify_http_error,
};
