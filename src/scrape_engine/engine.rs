//! Crawl engine contract and the crawl-loop state machine
//!
//! Both engine implementations (CDP browser and static HTTP) expose the same
//! capability interface; the loop driver owns the state machine and never
//! knows which variant it is driving. States:
//!
//! `NAVIGATE → EXPAND_DROPDOWNS → EXTRACT → PAGINATE`, looping back to
//! `NAVIGATE` or ending at `TERMINAL`.
//!
//! Navigation is wrapped in the retry controller; an empty container match is
//! a soft stop (the crawl completes with whatever was accumulated); the page
//! ceiling guarantees termination even when a "next" link cycles back onto
//! the current page.

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::config::{ScraperConfig, SelectorSet};
use crate::scrape_events::{StatusBroadcaster, StatusEvent};

use super::rate_limiter::NavigationThrottle;
use super::retry::{RetryPolicy, run_with_retry};
use super::types::{EngineKind, RawRecord, ScrapeError};

/// Capability interface one crawl engine implementation provides.
///
/// An engine owns exactly one live session (browser page or HTTP client) and
/// is driven by [`run_crawl`]. `close` must be safe to call on every exit
/// path, including after a failed operation.
#[async_trait]
pub trait CrawlEngine: Send {
    /// Which implementation this is, for logs and fallback reporting
    fn kind(&self) -> EngineKind;

    /// Load `url` into the session
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError>;

    /// Click every element matching `selector`; returns the number of
    /// successful clicks. Individual click failures are logged by the
    /// engine and never abort the crawl.
    async fn expand_dropdowns(&mut self, selector: &str) -> usize;

    /// Build one [`RawRecord`] per container match on the current page
    async fn extract(&mut self, selectors: &SelectorSet) -> Result<Vec<RawRecord>, ScrapeError>;

    /// Resolve the absolute URL behind the pagination selector, if present
    async fn next_page_url(&mut self, selector: &str) -> Result<Option<String>, ScrapeError>;

    /// Release the session. Idempotent.
    async fn close(&mut self) -> Result<(), ScrapeError>;
}

/// Shared collaborators the crawl loop runs against
pub struct CrawlContext<'a> {
    pub config: &'a ScraperConfig,
    pub throttle: &'a NavigationThrottle,
    pub policy: &'a RetryPolicy,
    pub broadcaster: &'a StatusBroadcaster,
    /// Hard ceiling on pages visited in this crawl
    pub max_pages: u32,
}

/// Result of one crawl reaching `TERMINAL`
#[derive(Debug)]
pub struct CrawlRun {
    pub records: Vec<RawRecord>,
    /// Last page number visited (1-based)
    pub pages_visited: u32,
}

/// Drive `engine` through the crawl state machine to `TERMINAL`.
///
/// Emits a `running` status event at every state transition. Errors from
/// `NAVIGATE` (after retry exhaustion) and `EXTRACT` propagate to the caller,
/// which decides whether a fallback engine gets a turn. The caller is
/// responsible for closing the engine on both exit paths.
pub async fn run_crawl(
    engine: &mut dyn CrawlEngine,
    ctx: &CrawlContext<'_>,
) -> Result<CrawlRun, ScrapeError> {
    let scraper_id = ctx.config.id();
    let selectors = ctx.config.selectors();
    let mut current_url = ctx.config.source_url().to_string();
    let mut page: u32 = 1;
    let mut records: Vec<RawRecord> = Vec::new();

    loop {
        // NAVIGATE
        ctx.broadcaster.publish(StatusEvent::running(
            scraper_id,
            page,
            records.len(),
            format!("Navigation vers la page {page}"),
        ));
        info!(
            "[{scraper_id}] navigating with {} engine (page {page}): {current_url}",
            engine.kind()
        );
        run_with_retry(ctx.throttle, ctx.policy, async || {
            engine.navigate(&current_url).await
        })
        .await?;

        // EXPAND_DROPDOWNS
        if let Some(trigger) = &selectors.dropdown_trigger {
            ctx.broadcaster.publish(StatusEvent::running(
                scraper_id,
                page,
                records.len(),
                "Ouverture des menus déroulants".to_string(),
            ));
            let clicked = engine.expand_dropdowns(trigger).await;
            debug!("[{scraper_id}] expanded {clicked} dropdown elements on page {page}");
        }

        // EXTRACT
        let page_records = engine.extract(selectors).await?;
        if page_records.is_empty() {
            // Soft stop: absence of content is a completed crawl, not an error
            info!(
                "[{scraper_id}] container selector matched nothing on page {page}, \
                 stopping with {} records",
                records.len()
            );
            ctx.broadcaster.publish(StatusEvent::running(
                scraper_id,
                page,
                records.len(),
                format!("Aucun résultat sur la page {page}, arrêt de l'extraction"),
            ));
            break;
        }
        records.extend(page_records);
        ctx.broadcaster.publish(StatusEvent::running(
            scraper_id,
            page,
            records.len(),
            format!("{} éléments extraits", records.len()),
        ));

        // PAGINATE
        let Some(next_selector) = &selectors.next_page else {
            debug!("[{scraper_id}] no pagination selector configured, crawl complete");
            break;
        };
        if page >= ctx.max_pages {
            warn!("[{scraper_id}] reached page ceiling ({}), stopping", ctx.max_pages);
            break;
        }
        match engine.next_page_url(next_selector).await? {
            Some(next_url) => {
                debug!("[{scraper_id}] next page resolved: {next_url}");
                current_url = next_url;
                page += 1;
            }
            None => {
                debug!("[{scraper_id}] no next-page link on page {page}, crawl complete");
                break;
            }
        }
    }

    Ok(CrawlRun {
        records,
        pages_visited: page,
    })
}
