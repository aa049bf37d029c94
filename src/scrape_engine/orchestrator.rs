//! Scrape orchestration: session gating, engine selection, and fallback
//!
//! Runs the preferred engine's crawl to `TERMINAL`. Any engine-level failure
//! (retry exhaustion, browser fault, extraction fault) gets exactly one
//! fallback: the failed session is closed best-effort, a warning names the
//! failure, and the full crawl restarts from page 1 on the other engine with
//! the identical config — accumulated partial results are discarded. Failure
//! of the second engine is terminal and reported through the broadcaster,
//! not the return value: callers only see an `Err` for configuration errors.

use std::sync::Arc;

use async_trait::async_trait;
use log::{error, info, warn};

use crate::config::{EnginePreference, EngineSettings, ScraperConfig};
use crate::normalizer::{CanonicalRecord, Normalizer};
use crate::scrape_events::{StatusBroadcaster, StatusEvent};

use super::browser_engine::BrowserEngine;
use super::engine::{CrawlContext, CrawlEngine, CrawlRun, run_crawl};
use super::rate_limiter::NavigationThrottle;
use super::retry::RetryPolicy;
use super::session_gate::SessionGate;
use super::static_engine::StaticEngine;
use super::types::ScrapeError;

/// Builds crawl engines on demand.
///
/// The orchestrator depends only on this seam and the [`CrawlEngine`]
/// contract; which concrete variant backs a preference is configuration.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn build(
        &self,
        kind: EnginePreference,
        settings: &EngineSettings,
    ) -> Result<Box<dyn CrawlEngine>, ScrapeError>;
}

/// Production factory: Chrome session for `Browser`, HTTP client for `Static`
pub struct DefaultEngineFactory;

#[async_trait]
impl EngineFactory for DefaultEngineFactory {
    async fn build(
        &self,
        kind: EnginePreference,
        settings: &EngineSettings,
    ) -> Result<Box<dyn CrawlEngine>, ScrapeError> {
        match kind {
            EnginePreference::Browser => Ok(Box::new(BrowserEngine::launch(settings).await?)),
            EnginePreference::Static => Ok(Box::new(StaticEngine::new(settings)?)),
        }
    }
}

/// Drives scrape jobs end to end under concurrency and rate limits
pub struct ScrapeOrchestrator {
    settings: EngineSettings,
    policy: RetryPolicy,
    throttle: Arc<NavigationThrottle>,
    gate: SessionGate,
    broadcaster: Arc<StatusBroadcaster>,
    factory: Box<dyn EngineFactory>,
}

impl ScrapeOrchestrator {
    /// Build an orchestrator with production engines
    #[must_use]
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_factory(settings, Box::new(DefaultEngineFactory))
    }

    /// Build an orchestrator with a custom engine factory
    #[must_use]
    pub fn with_factory(settings: EngineSettings, factory: Box<dyn EngineFactory>) -> Self {
        let policy = RetryPolicy {
            max_attempts: settings.max_retry_attempts,
            base_delay: settings.retry_base_delay,
            max_delay: settings.retry_max_delay,
        };
        let throttle = Arc::new(NavigationThrottle::new(settings.min_request_spacing));
        let gate = SessionGate::new(settings.max_sessions);
        Self {
            settings,
            policy,
            throttle,
            gate,
            broadcaster: Arc::new(StatusBroadcaster::default()),
            factory,
        }
    }

    /// Status stream registry; subscribe before or during a crawl
    #[must_use]
    pub fn broadcaster(&self) -> Arc<StatusBroadcaster> {
        Arc::clone(&self.broadcaster)
    }

    /// Run one scrape job to completion and return its canonical records.
    ///
    /// `Err` is reserved for configuration errors raised before any session
    /// opens. Every other failure surfaces through the status stream; the
    /// caller then receives an empty record set.
    pub async fn execute(
        &self,
        config: &ScraperConfig,
    ) -> Result<Vec<CanonicalRecord>, ScrapeError> {
        config.validate()?;

        let scraper_id = config.id();
        let _permit = self.gate.acquire().await;
        self.broadcaster.publish(StatusEvent::initializing(
            scraper_id,
            "Initialisation de l'extraction",
        ));

        let preferred = config.engine();
        match self.run_engine(config, preferred).await {
            Ok(run) => Ok(self.complete(config, &run)),
            Err(primary_error) => {
                let fallback = preferred.fallback();
                warn!(
                    "[{scraper_id}] {preferred:?} engine failed ({primary_error}), \
                     restarting on {fallback:?} engine"
                );
                self.broadcaster.publish(StatusEvent::warning(
                    scraper_id,
                    0,
                    0,
                    format!(
                        "Échec du moteur principal ({primary_error}), reprise avec le moteur de secours"
                    ),
                ));

                match self.run_engine(config, fallback).await {
                    Ok(run) => Ok(self.complete(config, &run)),
                    Err(secondary_error) => {
                        error!(
                            "[{scraper_id}] fallback {fallback:?} engine also failed: \
                             {secondary_error}"
                        );
                        self.broadcaster.publish(StatusEvent::error(
                            scraper_id,
                            0,
                            0,
                            format!("Échec de l'extraction : {secondary_error}"),
                        ));
                        self.broadcaster.finish(scraper_id);
                        Ok(Vec::new())
                    }
                }
            }
        }
    }

    /// Build one engine, drive its crawl, and always close the session
    async fn run_engine(
        &self,
        config: &ScraperConfig,
        kind: EnginePreference,
    ) -> Result<CrawlRun, ScrapeError> {
        let mut engine = self.factory.build(kind, &self.settings).await?;

        let ctx = CrawlContext {
            config,
            throttle: &self.throttle,
            policy: &self.policy,
            broadcaster: &self.broadcaster,
            max_pages: self.settings.max_pages,
        };
        let result = run_crawl(engine.as_mut(), &ctx).await;

        // Session cleanup runs on every exit path; close failures never mask
        // the crawl result.
        if let Err(close_error) = engine.close().await {
            warn!("[{}] failed to close {kind:?} session: {close_error}", config.id());
        }

        result
    }

    fn complete(&self, config: &ScraperConfig, run: &CrawlRun) -> Vec<CanonicalRecord> {
        let normalizer = Normalizer::from_config(config);
        let records = normalizer.normalize_all(&run.records);

        info!(
            "[{}] crawl completed: {} records over {} page(s)",
            config.id(),
            records.len(),
            run.pages_visited
        );
        self.broadcaster.publish(StatusEvent::completed(
            config.id(),
            run.pages_visited,
            records.len(),
            format!("Extraction terminée : {} fiches", records.len()),
        ));
        self.broadcaster.finish(config.id());

        records
    }
}
