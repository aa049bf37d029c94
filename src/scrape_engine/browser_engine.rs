//! Primary crawl engine backed by a CDP-driven Chrome session
//!
//! Extraction runs inside the page: one injected script walks the container
//! matches and resolves child-field values with the link-attribute rules
//! (`mailto:`/`tel:` prefix stripping, href absolutization), so client-rendered
//! listings are captured exactly as a visitor sees them.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use log::{debug, warn};
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::browser_setup::launch_browser;
use crate::config::{EngineSettings, SelectorSet};

use super::engine::CrawlEngine;
use super::types::{EngineKind, NetworkErrorKind, RawRecord, ScrapeError, classify_cdp_error};

/// Settle delay after dropdown expansion, lets revealed content render
const POST_EXPAND_DELAY: Duration = Duration::from_millis(300);

/// Row shape produced by the in-page extraction script
#[derive(Debug, Deserialize)]
struct ExtractedRow {
    text: String,
    html: String,
    metadata: std::collections::BTreeMap<String, String>,
}

/// Chrome-backed implementation of [`CrawlEngine`]
pub struct BrowserEngine {
    browser: Browser,
    handler_task: Option<JoinHandle<()>>,
    user_data_dir: PathBuf,
    page: Option<Page>,
    navigation_timeout: Duration,
    closed: bool,
}

impl BrowserEngine {
    /// Launch a fresh Chrome session.
    ///
    /// Launch failures are browser-level faults (not retryable); the caller
    /// treats them as an engine failure eligible for fallback.
    pub async fn launch(settings: &EngineSettings) -> Result<Self, ScrapeError> {
        let (browser, handler_task, user_data_dir) =
            launch_browser(settings.headless, settings.launch_timeout)
                .await
                .map_err(|e| ScrapeError::Browser(format!("{e:#}")))?;

        Ok(Self {
            browser,
            handler_task: Some(handler_task),
            user_data_dir,
            page: None,
            navigation_timeout: settings.navigation_timeout,
            closed: false,
        })
    }

    /// The single page this session crawls on, created on first use
    async fn page(&mut self) -> Result<&Page, ScrapeError> {
        if self.page.is_none() {
            let page = self
                .browser
                .new_page("about:blank")
                .await
                .map_err(|e| classify_cdp_error(&e))?;
            self.page = Some(page);
        }
        self.page
            .as_ref()
            .ok_or_else(|| ScrapeError::Browser("page handle unavailable".into()))
    }

    /// Evaluate a script and deserialize its JSON result
    async fn evaluate_json<T: serde::de::DeserializeOwned>(
        &mut self,
        script: String,
    ) -> Result<T, ScrapeError> {
        let page = self.page().await?;
        let result = page
            .evaluate(script.as_str())
            .await
            .map_err(|e| classify_cdp_error(&e))?;
        let value: serde_json::Value = result
            .into_value()
            .map_err(|e| ScrapeError::Extraction(format!("script result not deserializable: {e}")))?;
        serde_json::from_value(value)
            .map_err(|e| ScrapeError::Extraction(format!("unexpected script result shape: {e}")))
    }
}

#[async_trait]
impl CrawlEngine for BrowserEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Browser
    }

    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        let timeout = self.navigation_timeout;
        let page = self.page().await?.clone();
        let target = url.to_string();

        let navigation = async {
            page.goto(target.as_str())
                .await
                .map_err(|e| classify_cdp_error(&e))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| classify_cdp_error(&e))?;
            Ok(())
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(result) => result,
            Err(_) => Err(ScrapeError::network(
                NetworkErrorKind::Timeout,
                format!("navigation to {target} timed out after {timeout:?}"),
            )),
        }
    }

    async fn expand_dropdowns(&mut self, selector: &str) -> usize {
        let script = format!(
            r"(() => {{
                const elements = document.querySelectorAll({selector});
                let clicked = 0;
                let failed = 0;
                for (const el of elements) {{
                    try {{ el.click(); clicked++; }} catch (e) {{ failed++; }}
                }}
                return {{ clicked, failed }};
            }})()",
            selector = js_string(selector)
        );

        #[derive(Deserialize)]
        struct ClickReport {
            clicked: usize,
            failed: usize,
        }

        match self.evaluate_json::<ClickReport>(script).await {
            Ok(report) => {
                if report.failed > 0 {
                    warn!(
                        "{} dropdown trigger(s) failed to click ({} succeeded)",
                        report.failed, report.clicked
                    );
                }
                if report.clicked > 0 {
                    tokio::time::sleep(POST_EXPAND_DELAY).await;
                }
                report.clicked
            }
            Err(e) => {
                warn!("Dropdown expansion failed, continuing without it: {e}");
                0
            }
        }
    }

    async fn extract(&mut self, selectors: &SelectorSet) -> Result<Vec<RawRecord>, ScrapeError> {
        let fields_json = serde_json::to_string(
            &selectors
                .fields
                .iter()
                .map(|f| serde_json::json!({ "name": f.name, "selector": f.selector }))
                .collect::<Vec<_>>(),
        )
        .map_err(|e| ScrapeError::Extraction(format!("field selector encoding failed: {e}")))?;

        let script = format!(
            r"((container, fields) => {{
                const records = [];
                for (const el of document.querySelectorAll(container)) {{
                    const metadata = {{}};
                    for (const field of fields) {{
                        let child;
                        try {{ child = el.querySelector(field.selector); }} catch (e) {{ continue; }}
                        if (!child) continue;
                        let value = '';
                        const href = child.getAttribute('href');
                        if (href && href.startsWith('mailto:')) {{
                            value = href.slice(7).split('?')[0];
                        }} else if (href && href.startsWith('tel:')) {{
                            value = href.slice(4);
                        }} else if (href && field.name === 'website') {{
                            try {{ value = new URL(href, document.baseURI).href; }} catch (e) {{ value = href; }}
                        }} else {{
                            value = (child.innerText || child.textContent || '').trim();
                        }}
                        if (value) metadata[field.name] = value;
                    }}
                    records.push({{
                        text: el.innerText || el.textContent || '',
                        html: el.innerHTML || '',
                        metadata,
                    }});
                }}
                return records;
            }})({container}, {fields})",
            container = js_string(&selectors.container),
            fields = fields_json
        );

        let rows: Vec<ExtractedRow> = self.evaluate_json(script).await?;
        debug!("Extracted {} container match(es)", rows.len());

        Ok(rows
            .into_iter()
            .map(|row| RawRecord {
                text: row.text,
                html: row.html,
                metadata: row.metadata,
            })
            .collect())
    }

    async fn next_page_url(&mut self, selector: &str) -> Result<Option<String>, ScrapeError> {
        let script = format!(
            r"((selector) => {{
                let el;
                try {{ el = document.querySelector(selector); }} catch (e) {{ return null; }}
                if (!el) return null;
                const href = el.getAttribute('href');
                if (!href) return null;
                try {{ return new URL(href, document.baseURI).href; }} catch (e) {{ return null; }}
            }})({selector})",
            selector = js_string(selector)
        );

        self.evaluate_json(script).await
    }

    async fn close(&mut self) -> Result<(), ScrapeError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.page = None;

        // Close the browser before tearing down its CDP handler; the reverse
        // order strands Chrome without a transport.
        let close_result = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!("Browser process did not exit cleanly: {e}");
        }

        if let Some(handler) = self.handler_task.take() {
            handler.abort();
            if let Err(e) = handler.await
                && !e.is_cancelled()
            {
                warn!("Browser handler task failed during shutdown: {e}");
            }
        }

        let _ = std::fs::remove_dir_all(&self.user_data_dir);

        close_result
            .map(|_| ())
            .map_err(|e| classify_cdp_error(&e))
    }
}

impl Drop for BrowserEngine {
    fn drop(&mut self) {
        // Last-resort teardown when close() was never reached
        if let Some(handler) = self.handler_task.take() {
            handler.abort();
        }
        if !self.closed {
            let _ = std::fs::remove_dir_all(&self.user_data_dir);
        }
    }
}

/// Encode a CSS selector as a JS string literal
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
