//! Secondary crawl engine: plain HTTP fetch with static DOM queries
//!
//! No JavaScript runs, so this engine only sees server-rendered markup — the
//! trade that makes it survive the failures the browser engine is prone to
//! (launch problems, CDP transport loss). Extraction semantics match the
//! browser engine: same selector set, same link-attribute resolution rules.
//!
//! The parsed DOM is rebuilt from the fetched body inside each extraction
//! call and never held across an await point (`scraper::Html` is not `Send`).

use async_trait::async_trait;
use log::debug;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::browser_setup::CHROME_USER_AGENT;
use crate::config::{EngineSettings, SelectorSet};

use super::engine::CrawlEngine;
use super::types::{EngineKind, RawRecord, ScrapeError, classify_http_error};

/// HTTP-backed implementation of [`CrawlEngine`]
pub struct StaticEngine {
    client: reqwest::Client,
    current_url: Option<Url>,
    current_body: Option<String>,
}

impl StaticEngine {
    /// Build the engine with a configured HTTP client
    pub fn new(settings: &EngineSettings) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(CHROME_USER_AGENT)
            .timeout(settings.navigation_timeout)
            .build()
            .map_err(|e| ScrapeError::Other(format!("HTTP client construction failed: {e}")))?;

        Ok(Self {
            client,
            current_url: None,
            current_body: None,
        })
    }

    fn loaded_body(&self) -> Result<&str, ScrapeError> {
        self.current_body
            .as_deref()
            .ok_or_else(|| ScrapeError::Extraction("extract called before navigate".into()))
    }

    fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
        Selector::parse(selector)
            .map_err(|e| ScrapeError::Extraction(format!("invalid selector '{selector}': {e}")))
    }

    /// Resolve one child-field value with the link-attribute rules
    fn resolve_field_value(&self, child: ElementRef<'_>, field_name: &str) -> Option<String> {
        if let Some(href) = child.value().attr("href") {
            if let Some(rest) = href.strip_prefix("mailto:") {
                let email = rest.split('?').next().unwrap_or(rest).trim();
                if !email.is_empty() {
                    return Some(email.to_string());
                }
            } else if let Some(rest) = href.strip_prefix("tel:") {
                let phone = rest.trim();
                if !phone.is_empty() {
                    return Some(phone.to_string());
                }
            } else if field_name == "website" {
                return self.absolutize(href);
            }
        }

        let text = visible_text(child);
        if text.is_empty() { None } else { Some(text) }
    }

    fn absolutize(&self, href: &str) -> Option<String> {
        match &self.current_url {
            Some(base) => base.join(href).ok().map(String::from),
            None => Url::parse(href).ok().map(String::from),
        }
    }
}

#[async_trait]
impl CrawlEngine for StaticEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Static
    }

    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_http_error(&e))?
            .error_for_status()
            .map_err(|e| classify_http_error(&e))?;

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| classify_http_error(&e))?;

        debug!("Fetched {} bytes from {final_url}", body.len());
        self.current_url = Some(final_url);
        self.current_body = Some(body);
        Ok(())
    }

    async fn expand_dropdowns(&mut self, _selector: &str) -> usize {
        // Nothing to click without a script engine; server-rendered sites
        // carry the expanded content inline.
        debug!("Static engine skips dropdown expansion");
        0
    }

    async fn extract(&mut self, selectors: &SelectorSet) -> Result<Vec<RawRecord>, ScrapeError> {
        let container = Self::parse_selector(&selectors.container)?;
        let fields: Vec<(String, Selector)> = selectors
            .fields
            .iter()
            .map(|f| Ok((f.name.clone(), Self::parse_selector(&f.selector)?)))
            .collect::<Result<_, ScrapeError>>()?;

        let document = Html::parse_document(self.loaded_body()?);
        let mut records = Vec::new();

        for element in document.select(&container) {
            let mut metadata = std::collections::BTreeMap::new();
            for (name, selector) in &fields {
                if let Some(child) = element.select(selector).next()
                    && let Some(value) = self.resolve_field_value(child, name)
                {
                    metadata.insert(name.clone(), value);
                }
            }
            records.push(RawRecord {
                text: visible_text(element),
                html: element.inner_html(),
                metadata,
            });
        }

        debug!("Extracted {} container match(es)", records.len());
        Ok(records)
    }

    async fn next_page_url(&mut self, selector: &str) -> Result<Option<String>, ScrapeError> {
        let next = Self::parse_selector(selector)?;
        let document = Html::parse_document(self.loaded_body()?);

        let href = document
            .select(&next)
            .find_map(|el| el.value().attr("href").map(str::to_string));

        Ok(href.and_then(|h| self.absolutize(&h)))
    }

    async fn close(&mut self) -> Result<(), ScrapeError> {
        // Stateless beyond the fetched body; dropping it is the whole teardown
        self.current_body = None;
        self.current_url = None;
        Ok(())
    }
}

/// Collapse an element's text nodes into newline-separated visible text,
/// approximating what a browser reports for the same markup
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldSelector, SelectorSet};

    fn engine_with_body(base: &str, body: &str) -> StaticEngine {
        let mut engine = StaticEngine::new(&EngineSettings::default()).unwrap();
        engine.current_url = Some(Url::parse(base).unwrap());
        engine.current_body = Some(body.to_string());
        engine
    }

    fn selectors(fields: Vec<(&str, &str)>) -> SelectorSet {
        SelectorSet {
            container: ".card".into(),
            fields: fields
                .into_iter()
                .map(|(name, selector)| FieldSelector {
                    name: name.into(),
                    selector: selector.into(),
                })
                .collect(),
            next_page: None,
            dropdown_trigger: None,
        }
    }

    #[tokio::test]
    async fn extract_resolves_link_attributes() {
        let body = r#"
            <div class="card">
                <h3>Acme Corp</h3>
                <a class="mail" href="mailto:contact@acme.fr?subject=hi">Nous écrire</a>
                <a class="tel" href="tel:+33612345678">Appeler</a>
                <a class="site" href="/fr/acme">Site</a>
            </div>
        "#;
        let mut engine = engine_with_body("https://annuaire.example.com/page/1", body);
        let selectors = selectors(vec![
            ("email", "a.mail"),
            ("phone", "a.tel"),
            ("website", "a.site"),
        ]);

        let records = engine.extract(&selectors).await.unwrap();
        assert_eq!(records.len(), 1);
        let meta = &records[0].metadata;
        assert_eq!(meta["email"], "contact@acme.fr");
        assert_eq!(meta["phone"], "+33612345678");
        assert_eq!(meta["website"], "https://annuaire.example.com/fr/acme");
        assert!(records[0].text.contains("Acme Corp"));
    }

    #[tokio::test]
    async fn extract_returns_empty_when_container_misses() {
        let mut engine = engine_with_body("https://example.com", "<p>rien ici</p>");
        let records = engine.extract(&selectors(vec![])).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn next_page_url_is_absolutized() {
        let body = r#"<a rel="next" href="?page=2">Suivant</a>"#;
        let mut engine = engine_with_body("https://example.com/liste", body);
        let next = engine.next_page_url("a[rel=next]").await.unwrap();
        assert_eq!(next.as_deref(), Some("https://example.com/liste?page=2"));
    }

    #[tokio::test]
    async fn next_page_url_missing_link_is_none() {
        let mut engine = engine_with_body("https://example.com", "<p>fin</p>");
        assert!(engine.next_page_url("a.next").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_selector_is_an_extraction_error() {
        let mut engine = engine_with_body("https://example.com", "<p></p>");
        let err = engine.next_page_url(":::").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction(_)));
    }
}
