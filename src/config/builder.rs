//! Type-safe builder for `ScraperConfig` using the typestate pattern
//!
//! The two fields a crawl cannot run without (source URL and main container
//! selector) are enforced at compile time; everything else is optional with
//! sensible defaults.

use std::marker::PhantomData;

use super::types::{EnginePreference, FieldSelector, ScraperConfig, SelectorSet};

// Type states for the builder
pub struct WithSourceUrl;
pub struct Ready;

pub struct ScraperConfigBuilder<State = ()> {
    pub(crate) id: Option<String>,
    pub(crate) source_url: Option<String>,
    pub(crate) container: Option<String>,
    pub(crate) fields: Vec<FieldSelector>,
    pub(crate) next_page: Option<String>,
    pub(crate) dropdown_trigger: Option<String>,
    pub(crate) engine: EnginePreference,
    pub(crate) country: Option<String>,
    pub(crate) sector: Option<String>,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for ScraperConfigBuilder<()> {
    fn default() -> Self {
        Self {
            id: None,
            source_url: None,
            container: None,
            fields: Vec::new(),
            next_page: None,
            dropdown_trigger: None,
            engine: EnginePreference::default(),
            country: None,
            sector: None,
            _phantom: PhantomData,
        }
    }
}

impl ScraperConfig {
    /// Create a builder for configuring a `ScraperConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> ScraperConfigBuilder<()> {
        ScraperConfigBuilder::default()
    }
}

impl ScraperConfigBuilder<()> {
    pub fn source_url(self, url: impl Into<String>) -> ScraperConfigBuilder<WithSourceUrl> {
        ScraperConfigBuilder {
            id: self.id,
            source_url: Some(url.into()),
            container: self.container,
            fields: self.fields,
            next_page: self.next_page,
            dropdown_trigger: self.dropdown_trigger,
            engine: self.engine,
            country: self.country,
            sector: self.sector,
            _phantom: PhantomData,
        }
    }
}

impl ScraperConfigBuilder<WithSourceUrl> {
    pub fn container(self, selector: impl Into<String>) -> ScraperConfigBuilder<Ready> {
        ScraperConfigBuilder {
            id: self.id,
            source_url: self.source_url,
            container: Some(selector.into()),
            fields: self.fields,
            next_page: self.next_page,
            dropdown_trigger: self.dropdown_trigger,
            engine: self.engine,
            country: self.country,
            sector: self.sector,
            _phantom: PhantomData,
        }
    }
}

// Setters available in every state
impl<State> ScraperConfigBuilder<State> {
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Register a child field selector resolved inside each container match
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, selector: impl Into<String>) -> Self {
        self.fields.push(FieldSelector {
            name: name.into(),
            selector: selector.into(),
        });
        self
    }

    #[must_use]
    pub fn next_page(mut self, selector: impl Into<String>) -> Self {
        self.next_page = Some(selector.into());
        self
    }

    #[must_use]
    pub fn dropdown_trigger(mut self, selector: impl Into<String>) -> Self {
        self.dropdown_trigger = Some(selector.into());
        self
    }

    #[must_use]
    pub fn engine(mut self, engine: EnginePreference) -> Self {
        self.engine = engine;
        self
    }

    #[must_use]
    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    #[must_use]
    pub fn sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }
}

impl ScraperConfigBuilder<Ready> {
    /// Build the final config. Only reachable once both required fields are set.
    #[must_use]
    pub fn build(self) -> ScraperConfig {
        let source_url = self
            .source_url
            .unwrap_or_default();
        let id = self
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        ScraperConfig {
            id,
            source_url,
            selectors: SelectorSet {
                container: self.container.unwrap_or_default(),
                fields: self.fields,
                next_page: self.next_page,
                dropdown_trigger: self.dropdown_trigger,
            },
            engine: self.engine,
            country: self.country,
            sector: self.sector,
        }
    }
}
