//! Scraper configuration types
//!
//! This module contains the `ScraperConfig` definition consumed by the
//! extraction engine, its typestate builder, and the environment-provided
//! engine tunables.

pub mod builder;
pub mod settings;
pub mod types;

pub use builder::ScraperConfigBuilder;
pub use settings::EngineSettings;
pub use types::{EnginePreference, FieldSelector, ScraperConfig, SelectorSet};
