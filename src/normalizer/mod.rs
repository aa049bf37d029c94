//! Heuristic field normalization for extracted records
//!
//! Maps each [`RawRecord`] to one [`CanonicalRecord`] through a fixed,
//! order-sensitive priority chain per field:
//!
//! 1. explicit metadata value from child-selector extraction,
//! 2. a content-derived heuristic specific to the field,
//! 3. a labeled-text regex match against the full text,
//! 4. a caller-supplied default (sector/country tags on the config),
//! 5. the sentinel `"Aucune donnée"`.
//!
//! Metadata always wins over content heuristics. Every resolved value is
//! HTML-tag-stripped and trimmed; fields never end up null or empty. The
//! chain is deterministic and idempotent: feeding canonical output back in
//! resolves to the same values.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ScraperConfig;
use crate::scrape_engine::RawRecord;

/// Placeholder for a canonical field with no resolvable value
pub const NO_DATA: &str = "Aucune donnée";

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]+>").expect("tag pattern is valid")
});

/// Generic phone-number shape: leading digit (optionally +), then at least
/// seven digits/separators, ending on a digit
static PHONE_SHAPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+?\d[\d .\-]{6,}\d").expect("phone pattern is valid")
});

static PHONE_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)t[ée]l(?:[ée]phone)?\s*\.?\s*:\s*(\+?[\d][\d .\-]{5,}\d)")
        .expect("phone label pattern is valid")
});

static EMAIL_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:e-?mail|courriel|mail)\s*:\s*([A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,})")
        .expect("email label pattern is valid")
});

static WEBSITE_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:site\s*(?:web|internet)?|web)\s*:\s*(\S+)")
        .expect("website label pattern is valid")
});

static ADDRESS_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)adresse\s*:\s*([^\n]+)").expect("address label pattern is valid")
});

static SECTOR_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)secteur(?:\s*d'activit[ée])?\s*:\s*([^\n]+)")
        .expect("sector label pattern is valid")
});

/// One business entity in canonical shape.
///
/// Every field carries either a real value or [`NO_DATA`]; consumers never
/// see null or the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub address: String,
    pub sector: String,
}

/// Resolves raw records into canonical ones using caller defaults
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    default_sector: Option<String>,
    default_country: Option<String>,
}

impl Normalizer {
    /// Build a normalizer with explicit defaults
    #[must_use]
    pub fn new(default_sector: Option<String>, default_country: Option<String>) -> Self {
        Self {
            default_sector,
            default_country,
        }
    }

    /// Pull the defaults off a scraper config (sector and country tags)
    #[must_use]
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(
            config.sector().map(str::to_string),
            config.country().map(str::to_string),
        )
    }

    /// Resolve every field of one raw record through the priority chain
    #[must_use]
    pub fn normalize(&self, raw: &RawRecord) -> CanonicalRecord {
        let text = strip_tags(&raw.text);

        let name = metadata_value(&raw.metadata, "name")
            .or_else(|| first_line(&text))
            .unwrap_or_else(no_data);

        let phone = metadata_value(&raw.metadata, "phone")
            .map(|v| strip_link_prefix(&v, "tel:"))
            .or_else(|| phone_shape(&text))
            .or_else(|| label_capture(&PHONE_LABEL_RE, &text))
            .unwrap_or_else(no_data);

        let email = metadata_value(&raw.metadata, "email")
            .map(|v| strip_link_prefix(&v, "mailto:"))
            .or_else(|| label_capture(&EMAIL_LABEL_RE, &text))
            .unwrap_or_else(no_data);

        let website = metadata_value(&raw.metadata, "website")
            .or_else(|| label_capture(&WEBSITE_LABEL_RE, &text))
            .map(ensure_scheme)
            .unwrap_or_else(no_data);

        let address = metadata_value(&raw.metadata, "address")
            .or_else(|| label_capture(&ADDRESS_LABEL_RE, &text))
            .or_else(|| self.default_country.clone())
            .unwrap_or_else(no_data);

        let sector = metadata_value(&raw.metadata, "sector")
            .or_else(|| label_capture(&SECTOR_LABEL_RE, &text))
            .or_else(|| self.default_sector.clone())
            .unwrap_or_else(no_data);

        CanonicalRecord {
            name,
            phone,
            email,
            website,
            address,
            sector,
        }
    }

    /// Normalize a batch, one canonical record per raw record
    #[must_use]
    pub fn normalize_all(&self, raws: &[RawRecord]) -> Vec<CanonicalRecord> {
        raws.iter().map(|raw| self.normalize(raw)).collect()
    }
}

fn no_data() -> String {
    NO_DATA.to_string()
}

/// Metadata lookup: tag-stripped, trimmed, and only accepted when it carries
/// actual data (the sentinel counts as absent, which makes the chain
/// idempotent on canonical input)
fn metadata_value(metadata: &BTreeMap<String, String>, field: &str) -> Option<String> {
    let value = strip_tags(metadata.get(field)?);
    if value.is_empty() || value == NO_DATA {
        None
    } else {
        Some(value)
    }
}

fn strip_tags(value: &str) -> String {
    TAG_RE.replace_all(value, "").trim().to_string()
}

fn strip_link_prefix(value: &str, prefix: &str) -> String {
    value
        .strip_prefix(prefix)
        .map_or_else(|| value.to_string(), |rest| rest.trim().to_string())
}

fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

fn phone_shape(text: &str) -> Option<String> {
    PHONE_SHAPE_RE
        .find(text)
        .map(|m| m.as_str().trim().to_string())
}

fn label_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

fn ensure_scheme(website: String) -> String {
    if website.contains("://") {
        website
    } else {
        format!("https://{website}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str, metadata: &[(&str, &str)]) -> RawRecord {
        RawRecord {
            text: text.to_string(),
            html: String::new(),
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn metadata_wins_over_content_heuristics() {
        let record = raw(
            "Boulangerie Dupont\nTel: 01 02 03 04 05",
            &[("name", "Maison Dupont"), ("phone", "09 87 65 43 21")],
        );
        let canonical = Normalizer::default().normalize(&record);
        assert_eq!(canonical.name, "Maison Dupont");
        assert_eq!(canonical.phone, "09 87 65 43 21");
    }

    #[test]
    fn content_heuristics_fill_missing_metadata() {
        // Name comes from the first non-empty line (label included), phone
        // from the generic shape match
        let record = raw("Nom: Acme Corp\nTel: 06 12 34 56 78", &[]);
        let canonical = Normalizer::default().normalize(&record);

        assert_eq!(canonical.name, "Nom: Acme Corp");
        assert_eq!(canonical.phone, "06 12 34 56 78");
        assert_eq!(canonical.email, NO_DATA);
        assert_eq!(canonical.website, NO_DATA);
        assert_eq!(canonical.address, NO_DATA);
        assert_eq!(canonical.sector, NO_DATA);
    }

    #[test]
    fn labeled_text_resolves_remaining_fields() {
        let text = "Garage Martin\n\
                    Email : contact@garage-martin.fr\n\
                    Site web : garage-martin.fr\n\
                    Adresse : 12 rue des Lilas, 69003 Lyon\n\
                    Secteur : Automobile";
        let canonical = Normalizer::default().normalize(&raw(text, &[]));

        assert_eq!(canonical.email, "contact@garage-martin.fr");
        assert_eq!(canonical.website, "https://garage-martin.fr");
        assert_eq!(canonical.address, "12 rue des Lilas, 69003 Lyon");
        assert_eq!(canonical.sector, "Automobile");
    }

    #[test]
    fn scheme_less_website_metadata_is_prefixed() {
        let record = raw("", &[("website", "example.com")]);
        let canonical = Normalizer::default().normalize(&record);
        assert_eq!(canonical.website, "https://example.com");
    }

    #[test]
    fn website_with_scheme_is_untouched() {
        let record = raw("", &[("website", "http://example.com/a")]);
        let canonical = Normalizer::default().normalize(&record);
        assert_eq!(canonical.website, "http://example.com/a");
    }

    #[test]
    fn values_are_tag_stripped() {
        let record = raw("", &[("name", "<strong>Acme</strong> Corp")]);
        let canonical = Normalizer::default().normalize(&record);
        assert_eq!(canonical.name, "Acme Corp");
    }

    #[test]
    fn caller_defaults_apply_before_sentinel() {
        let normalizer = Normalizer::new(Some("BTP".into()), Some("France".into()));
        let canonical = normalizer.normalize(&raw("Entreprise X", &[]));
        assert_eq!(canonical.sector, "BTP");
        assert_eq!(canonical.address, "France");
    }

    #[test]
    fn chain_is_idempotent_on_canonical_input() {
        let normalizer = Normalizer::default();
        // Feed a record whose metadata is already the sentinel on all fields
        let record = raw(
            "",
            &[
                ("name", NO_DATA),
                ("phone", NO_DATA),
                ("email", NO_DATA),
                ("website", NO_DATA),
                ("address", NO_DATA),
                ("sector", NO_DATA),
            ],
        );
        let first = normalizer.normalize(&record);
        assert_eq!(first.name, NO_DATA);
        assert_eq!(first.website, NO_DATA);

        // And again through the chain: still the same sentinels
        let again = normalizer.normalize(&raw(
            "",
            &[
                ("name", &first.name),
                ("phone", &first.phone),
                ("email", &first.email),
                ("website", &first.website),
                ("address", &first.address),
                ("sector", &first.sector),
            ],
        ));
        assert_eq!(again, first);
    }

    #[test]
    fn link_prefixes_are_stripped_defensively() {
        let record = raw(
            "",
            &[("email", "mailto:info@acme.fr"), ("phone", "tel:+33102030405")],
        );
        let canonical = Normalizer::default().normalize(&record);
        assert_eq!(canonical.email, "info@acme.fr");
        assert_eq!(canonical.phone, "+33102030405");
    }
}
