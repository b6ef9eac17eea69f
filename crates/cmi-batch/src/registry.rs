//! Source registry: which feeds and pages to import, and under what policy.
//!
//! Lives in `sources.yaml` at the workspace root. Adding or repairing a
//! source is a config edit; no code change needed.

use std::path::Path;

use anyhow::{bail, Context, Result};
use cmi_adapters::{CsvFeedAdapter, PageScrapeAdapter, SelectorSet, SourceAdapter};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SourceRegistry {
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub source_id: String,
    /// Provenance tag stored on every record from this source.
    pub display_name: String,
    pub enabled: bool,
    pub kind: SourceKind,
    pub url: String,
    #[serde(default)]
    pub selectors: Option<SelectorSet>,
    #[serde(default)]
    pub policy: SourcePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Csv,
    Scrape,
}

/// Per-source validation rules applied by the upsert layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcePolicy {
    /// Skip records whose license status is anything but "Active". Applies to
    /// sources that carry a licensing concept (the ROC roster does; scraped
    /// directories do not).
    #[serde(default)]
    pub require_active_license: bool,
    /// Minimum digit count a phone must have before a new record is inserted.
    #[serde(default)]
    pub min_phone_digits: Option<usize>,
    /// Seed an empty portfolio alongside newly created contractors.
    #[serde(default)]
    pub seed_portfolio: bool,
}

impl SourceRegistry {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing source registry yaml")
    }

    pub fn source(&self, source_id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.source_id == source_id)
    }
}

/// Instantiate the adapter a source config describes.
pub fn build_adapter(source: &SourceConfig) -> Result<Box<dyn SourceAdapter>> {
    match source.kind {
        SourceKind::Csv => Ok(Box::new(CsvFeedAdapter::new(
            source.display_name.clone(),
            source.url.clone(),
        ))),
        SourceKind::Scrape => {
            let Some(selectors) = source.selectors.clone() else {
                bail!(
                    "scrape source {} has no selector set configured",
                    source.source_id
                );
            };
            Ok(Box::new(PageScrapeAdapter::new(
                source.display_name.clone(),
                source.url.clone(),
                selectors,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY_YAML: &str = r#"
sources:
  - source_id: az-roc
    display_name: Arizona ROC Database
    enabled: true
    kind: csv
    url: https://example.com/roc/export?format=csv
    policy:
      require_active_license: true
  - source_id: yelp-phoenix-masonry
    display_name: Yelp
    enabled: true
    kind: scrape
    url: https://example.com/search?q=masonry
    selectors:
      card: div.result-card
      name: h3.biz-name
      phone: span.phone
    policy:
      min_phone_digits: 10
      seed_portfolio: true
  - source_id: broken-scrape
    display_name: Broken
    enabled: false
    kind: scrape
    url: https://example.com/broken
"#;

    #[test]
    fn registry_parses_both_source_kinds() {
        let registry = SourceRegistry::from_yaml(REGISTRY_YAML).unwrap();
        assert_eq!(registry.sources.len(), 3);

        let roc = registry.source("az-roc").unwrap();
        assert_eq!(roc.kind, SourceKind::Csv);
        assert!(roc.policy.require_active_license);
        assert_eq!(roc.policy.min_phone_digits, None);

        let yelp = registry.source("yelp-phoenix-masonry").unwrap();
        assert_eq!(yelp.kind, SourceKind::Scrape);
        assert_eq!(yelp.policy.min_phone_digits, Some(10));
        assert!(yelp.policy.seed_portfolio);
        assert_eq!(
            yelp.selectors.as_ref().unwrap().card,
            "div.result-card"
        );
    }

    #[test]
    fn adapters_build_from_config() {
        let registry = SourceRegistry::from_yaml(REGISTRY_YAML).unwrap();
        let roc = build_adapter(registry.source("az-roc").unwrap()).unwrap();
        assert_eq!(roc.source_label(), "Arizona ROC Database");
        let yelp = build_adapter(registry.source("yelp-phoenix-masonry").unwrap()).unwrap();
        assert_eq!(yelp.source_label(), "Yelp");
    }

    #[test]
    fn scrape_source_without_selectors_is_rejected() {
        let registry = SourceRegistry::from_yaml(REGISTRY_YAML).unwrap();
        let err = build_adapter(registry.source("broken-scrape").unwrap()).unwrap_err();
        assert!(err.to_string().contains("no selector set"));
    }
}
