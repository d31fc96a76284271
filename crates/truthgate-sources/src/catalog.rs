//! TOML-driven source catalog.
//!
//! `SourceCatalog` loads an ordered list of `SourceSpec`s from a TOML string
//! or file. Within a category, sources keep their declaration order; the
//! selector and the executor both rely on it.
//!
//! ```toml
//! [[sources]]
//! name = "coingecko"
//! category = "crypto"
//! parser = "json"
//! extractor = "crypto_prices"
//!
//! [sources.url]
//! rule = "static"
//! url = "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=usd"
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use truthgate_contracts::{
    error::{TruthgateError, TruthgateResult},
    source::{ParserKind, SourceCategory, SourceSpec},
};

use crate::extract::ExtractorRegistry;

/// The catalog shipped with the crate.
pub const BUILTIN_CATALOG: &str = include_str!("../catalog/sources.toml");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    sources: Vec<SourceSpec>,
}

/// An immutable, ordered registry of external data sources.
#[derive(Debug, Clone)]
pub struct SourceCatalog {
    sources: Vec<SourceSpec>,
}

impl SourceCatalog {
    /// Parse `s` as a TOML catalog.
    ///
    /// Returns `TruthgateError::CatalogError` if the TOML is malformed,
    /// does not match the schema, or declares a source name twice.
    pub fn from_toml_str(s: &str) -> TruthgateResult<Self> {
        let document: CatalogDocument = toml::from_str(s).map_err(|e| TruthgateError::CatalogError {
            reason: format!("failed to parse catalog TOML: {}", e),
        })?;
        Self::from_sources(document.sources)
    }

    /// Read the file at `path` and parse it as a TOML catalog.
    pub fn from_file(path: &Path) -> TruthgateResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| TruthgateError::CatalogError {
            reason: format!("failed to read catalog file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_sources(sources: Vec<SourceSpec>) -> TruthgateResult<Self> {
        let mut seen = HashSet::new();
        for source in &sources {
            if !seen.insert(source.name.as_str()) {
                return Err(TruthgateError::CatalogError {
                    reason: format!("duplicate source name '{}'", source.name),
                });
            }
        }
        debug!(sources = sources.len(), "source catalog loaded");
        Ok(Self { sources })
    }

    /// The catalog embedded in the crate.
    pub fn builtin() -> TruthgateResult<Self> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Check that every source names an extractor registered for its parser kind.
    pub fn validate(&self, registry: &ExtractorRegistry) -> TruthgateResult<()> {
        let problems: Vec<String> = self
            .sources
            .iter()
            .filter_map(|source| match registry.get(&source.extractor) {
                None => Some(format!(
                    "source '{}' names unknown extractor '{}'",
                    source.name, source.extractor
                )),
                Some(extractor) if extractor.parser() != source.parser => Some(format!(
                    "source '{}' is {} but extractor '{}' expects {}",
                    source.name,
                    source.parser.as_str(),
                    source.extractor,
                    extractor.parser().as_str()
                )),
                Some(_) => None,
            })
            .collect();

        if problems.is_empty() {
            Ok(())
        } else {
            Err(TruthgateError::CatalogError {
                reason: problems.join("; "),
            })
        }
    }

    pub fn sources(&self) -> &[SourceSpec] {
        &self.sources
    }

    pub fn get(&self, name: &str) -> Option<&SourceSpec> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Sources of `category`, in declaration order.
    pub fn by_category(&self, category: SourceCategory) -> Vec<&SourceSpec> {
        self.sources.iter().filter(|s| s.category == category).collect()
    }

    /// The first news feed, used as the last-resort substitute for price queries.
    pub fn news_feed(&self) -> Option<&SourceSpec> {
        self.sources
            .iter()
            .find(|s| s.category == SourceCategory::News && s.parser == ParserKind::Rss)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use truthgate_contracts::{
        error::TruthgateError,
        source::{ParserKind, SourceCategory, UrlRule},
    };

    use crate::extract::ExtractorRegistry;

    use super::SourceCatalog;

    #[test]
    fn builtin_catalog_loads_and_validates() {
        let catalog = SourceCatalog::builtin().unwrap();
        assert!(!catalog.is_empty());
        catalog.validate(&ExtractorRegistry::with_defaults()).unwrap();

        let coingecko = catalog.get("coingecko").unwrap();
        assert_eq!(coingecko.category, SourceCategory::Crypto);
        assert!(matches!(coingecko.url, UrlRule::Static { .. }));
        assert_eq!(catalog.news_feed().unwrap().name, "google_news");
    }

    #[test]
    fn category_order_follows_declaration() {
        let catalog = SourceCatalog::builtin().unwrap();
        let names: Vec<&str> = catalog
            .by_category(SourceCategory::News)
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, ["google_news", "bbc_world", "apnews_site"]);
    }

    #[test]
    fn text_sources_default_to_non_parseable() {
        let catalog = SourceCatalog::from_toml_str(
            r#"
            [[sources]]
            name = "homepage"
            category = "news"
            parser = "text"
            extractor = "plain_text"

            [sources.url]
            rule = "static"
            url = "https://example.test/"
            "#,
        )
        .unwrap();
        let source = catalog.get("homepage").unwrap();
        assert_eq!(source.parser, ParserKind::Text);
        assert!(!source.parseable);
    }

    #[test]
    fn malformed_toml_is_catalog_error() {
        let err = SourceCatalog::from_toml_str("[[sources]]\nname = ").unwrap_err();
        assert!(matches!(err, TruthgateError::CatalogError { .. }));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let doc = r#"
            [[sources]]
            name = "dup"
            category = "general"
            parser = "json"
            extractor = "wikipedia_search"
            [sources.url]
            rule = "static"
            url = "https://a.test/"

            [[sources]]
            name = "dup"
            category = "general"
            parser = "json"
            extractor = "wikipedia_search"
            [sources.url]
            rule = "static"
            url = "https://b.test/"
        "#;
        let err = SourceCatalog::from_toml_str(doc).unwrap_err();
        assert!(err.to_string().contains("duplicate source name 'dup'"));
    }

    #[test]
    fn validation_reports_unknown_and_mismatched_extractors() {
        let doc = r#"
            [[sources]]
            name = "mystery"
            category = "general"
            parser = "json"
            extractor = "does_not_exist"
            [sources.url]
            rule = "static"
            url = "https://a.test/"

            [[sources]]
            name = "wrong_kind"
            category = "news"
            parser = "json"
            extractor = "rss_headlines"
            [sources.url]
            rule = "static"
            url = "https://b.test/"
        "#;
        let catalog = SourceCatalog::from_toml_str(doc).unwrap();
        let err = catalog.validate(&ExtractorRegistry::with_defaults()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unknown extractor 'does_not_exist'"), "{msg}");
        assert!(msg.contains("'wrong_kind' is json"), "{msg}");
    }
}
