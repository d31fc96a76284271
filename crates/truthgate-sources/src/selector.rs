//! Source selection.
//!
//! `SourceSelector` maps a query to the catalog sources worth consulting:
//!
//! 1. Run the domain matchers; the first hit picks the category.
//! 2. Take that category's sources in catalog order, dropping key-gated
//!    sources whose credential is missing.
//! 3. If a price category ends up with nothing usable, fall back to the news
//!    feed. Headlines are lower fidelity than a quote but better than nothing.
//!
//! An empty selection means "no reliable source". Callers treat it as a
//! degradation trigger, never as an error.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use truthgate_contracts::{
    source::{SourceCategory, SourceSpec},
    truth::{HighStakes, TruthType},
};
use truthgate_core::traits::Credentials;

use crate::catalog::SourceCatalog;
use crate::domain::{detect_domain, DomainMatch};

/// The outcome of source selection for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSelection {
    pub domain: Option<DomainMatch>,
    /// Usable sources, in the order they should be tried.
    pub sources: Vec<SourceSpec>,
    /// Names of key-gated sources dropped for lack of a credential.
    pub skipped_for_credentials: Vec<String>,
    /// True when the news feed was appended as a price-query substitute.
    pub news_fallback: bool,
}

impl SourceSelection {
    pub fn empty() -> Self {
        Self {
            domain: None,
            sources: Vec::new(),
            skipped_for_credentials: Vec::new(),
            news_fallback: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn category(&self) -> Option<SourceCategory> {
        self.domain.as_ref().map(|d| d.category)
    }

    pub fn subject(&self) -> Option<&str> {
        self.domain.as_ref().and_then(|d| d.subject.as_deref())
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Picks catalog sources for a query.
pub struct SourceSelector {
    catalog: Arc<SourceCatalog>,
    credentials: Arc<dyn Credentials>,
}

impl SourceSelector {
    pub fn new(catalog: Arc<SourceCatalog>, credentials: Arc<dyn Credentials>) -> Self {
        Self {
            catalog,
            credentials,
        }
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    /// Select sources for `query`.
    ///
    /// When no matcher fires, a high-stakes query that is not a permanent
    /// fact still gets the general reference sources; anything else gets an
    /// empty selection.
    pub fn select_sources_for_query(
        &self,
        query: &str,
        truth_type: TruthType,
        high_stakes: &HighStakes,
    ) -> SourceSelection {
        let domain = detect_domain(query).or_else(|| {
            (high_stakes.is_high_stakes
                && !matches!(truth_type, TruthType::Permanent | TruthType::DocumentReview))
            .then(|| DomainMatch {
                category: SourceCategory::General,
                subject: None,
                matcher: "high_stakes_general",
            })
        });

        let Some(domain) = domain else {
            debug!(truth_type = %truth_type, "no source category matched");
            return SourceSelection::empty();
        };

        let mut skipped_for_credentials = Vec::new();
        let mut sources: Vec<SourceSpec> = Vec::new();
        for source in self.catalog.by_category(domain.category) {
            match source.url.required_credential() {
                Some(env_var) if !self.credentials.has(env_var) => {
                    skipped_for_credentials.push(source.name.clone());
                }
                _ => sources.push(source.clone()),
            }
        }

        let mut news_fallback = false;
        if sources.is_empty() && domain.category.is_price_category() {
            if let Some(feed) = self.catalog.news_feed() {
                sources.push(feed.clone());
                news_fallback = true;
            }
        }

        debug!(
            category = %domain.category,
            matcher = domain.matcher,
            sources = sources.len(),
            skipped = skipped_for_credentials.len(),
            news_fallback,
            "sources selected"
        );

        SourceSelection {
            domain: Some(domain),
            sources,
            skipped_for_credentials,
            news_fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use truthgate_contracts::{
        source::SourceCategory,
        truth::{HighStakes, HighStakesDomain, TruthType},
    };
    use truthgate_core::StaticCredentials;

    use crate::catalog::SourceCatalog;

    use super::SourceSelector;

    fn selector(credentials: StaticCredentials) -> SourceSelector {
        SourceSelector::new(Arc::new(SourceCatalog::builtin().unwrap()), Arc::new(credentials))
    }

    fn medical() -> HighStakes {
        HighStakes::from_domains([HighStakesDomain::Medical].into_iter().collect())
    }

    #[test]
    fn bitcoin_selects_crypto_source() {
        let selection = selector(StaticCredentials::new()).select_sources_for_query(
            "What is the current price of Bitcoin?",
            TruthType::Volatile,
            &HighStakes::none(),
        );
        assert_eq!(selection.category(), Some(SourceCategory::Crypto));
        assert_eq!(selection.source_names(), ["coingecko"]);
        assert!(!selection.news_fallback);
    }

    #[test]
    fn gated_commodity_without_key_falls_back_to_news() {
        let selection = selector(StaticCredentials::new()).select_sources_for_query(
            "What is the price of gold per ounce?",
            TruthType::Volatile,
            &HighStakes::none(),
        );
        assert_eq!(selection.category(), Some(SourceCategory::Commodity));
        assert_eq!(selection.skipped_for_credentials, ["metals_api"]);
        assert_eq!(selection.source_names(), ["google_news"]);
        assert!(selection.news_fallback);
    }

    #[test]
    fn gated_commodity_with_key_uses_it() {
        let creds = StaticCredentials::new().with("METALS_API_KEY", "k");
        let selection = selector(creds).select_sources_for_query(
            "What is the price of gold per ounce?",
            TruthType::Volatile,
            &HighStakes::none(),
        );
        assert_eq!(selection.source_names(), ["metals_api"]);
        assert_eq!(selection.subject(), Some("XAU"));
        assert!(!selection.news_fallback);
    }

    #[test]
    fn stock_without_key_falls_back_to_news() {
        let selection = selector(StaticCredentials::new()).select_sources_for_query(
            "What's Tesla's share price?",
            TruthType::Volatile,
            &HighStakes::none(),
        );
        assert_eq!(selection.category(), Some(SourceCategory::Stock));
        assert!(selection.news_fallback);
    }

    #[test]
    fn unmatched_query_selects_nothing() {
        let selection = selector(StaticCredentials::new()).select_sources_for_query(
            "How do magnets work?",
            TruthType::Permanent,
            &HighStakes::none(),
        );
        assert!(selection.is_empty());
        assert_eq!(selection.category(), None);
    }

    #[test]
    fn unmatched_high_stakes_query_gets_general_sources() {
        let selection = selector(StaticCredentials::new()).select_sources_for_query(
            "Is it safe to take these pills with grapefruit?",
            TruthType::SemiStable,
            &medical(),
        );
        assert_eq!(selection.category(), Some(SourceCategory::General));
        assert_eq!(
            selection.source_names(),
            ["wikipedia_general", "wikipedia_current_events", "google_news_general"]
        );
    }

    #[test]
    fn news_selection_keeps_catalog_order() {
        let selection = selector(StaticCredentials::new()).select_sources_for_query(
            "latest headlines about the port strike",
            TruthType::Volatile,
            &HighStakes::none(),
        );
        assert_eq!(
            selection.source_names(),
            ["google_news", "bbc_world", "apnews_site"]
        );
    }
}
