//! Graceful degradation.
//!
//! When no source yields usable data the user gets a short admission, the
//! internal answer (if any) clearly labelled unverified, and at most two
//! places to check by hand. Everything here is static tables; it cannot fail.

use tracing::info;

use truthgate_contracts::{
    config::DegradationConfig,
    lookup::{DegradedResponse, FailedLookup, VerificationPath, VerificationPointer},
    source::SourceCategory,
};
use truthgate_sources::detect_domain;

pub const DISCLOSURE: &str = "I can't access current data for this query.";
pub const UNVERIFIED_LABEL: &str = "Unverified (may be outdated):";

const MAX_POINTERS: usize = 2;

fn pointers_for(category: SourceCategory) -> [(&'static str, &'static str); MAX_POINTERS] {
    match category {
        SourceCategory::Currency => [("XE", "https://www.xe.com"), ("OANDA", "https://www.oanda.com")],
        SourceCategory::Stock => [
            ("Yahoo Finance", "https://finance.yahoo.com"),
            ("Google Finance", "https://www.google.com/finance"),
        ],
        SourceCategory::Commodity => [
            ("Kitco", "https://www.kitco.com"),
            ("Investing.com", "https://www.investing.com/commodities"),
        ],
        SourceCategory::Government => [
            ("Wikipedia", "https://en.wikipedia.org"),
            ("USA.gov", "https://www.usa.gov"),
        ],
        SourceCategory::News => [("Reuters", "https://www.reuters.com"), ("AP News", "https://apnews.com")],
        SourceCategory::Crypto => [
            ("CoinGecko", "https://www.coingecko.com"),
            ("CoinMarketCap", "https://coinmarketcap.com"),
        ],
        SourceCategory::Medical => [
            ("MedlinePlus", "https://medlineplus.gov"),
            ("FDA", "https://www.fda.gov"),
        ],
        SourceCategory::Weather => [
            ("National Weather Service", "https://www.weather.gov"),
            ("Weather.com", "https://weather.com"),
        ],
        SourceCategory::General => [
            ("DuckDuckGo", "https://duckduckgo.com"),
            ("Wikipedia", "https://en.wikipedia.org"),
        ],
    }
}

/// Search-engine and encyclopedia pointers carrying the query itself.
fn generic_pointers(query: &str) -> Vec<VerificationPointer> {
    let encoded = urlencoding::encode(query.trim());
    vec![
        VerificationPointer {
            name: "DuckDuckGo".to_string(),
            url: format!("https://duckduckgo.com/?q={encoded}"),
        },
        VerificationPointer {
            name: "Wikipedia".to_string(),
            url: format!("https://en.wikipedia.org/w/index.php?search={encoded}"),
        },
    ]
}

/// Chooses verification pointers from the query's domain.
pub fn verification_path_for(query: &str) -> VerificationPath {
    match detect_domain(query).map(|d| d.category) {
        Some(category) if category != SourceCategory::General => VerificationPath {
            category: Some(category),
            sources: pointers_for(category)
                .iter()
                .map(|(name, url)| VerificationPointer {
                    name: name.to_string(),
                    url: url.to_string(),
                })
                .collect(),
        },
        category => VerificationPath {
            category,
            sources: generic_pointers(query),
        },
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Builds the degraded response for a failed or impossible lookup.
#[derive(Debug, Clone, Default)]
pub struct DegradationHandler {
    config: DegradationConfig,
}

impl DegradationHandler {
    pub fn new(config: DegradationConfig) -> Self {
        Self { config }
    }

    /// Degrade `query`.
    ///
    /// `failure` is `None` when there were no sources to try at all.
    pub fn graceful_degradation(
        &self,
        query: &str,
        failure: Option<&FailedLookup>,
        internal_answer: Option<&str>,
    ) -> DegradedResponse {
        let verification_path = verification_path_for(query);
        let failure_tags: Vec<String> = failure
            .map(|f| f.sources_consulted.iter().map(|c| c.status.tag()).collect())
            .unwrap_or_default();

        let mut response = DegradedResponse {
            disclosure: DISCLOSURE.to_string(),
            fallback_answer: None,
            verification_path,
            max_response_words: self.config.max_response_words,
            failure_tags,
        };

        // Whatever words the fixed parts leave over go to the internal answer.
        let fixed_words = word_count(&response.response_text()) + word_count(UNVERIFIED_LABEL);
        let budget = self.config.max_response_words.saturating_sub(fixed_words);
        response.fallback_answer = internal_answer
            .filter(|answer| !answer.trim().is_empty())
            .and_then(|answer| labelled_fallback(answer, budget));

        info!(
            category = ?response.verification_path.category,
            failures = response.failure_tags.len(),
            fallback = response.fallback_answer.is_some(),
            "lookup degraded"
        );
        response
    }
}

fn labelled_fallback(answer: &str, budget: usize) -> Option<String> {
    if budget == 0 {
        return None;
    }
    let words: Vec<&str> = answer.split_whitespace().collect();
    let kept = if words.len() > budget {
        format!("{}...", words[..budget].join(" "))
    } else {
        words.join(" ")
    };
    Some(format!("{UNVERIFIED_LABEL} {kept}"))
}

#[cfg(test)]
mod tests {
    use truthgate_contracts::{
        config::DegradationConfig,
        lookup::{FailedLookup, SourceConsultation, SourceStatus},
        source::SourceCategory,
    };

    use super::*;

    fn handler() -> DegradationHandler {
        DegradationHandler::default()
    }

    fn timeouts() -> FailedLookup {
        FailedLookup {
            sources_consulted: vec![
                SourceConsultation::new("google_news", SourceStatus::Timeout),
                SourceConsultation::new("bbc_world", SourceStatus::HttpError(503)),
            ],
        }
    }

    // ── Pointers ─────────────────────────────────────────────────────────────

    #[test]
    fn pointers_follow_query_domain() {
        let cases = [
            ("How many euros is 100 dollars right now?", SourceCategory::Currency, "XE"),
            ("What is the price of gold per ounce?", SourceCategory::Commodity, "Kitco"),
            ("latest headlines about the port strike", SourceCategory::News, "Reuters"),
            ("What is the current price of Bitcoin?", SourceCategory::Crypto, "CoinGecko"),
        ];
        for (query, category, first) in cases {
            let path = verification_path_for(query);
            assert_eq!(path.category, Some(category), "query: {query}");
            assert_eq!(path.sources[0].name, first, "query: {query}");
            assert!(path.sources.len() <= 2);
        }
    }

    #[test]
    fn unmatched_query_gets_search_pointers_with_query() {
        let path = verification_path_for("How do magnets work?");
        assert_eq!(path.category, None);
        assert_eq!(path.sources.len(), 2);
        assert_eq!(path.sources[0].url, "https://duckduckgo.com/?q=How%20do%20magnets%20work%3F");
    }

    // ── Response shape ───────────────────────────────────────────────────────

    #[test]
    fn degraded_response_lists_failures_and_pointers() {
        let degraded = handler().graceful_degradation(
            "latest headlines about the port strike",
            Some(&timeouts()),
            None,
        );

        assert_eq!(degraded.disclosure, DISCLOSURE);
        assert_eq!(degraded.failure_tags, ["timeout", "error_503"]);
        assert_eq!(degraded.fallback_answer, None);
        assert_eq!(
            degraded.response_text(),
            "I can't access current data for this query. Check Reuters or AP News."
        );
    }

    #[test]
    fn internal_answer_is_labelled_unverified() {
        let degraded = handler().graceful_degradation(
            "How many euros is 100 dollars right now?",
            None,
            Some("About 0.92 euros per dollar."),
        );

        assert_eq!(
            degraded.fallback_answer.as_deref(),
            Some("Unverified (may be outdated): About 0.92 euros per dollar.")
        );
        assert!(degraded.failure_tags.is_empty());
    }

    #[test]
    fn long_internal_answer_is_trimmed_to_word_cap() {
        let long_answer = "word ".repeat(200);
        let degraded = handler().graceful_degradation(
            "What is the current price of Bitcoin?",
            Some(&timeouts()),
            Some(&long_answer),
        );

        let words = degraded.response_text().split_whitespace().count();
        assert!(words <= 30, "response has {words} words");
        assert!(degraded.fallback_answer.unwrap().ends_with("..."));
    }

    #[test]
    fn tight_word_cap_drops_fallback_entirely() {
        let handler = DegradationHandler::new(DegradationConfig {
            max_response_words: 16,
        });
        let degraded = handler.graceful_degradation(
            "What is the current price of Bitcoin?",
            None,
            Some("Around sixty thousand dollars."),
        );
        assert_eq!(degraded.fallback_answer, None);
        assert!(degraded.response_text().split_whitespace().count() <= 16);
    }

    #[test]
    fn minimum_word_cap_fits_every_category() {
        let categories = [
            SourceCategory::Crypto,
            SourceCategory::Currency,
            SourceCategory::Stock,
            SourceCategory::Commodity,
            SourceCategory::Government,
            SourceCategory::Medical,
            SourceCategory::Weather,
            SourceCategory::News,
            SourceCategory::General,
        ];
        for category in categories {
            let degraded = DegradedResponse {
                disclosure: DISCLOSURE.to_string(),
                fallback_answer: None,
                verification_path: VerificationPath {
                    category: Some(category),
                    sources: pointers_for(category)
                        .iter()
                        .map(|(name, url)| VerificationPointer {
                            name: name.to_string(),
                            url: url.to_string(),
                        })
                        .collect(),
                },
                max_response_words: DegradationConfig::MIN_RESPONSE_WORDS,
                failure_tags: Vec::new(),
            };
            let words = degraded.response_text().split_whitespace().count();
            assert!(
                words <= DegradationConfig::MIN_RESPONSE_WORDS,
                "{category:?} needs {words} words"
            );
        }
    }
}
