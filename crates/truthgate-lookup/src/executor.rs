//! The lookup executor.
//!
//! `LookupExecutor` is the only component that talks to the network. Every
//! call to `perform_lookup` runs this pipeline in order:
//!
//! 1. Clean the conversational query into a search string
//! 2. Check the cache under the **original** query; return on a hit
//! 3. Consult sources one at a time, bounded by the source cap, the
//!    per-source timeout and the global fetched-text budget
//! 4. Combine successes, attach disclosures, store in the cache
//!
//! No source failure escapes this module. Each one becomes a status tag in
//! `sources_consulted`; zero successes yield `LookupResult::Failed`, which
//! the caller hands to the degradation handler.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use truthgate_cache::FreshnessCache;
use truthgate_classify::is_reported_claim;
use truthgate_contracts::{
    cache::CacheLookup,
    config::LookupConfig,
    lookup::{FailedLookup, LookupResult, SourceConsultation, SourceStatus, VerifiedLookup},
    source::{ParserKind, Payload, SourceCategory, SourceSpec},
    truth::{HighStakes, TruthType},
};
use truthgate_core::traits::{Clock, Credentials, FetchFailure, Fetcher};
use truthgate_sources::{
    extract::truncate_chars, is_price_query, resolve_url, ExtractContext, ExtractorRegistry,
    SourceSelection, UrlContext,
};

use crate::query::clean_search_query;

/// Disclosure attached when news headlines back a claim but no reputable
/// outlet is named in them.
pub const CORROBORATION_DISCLOSURE: &str =
    "Sourcing for this claim could not be confirmed against reputable news outlets.";

/// Disclosure attached when a price was asked for but only headlines came back.
pub const PRICE_WITHOUT_QUOTE_DISCLOSURE: &str =
    "No live price quote was retrieved; only news headlines were available, so no figure is verified.";

const REPUTABLE_OUTLETS: &[&str] = &[
    "reuters",
    "associated press",
    "ap news",
    "apnews",
    "bbc",
    "npr",
    "bloomberg",
    "guardian",
    "new york times",
    "nytimes",
    "wall street journal",
    "wsj",
    "financial times",
    "washington post",
    "al jazeera",
    "cnn",
];

/// Shape of a verified answer inside a cache entry's `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedAnswer {
    text: String,
    #[serde(default)]
    disclosures: Vec<String>,
}

/// One `perform_lookup` call.
#[derive(Debug, Clone, Copy)]
pub struct LookupRequest<'a> {
    /// The user's query, exactly as received. Used as the cache key.
    pub query: &'a str,
    pub selection: &'a SourceSelection,
    pub truth_type: TruthType,
    pub high_stakes: &'a HighStakes,
    /// Source cap from the lookup requirement; bounded again by configuration.
    pub max_sources: usize,
    /// Skip the cache read. Results are still stored.
    pub force_refresh: bool,
}

/// A source that produced text.
struct Contribution<'s> {
    source: &'s SourceSpec,
    text: String,
}

/// Fetches, parses and extracts from selected sources under fixed budgets.
pub struct LookupExecutor {
    fetcher: Arc<dyn Fetcher>,
    extractors: Arc<ExtractorRegistry>,
    credentials: Arc<dyn Credentials>,
    cache: Arc<FreshnessCache>,
    clock: Arc<dyn Clock>,
    config: LookupConfig,
}

impl LookupExecutor {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractors: Arc<ExtractorRegistry>,
        credentials: Arc<dyn Credentials>,
        cache: Arc<FreshnessCache>,
        clock: Arc<dyn Clock>,
        config: LookupConfig,
    ) -> Self {
        Self {
            fetcher,
            extractors,
            credentials,
            cache,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Run one bounded lookup.
    ///
    /// Never fails: every per-source problem is recorded in
    /// `sources_consulted` and total failure is `LookupResult::Failed`.
    pub async fn perform_lookup(&self, request: LookupRequest<'_>) -> LookupResult {
        let query_fingerprint = self.cache.fingerprint(request.query);

        // ── Step 1: Clean the query into a search string ─────────────────────
        let search = clean_search_query(request.query, self.config.max_search_query_chars);
        debug!(
            query_fingerprint = %query_fingerprint,
            search = %search,
            sources = request.selection.sources.len(),
            "lookup starting"
        );

        // ── Step 2: Cache check under the original query ─────────────────────
        if !request.force_refresh {
            if let Some(hit) = self.cached(request.query) {
                info!(query_fingerprint = %query_fingerprint, "lookup served from cache");
                return LookupResult::Verified(hit);
            }
        }

        // ── Step 3: Consult sources under the count and text budgets ─────────
        let source_cap = request.max_sources.min(self.config.max_sources);
        let url_ctx = UrlContext {
            query: &search,
            subject: request.selection.subject(),
        };
        let extract_ctx = ExtractContext {
            query: &search,
            subject: request.selection.subject(),
            max_items: self.config.max_rss_items,
        };

        let mut consulted = Vec::with_capacity(request.selection.sources.len());
        let mut contributions: Vec<Contribution<'_>> = Vec::new();
        let mut remaining = self.config.max_fetched_text;
        let mut attempted = 0usize;

        for source in &request.selection.sources {
            if attempted >= source_cap || remaining == 0 {
                consulted.push(SourceConsultation::new(&source.name, SourceStatus::BudgetExhausted));
                continue;
            }

            if source.parser == ParserKind::Text && !source.parseable {
                consulted.push(SourceConsultation::new(&source.name, SourceStatus::NonParseable));
                continue;
            }

            let Some(url) = resolve_url(&source.url, url_ctx, self.credentials.as_ref()) else {
                debug!(source = %source.name, "no URL for source, skipping");
                consulted.push(SourceConsultation::new(&source.name, SourceStatus::NoUrl));
                continue;
            };

            attempted += 1;
            let text = match self.consult(source, &url, &extract_ctx).await {
                Ok(text) => text,
                Err(status) => {
                    warn!(source = %source.name, status = %status, "source failed");
                    consulted.push(SourceConsultation::new(&source.name, status));
                    continue;
                }
            };

            let text = truncate_chars(&text, remaining);
            let length = text.chars().count();
            remaining -= length;
            debug!(source = %source.name, text_length = length, remaining, "source succeeded");
            consulted.push(SourceConsultation::success(&source.name, length));
            contributions.push(Contribution { source, text });
        }

        // ── Step 4: Combine, disclose, store ─────────────────────────────────
        if contributions.is_empty() {
            warn!(
                query_fingerprint = %query_fingerprint,
                consulted = consulted.len(),
                "no source produced usable data"
            );
            return LookupResult::Failed(FailedLookup {
                sources_consulted: consulted,
            });
        }

        let data = combine(&contributions);
        let disclosures = disclosures_for(&request, &contributions, &data);
        let sources_used: Vec<String> = contributions.iter().map(|c| c.source.name.clone()).collect();
        let sources_succeeded = contributions.len();
        let confidence = (0.6 + 0.15 * sources_succeeded as f64).min(0.95);

        let cached = serde_json::to_value(CachedAnswer {
            text: data.clone(),
            disclosures: disclosures.clone(),
        })
        .ok()
        .and_then(|value| {
            self.cache
                .set(request.query, value, request.truth_type, sources_used.clone(), confidence)
        });
        let cache_ttl_ms = cached.as_ref().map(|e| e.ttl_ms);
        let verified_at = cached.map(|e| e.verified_at).unwrap_or_else(|| self.clock.now());

        info!(
            query_fingerprint = %query_fingerprint,
            sources_succeeded,
            total_text_fetched = self.config.max_fetched_text - remaining,
            disclosures = disclosures.len(),
            "lookup verified"
        );

        LookupResult::Verified(VerifiedLookup {
            data,
            sources_consulted: consulted,
            sources_used,
            sources_succeeded,
            total_text_fetched: self.config.max_fetched_text - remaining,
            verified_at,
            from_cache: false,
            cache_ttl_ms,
            confidence,
            disclosures,
        })
    }

    fn cached(&self, query: &str) -> Option<VerifiedLookup> {
        let entry = match self.cache.get(query) {
            CacheLookup::Hit(entry) => entry,
            CacheLookup::Miss(reason) => {
                debug!(?reason, "cache miss");
                return None;
            }
        };

        let answer: CachedAnswer = match serde_json::from_value(entry.data.clone()) {
            Ok(answer) => answer,
            Err(e) => {
                warn!(query_fingerprint = %entry.fingerprint, error = %e, "ignoring malformed cache entry");
                return None;
            }
        };

        Some(VerifiedLookup {
            total_text_fetched: answer.text.chars().count(),
            data: answer.text,
            sources_consulted: Vec::new(),
            sources_succeeded: entry.sources_used.len(),
            sources_used: entry.sources_used,
            verified_at: entry.verified_at,
            from_cache: true,
            cache_ttl_ms: Some(entry.ttl_ms),
            confidence: entry.confidence,
            disclosures: answer.disclosures,
        })
    }

    /// Fetch, parse and extract one source. `Err` carries the failure tag.
    async fn consult(
        &self,
        source: &SourceSpec,
        url: &str,
        ctx: &ExtractContext<'_>,
    ) -> Result<String, SourceStatus> {
        let Some(extractor) = self.extractors.get(&source.extractor) else {
            warn!(source = %source.name, extractor = %source.extractor, "unknown extractor");
            return Err(SourceStatus::ExtractorError);
        };

        let timeout = self.config.per_source_timeout();
        let fetched = tokio::time::timeout(timeout, self.fetcher.fetch(url, timeout))
            .await
            .map_err(|_| SourceStatus::Timeout)?
            .map_err(|failure| match failure {
                FetchFailure::Timeout => SourceStatus::Timeout,
                FetchFailure::Status(code) => SourceStatus::HttpError(code),
                FetchFailure::Transport(reason) => {
                    debug!(source = %source.name, reason = %reason, "transport failure");
                    SourceStatus::NetworkError
                }
            })?;

        let payload = match source.parser {
            ParserKind::Json => Payload::Json(
                serde_json::from_str(&fetched.body).map_err(|_| SourceStatus::ParseError)?,
            ),
            ParserKind::Rss => Payload::Feed(fetched.body),
            ParserKind::Text => Payload::Text(fetched.body),
        };

        match catch_unwind(AssertUnwindSafe(|| extractor.extract(&payload, ctx))) {
            Ok(Ok(Some(text))) if text.trim().is_empty() => Err(SourceStatus::NoData),
            Ok(Ok(Some(text))) => Ok(text.trim().to_string()),
            Ok(Ok(None)) => Err(SourceStatus::ExtractionFailed),
            Ok(Err(e)) => {
                debug!(source = %source.name, error = %e, "extractor rejected payload");
                Err(SourceStatus::ExtractorError)
            }
            Err(_) => {
                warn!(source = %source.name, "extractor panicked");
                Err(SourceStatus::ExtractorError)
            }
        }
    }
}

impl std::fmt::Debug for LookupExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupExecutor")
            .field("extractors", &self.extractors)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn combine(contributions: &[Contribution<'_>]) -> String {
    match contributions {
        [only] => only.text.clone(),
        many => many
            .iter()
            .map(|c| format!("{}: {}", c.source.name, c.text))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn is_news_source(source: &SourceSpec) -> bool {
    source.category == SourceCategory::News || source.parser == ParserKind::Rss
}

fn disclosures_for(request: &LookupRequest<'_>, contributions: &[Contribution<'_>], data: &str) -> Vec<String> {
    let mut disclosures = Vec::new();

    let news_contributed = contributions.iter().any(|c| is_news_source(c.source));
    if news_contributed && (request.high_stakes.is_high_stakes || is_reported_claim(request.query)) {
        let lower = data.to_lowercase();
        if !REPUTABLE_OUTLETS.iter().any(|outlet| lower.contains(outlet)) {
            disclosures.push(CORROBORATION_DISCLOSURE.to_string());
        }
    }

    let price_query = request.selection.news_fallback
        || is_price_query(request.query)
        || request
            .selection
            .category()
            .is_some_and(|c| c.is_price_category());
    if price_query && contributions.iter().all(|c| c.source.parser == ParserKind::Rss) {
        disclosures.push(PRICE_WITHOUT_QUOTE_DISCLOSURE.to_string());
    }

    disclosures
}
