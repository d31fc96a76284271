//! Extractor capability interface and registry.
//!
//! An extractor turns one parsed payload into a short piece of text, or
//! `None` when the payload holds nothing usable. Sources name their
//! extractor in the catalog; the registry resolves the name at lookup time.
//!
//! `Err` means the payload could not be interpreted at all (wrong shape,
//! wrong kind). The executor records that as `extractor_error` and moves on.

use std::collections::HashMap;

use truthgate_contracts::{
    error::{TruthgateError, TruthgateResult},
    source::{ParserKind, Payload},
};

use crate::extractors;

/// What an extractor may consult besides the payload.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    /// The cleaned search string.
    pub query: &'a str,
    pub subject: Option<&'a str>,
    /// Upper bound on list items (headlines, search hits) to emit.
    pub max_items: usize,
}

/// A pure `(payload, query) -> text` function for one parser kind.
pub trait Extractor: Send + Sync {
    /// The payload kind this extractor accepts.
    fn parser(&self) -> ParserKind;

    fn extract(&self, payload: &Payload, ctx: &ExtractContext<'_>) -> TruthgateResult<Option<String>>;
}

/// Named extractors, resolved by the name a catalog entry declares.
pub struct ExtractorRegistry {
    extractors: HashMap<String, Box<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// A registry holding every built-in extractor.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("crypto_prices", Box::new(extractors::CryptoPrices));
        registry.register("exchange_rates", Box::new(extractors::ExchangeRates));
        registry.register("metal_price", Box::new(extractors::MetalPrice));
        registry.register("stock_quote", Box::new(extractors::StockQuote));
        registry.register("wikipedia_search", Box::new(extractors::WikipediaSearch));
        registry.register("openfda_label", Box::new(extractors::OpenFdaLabel));
        registry.register("wttr_weather", Box::new(extractors::WttrWeather));
        registry.register("rss_headlines", Box::new(extractors::RssHeadlines));
        registry.register("plain_text", Box::new(extractors::PlainText));
        registry
    }

    /// Register `extractor` under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, extractor: Box<dyn Extractor>) {
        self.extractors.insert(name.into(), extractor);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Extractor> {
        self.extractors.get(name).map(|e| e.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("extractors", &self.names())
            .finish()
    }
}

// ── Payload helpers ───────────────────────────────────────────────────────────

fn wrong_kind(extractor: &str, expected: ParserKind, payload: &Payload) -> TruthgateError {
    let got = match payload {
        Payload::Json(_) => "json",
        Payload::Feed(_) => "rss",
        Payload::Text(_) => "text",
    };
    TruthgateError::ExtractionError {
        extractor: extractor.to_string(),
        reason: format!("expected {} payload, got {}", expected.as_str(), got),
    }
}

pub(crate) fn expect_json<'p>(extractor: &str, payload: &'p Payload) -> TruthgateResult<&'p serde_json::Value> {
    match payload {
        Payload::Json(value) => Ok(value),
        other => Err(wrong_kind(extractor, ParserKind::Json, other)),
    }
}

pub(crate) fn expect_feed<'p>(extractor: &str, payload: &'p Payload) -> TruthgateResult<&'p str> {
    match payload {
        Payload::Feed(xml) => Ok(xml),
        other => Err(wrong_kind(extractor, ParserKind::Rss, other)),
    }
}

pub(crate) fn expect_text<'p>(extractor: &str, payload: &'p Payload) -> TruthgateResult<&'p str> {
    match payload {
        Payload::Text(text) => Ok(text),
        other => Err(wrong_kind(extractor, ParserKind::Text, other)),
    }
}

/// Resolve a dot-notation path (`"current_condition.0.temp_C"`) against a
/// JSON value. Numeric segments index arrays. Returns `None` when any segment
/// is missing or the value is JSON `null`.
pub fn resolve_path<'v>(value: &'v serde_json::Value, path: &str) -> Option<&'v serde_json::Value> {
    let mut current = value;
    for segment in path.split('.') {
        let next = match segment.parse::<usize>() {
            Ok(index) if current.is_array() => current.get(index),
            _ => current.get(segment),
        };
        match next {
            Some(v) if !v.is_null() => current = v,
            _ => return None,
        }
    }
    Some(current)
}

/// A JSON string or number at `path`, as text.
pub(crate) fn text_at(value: &serde_json::Value, path: &str) -> Option<String> {
    match resolve_path(value, path)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A JSON number (or numeric string) at `path`.
pub(crate) fn number_at(value: &serde_json::Value, path: &str) -> Option<f64> {
    match resolve_path(value, path)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}

/// Cut `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use truthgate_contracts::{error::TruthgateError, source::Payload};

    use super::*;

    #[test]
    fn defaults_are_all_registered() {
        let registry = ExtractorRegistry::with_defaults();
        assert_eq!(
            registry.names(),
            [
                "crypto_prices",
                "exchange_rates",
                "metal_price",
                "openfda_label",
                "plain_text",
                "rss_headlines",
                "stock_quote",
                "wikipedia_search",
                "wttr_weather",
            ]
        );
    }

    #[test]
    fn resolve_path_walks_arrays_and_objects() {
        let v = json!({"a": [{"b": "x"}, {"b": null}]});
        assert_eq!(resolve_path(&v, "a.0.b"), Some(&json!("x")));
        assert_eq!(resolve_path(&v, "a.1.b"), None);
        assert_eq!(resolve_path(&v, "a.5.b"), None);
    }

    #[test]
    fn numeric_helpers_accept_strings() {
        let v = json!({"price": "189.3000", "pct": "0.64%", "n": 3});
        assert_eq!(number_at(&v, "price"), Some(189.3));
        assert_eq!(number_at(&v, "pct"), Some(0.64));
        assert_eq!(text_at(&v, "n").as_deref(), Some("3"));
    }

    #[test]
    fn wrong_payload_kind_is_extraction_error() {
        let registry = ExtractorRegistry::with_defaults();
        let extractor = registry.get("crypto_prices").unwrap();
        let ctx = ExtractContext {
            query: "bitcoin",
            subject: None,
            max_items: 5,
        };
        let err = extractor
            .extract(&Payload::Text("<html></html>".into()), &ctx)
            .unwrap_err();
        assert!(matches!(err, TruthgateError::ExtractionError { .. }));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
