//! External data-source definitions.
//!
//! Sources are immutable catalog entries declared in TOML and loaded once at
//! process start. Each one names a URL rule, a parser kind, and the extractor
//! that turns a parsed payload into a short piece of text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The domain a query (and a source) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCategory {
    Crypto,
    Currency,
    Stock,
    Commodity,
    Government,
    Medical,
    Weather,
    News,
    General,
}

impl SourceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceCategory::Crypto => "crypto",
            SourceCategory::Currency => "currency",
            SourceCategory::Stock => "stock",
            SourceCategory::Commodity => "commodity",
            SourceCategory::Government => "government",
            SourceCategory::Medical => "medical",
            SourceCategory::Weather => "weather",
            SourceCategory::News => "news",
            SourceCategory::General => "general",
        }
    }

    /// Categories whose queries ask for a quoted number.
    pub fn is_price_category(&self) -> bool {
        matches!(
            self,
            SourceCategory::Crypto
                | SourceCategory::Currency
                | SourceCategory::Stock
                | SourceCategory::Commodity
        )
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a source's request URL is produced.
///
/// Templates may contain `{query}`, `{subject}` and (for key-gated sources)
/// `{key}` placeholders.
///
/// ```toml
/// [sources.url]
/// rule = "env-key-gated"
/// env_var = "ALPHAVANTAGE_API_KEY"
/// template = "https://www.alphavantage.co/query?function=GLOBAL_QUOTE&symbol={subject}&apikey={key}"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum UrlRule {
    /// A fixed URL.
    Static { url: String },
    /// Built from the cleaned query.
    QueryBuilt { template: String },
    /// Requires a credential read from `env_var`; resolves to nothing when absent.
    EnvKeyGated { env_var: String, template: String },
}

impl UrlRule {
    /// The credential variable this rule depends on, if any.
    pub fn required_credential(&self) -> Option<&str> {
        match self {
            UrlRule::EnvKeyGated { env_var, .. } => Some(env_var.as_str()),
            _ => None,
        }
    }
}

/// How a fetched body is parsed before extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    Json,
    Rss,
    Text,
}

impl ParserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParserKind::Json => "json",
            ParserKind::Rss => "rss",
            ParserKind::Text => "text",
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Stable identifier, reported in `sources_consulted`.
    pub name: String,
    pub category: SourceCategory,
    pub url: UrlRule,
    pub parser: ParserKind,
    /// Name of the registered extractor applied to the parsed payload.
    pub extractor: String,
    /// Text sources are only processed when explicitly marked parseable.
    #[serde(default)]
    pub parseable: bool,
}

/// A fetched body after parsing by declared kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    /// Raw feed XML.
    Feed(String),
    Text(String),
}
