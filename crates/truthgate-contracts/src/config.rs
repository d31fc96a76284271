//! Configuration schema for the truthgate pipeline.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration. Loading lives in `truthgate-core::config`.
//!
//! ```toml
//! [cache]
//! volatile_ttl_secs = 300
//!
//! [lookup]
//! per_source_timeout_ms = 5000
//! max_fetched_text = 6000
//!
//! [doctrine]
//! protected_modes = ["business"]
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::truth::TruthType;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TruthgateConfig {
    pub classifier: ClassifierConfig,
    pub cache: CacheConfig,
    pub requirement: RequirementConfig,
    pub lookup: LookupConfig,
    pub degradation: DegradationConfig,
    pub doctrine: DoctrineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Inputs longer than this (in chars) are document-review candidates.
    pub document_review_min_chars: usize,
    /// Inputs are truncated to this many chars before any regex scan.
    pub max_query_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            document_review_min_chars: 10_000,
            max_query_chars: 50_000,
        }
    }
}

/// TTL table per truth class, in seconds. Read when an entry is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub volatile_ttl_secs: u64,
    pub semi_stable_ttl_secs: u64,
    pub permanent_ttl_secs: u64,
    pub document_review_ttl_secs: u64,
    pub ambiguous_ttl_secs: u64,
}

impl CacheConfig {
    /// TTL for `truth_type`; a zero TTL means the class is never cached.
    pub fn ttl_for(&self, truth_type: TruthType) -> Duration {
        let secs = match truth_type {
            TruthType::Volatile => self.volatile_ttl_secs,
            TruthType::SemiStable => self.semi_stable_ttl_secs,
            TruthType::Permanent => self.permanent_ttl_secs,
            TruthType::DocumentReview => self.document_review_ttl_secs,
            TruthType::Ambiguous => self.ambiguous_ttl_secs,
        };
        Duration::from_secs(secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            volatile_ttl_secs: 5 * 60,
            semi_stable_ttl_secs: 24 * 60 * 60,
            permanent_ttl_secs: 30 * 24 * 60 * 60,
            document_review_ttl_secs: 0,
            ambiguous_ttl_secs: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementConfig {
    /// Queries longer than this never trigger a lookup.
    pub max_query_chars: usize,
    /// Below this internal confidence, semi-stable claims are re-verified.
    pub semi_stable_confidence_floor: f64,
    /// At or above this classifier confidence, permanent claims skip lookup.
    pub permanent_confidence_ceiling: f64,
}

impl Default for RequirementConfig {
    fn default() -> Self {
        Self {
            max_query_chars: 10_000,
            semi_stable_confidence_floor: 0.7,
            permanent_confidence_ceiling: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub max_sources: usize,
    pub per_source_timeout_ms: u64,
    /// Global cap on extracted text (chars) per lookup call.
    pub max_fetched_text: usize,
    pub max_rss_items: usize,
    pub user_agent: String,
    /// Cleaned search strings are cut to this many chars as a last resort.
    pub max_search_query_chars: usize,
    /// Response bodies are read up to this many bytes; the rest is dropped unread.
    pub max_body_bytes: usize,
}

impl LookupConfig {
    pub fn per_source_timeout(&self) -> Duration {
        Duration::from_millis(self.per_source_timeout_ms)
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            max_sources: 3,
            per_source_timeout_ms: 5_000,
            max_fetched_text: 6_000,
            max_rss_items: 5,
            user_agent: concat!("truthgate/", env!("CARGO_PKG_VERSION")).to_string(),
            max_search_query_chars: 100,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DegradationConfig {
    pub max_response_words: usize,
}

impl DegradationConfig {
    /// Room for the fixed disclosure and the wordiest pair of verification pointers.
    pub const MIN_RESPONSE_WORDS: usize = 14;
}

impl Default for DegradationConfig {
    fn default() -> Self {
        Self {
            max_response_words: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoctrineConfig {
    pub protected_modes: Vec<String>,
    pub low_confidence_threshold: f64,
    pub volatile_max_ttl_secs: u64,
}

impl DoctrineConfig {
    pub fn is_protected(&self, mode: &str) -> bool {
        self.protected_modes.iter().any(|m| m.eq_ignore_ascii_case(mode))
    }
}

impl Default for DoctrineConfig {
    fn default() -> Self {
        Self {
            protected_modes: vec!["business".to_string()],
            low_confidence_threshold: 0.5,
            volatile_max_ttl_secs: 5 * 60,
        }
    }
}
