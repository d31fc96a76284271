//! Lookup-policy decisions, per-source reports, and lookup results.
//!
//! `LookupResult` is a discriminated `Verified | Failed` type: a failed
//! lookup is the designed trigger for graceful degradation, not an error.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::source::SourceCategory;
use crate::truth::HighStakesDomain;

/// Unique identifier for one pipeline run, carried in logs and responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub uuid::Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ── Lookup requirement ───────────────────────────────────────────────────────

/// Why the requirement policy decided for or against a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum LookupReason {
    EmptyQuery,
    QueryTooLong { chars: usize },
    DocumentReview,
    VolatileTruth,
    FreshnessMarker { marker: String },
    NewsIntent,
    HighStakes { domains: Vec<HighStakesDomain> },
    LowInternalConfidence,
    StableKnowledge,
}

/// How aggressively to verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupPriority {
    None,
    Low,
    Medium,
    High,
}

impl LookupPriority {
    /// Source budget implied by the priority.
    pub fn max_lookups(&self) -> usize {
        match self {
            LookupPriority::None => 0,
            LookupPriority::Low => 1,
            LookupPriority::Medium => 2,
            LookupPriority::High => 3,
        }
    }
}

/// Output of the lookup-requirement policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupRequirement {
    pub required: bool,
    pub max_lookups: usize,
    pub reasons: Vec<LookupReason>,
    pub priority: LookupPriority,
}

impl LookupRequirement {
    pub fn not_required(reason: LookupReason) -> Self {
        Self {
            required: false,
            max_lookups: 0,
            reasons: vec![reason],
            priority: LookupPriority::None,
        }
    }
}

// ── Per-source reporting ─────────────────────────────────────────────────────

/// Outcome of consulting a single source.
///
/// Serialized as the status tag (`success`, `timeout`, `error_503`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Success,
    /// URL resolution yielded nothing (missing credential, unusable query).
    NoUrl,
    NonParseable,
    Timeout,
    HttpError(u16),
    NetworkError,
    ParseError,
    ExtractionFailed,
    NoData,
    ExtractorError,
    BudgetExhausted,
}

impl SourceStatus {
    pub fn tag(&self) -> String {
        match self {
            SourceStatus::Success => "success".to_string(),
            SourceStatus::NoUrl => "no_url".to_string(),
            SourceStatus::NonParseable => "non_parseable".to_string(),
            SourceStatus::Timeout => "timeout".to_string(),
            SourceStatus::HttpError(code) => format!("error_{code}"),
            SourceStatus::NetworkError => "network_error".to_string(),
            SourceStatus::ParseError => "parse_error".to_string(),
            SourceStatus::ExtractionFailed => "extraction_failed".to_string(),
            SourceStatus::NoData => "no_data".to_string(),
            SourceStatus::ExtractorError => "extractor_error".to_string(),
            SourceStatus::BudgetExhausted => "budget_exhausted".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SourceStatus::Success)
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

impl Serialize for SourceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.tag())
    }
}

/// One line of the per-source consultation log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceConsultation {
    pub name: String,
    pub status: SourceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,
}

impl SourceConsultation {
    pub fn new(name: impl Into<String>, status: SourceStatus) -> Self {
        Self {
            name: name.into(),
            status,
            text_length: None,
        }
    }

    pub fn success(name: impl Into<String>, text_length: usize) -> Self {
        Self {
            name: name.into(),
            status: SourceStatus::Success,
            text_length: Some(text_length),
        }
    }
}

// ── Lookup results ───────────────────────────────────────────────────────────

/// At least one source produced usable data (or the cache held it).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedLookup {
    /// Combined extracted text.
    pub data: String,
    pub sources_consulted: Vec<SourceConsultation>,
    /// Names of the sources that contributed to `data`.
    pub sources_used: Vec<String>,
    pub sources_succeeded: usize,
    pub total_text_fetched: usize,
    pub verified_at: DateTime<Utc>,
    pub from_cache: bool,
    /// TTL frozen into the cache entry behind this answer; `None` when it was not cached.
    pub cache_ttl_ms: Option<u64>,
    pub confidence: f64,
    /// Caveats the generation layer must surface verbatim.
    pub disclosures: Vec<String>,
}

/// No source produced usable data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedLookup {
    pub sources_consulted: Vec<SourceConsultation>,
}

/// The result of one `perform_lookup` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LookupResult {
    Verified(VerifiedLookup),
    Failed(FailedLookup),
}

impl LookupResult {
    pub fn success(&self) -> bool {
        matches!(self, LookupResult::Verified(_))
    }

    pub fn sources_consulted(&self) -> &[SourceConsultation] {
        match self {
            LookupResult::Verified(v) => &v.sources_consulted,
            LookupResult::Failed(f) => &f.sources_consulted,
        }
    }

    pub fn total_text_fetched(&self) -> usize {
        match self {
            LookupResult::Verified(v) if !v.from_cache => v.total_text_fetched,
            _ => 0,
        }
    }
}

// ── Degradation ──────────────────────────────────────────────────────────────

/// A concrete place the user can verify manually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationPointer {
    pub name: String,
    pub url: String,
}

/// At most two verification pointers chosen by query domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationPath {
    /// `None` when no domain matched and generic pointers were used.
    pub category: Option<SourceCategory>,
    pub sources: Vec<VerificationPointer>,
}

/// The designed response when no reliable source is available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegradedResponse {
    pub disclosure: String,
    /// The internal answer, explicitly labelled unverified.
    pub fallback_answer: Option<String>,
    pub verification_path: VerificationPath,
    pub max_response_words: usize,
    /// Status tags of the failed sources, for diagnostics.
    pub failure_tags: Vec<String>,
}

impl DegradedResponse {
    /// The short user-facing text: disclosure, optional fallback, pointers.
    pub fn response_text(&self) -> String {
        let mut parts = vec![self.disclosure.clone()];
        if let Some(answer) = &self.fallback_answer {
            parts.push(answer.clone());
        }
        if !self.verification_path.sources.is_empty() {
            let names = self
                .verification_path
                .sources
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(" or ");
            parts.push(format!("Check {names}."));
        }
        parts.join(" ")
    }
}
