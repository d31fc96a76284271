//! Truth-volatility classes and classifier output.
//!
//! A `TruthClassification` is computed fresh for every query and is never
//! persisted. Downstream stages read `truth_type` to pick a TTL, decide how
//! hard to look for live confirmation, and which doctrine gates apply.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse estimate of how quickly a fact can become outdated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TruthType {
    /// Changes within minutes or hours (prices, scores, breaking news).
    Volatile,
    /// Changes over days to months (office holders, rankings, policies).
    SemiStable,
    /// Effectively fixed (definitions, history, procedures).
    Permanent,
    /// A long document submitted for review; never looked up, never cached.
    DocumentReview,
    /// No usable signal in the query text.
    Ambiguous,
}

impl TruthType {
    /// Stable upper-case label used in logs and serialized metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            TruthType::Volatile => "VOLATILE",
            TruthType::SemiStable => "SEMI_STABLE",
            TruthType::Permanent => "PERMANENT",
            TruthType::DocumentReview => "DOCUMENT_REVIEW",
            TruthType::Ambiguous => "AMBIGUOUS",
        }
    }

    /// All classes, in declaration order.
    pub fn all() -> [TruthType; 5] {
        [
            TruthType::Volatile,
            TruthType::SemiStable,
            TruthType::Permanent,
            TruthType::DocumentReview,
            TruthType::Ambiguous,
        ]
    }
}

impl fmt::Display for TruthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TruthType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "VOLATILE" => Ok(TruthType::Volatile),
            "SEMI_STABLE" => Ok(TruthType::SemiStable),
            "PERMANENT" => Ok(TruthType::Permanent),
            "DOCUMENT_REVIEW" => Ok(TruthType::DocumentReview),
            "AMBIGUOUS" => Ok(TruthType::Ambiguous),
            other => Err(format!("unknown truth type '{other}'")),
        }
    }
}

/// Which classifier stage produced the final answer.
///
/// Serialized as the bare stage number (0, 1 or 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ClassifierStage {
    /// Input validation, document review and stable-procedural detection.
    PreCheck,
    /// Marker-pattern scoring.
    PatternScoring,
    /// Ambiguous-query fallback.
    Fallback,
}

impl From<ClassifierStage> for u8 {
    fn from(stage: ClassifierStage) -> u8 {
        match stage {
            ClassifierStage::PreCheck => 0,
            ClassifierStage::PatternScoring => 1,
            ClassifierStage::Fallback => 2,
        }
    }
}

impl TryFrom<u8> for ClassifierStage {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(ClassifierStage::PreCheck),
            1 => Ok(ClassifierStage::PatternScoring),
            2 => Ok(ClassifierStage::Fallback),
            other => Err(format!("invalid classifier stage {other}")),
        }
    }
}

/// A topic category where unverified answers carry outsized harm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighStakesDomain {
    Medical,
    Legal,
    Financial,
    Safety,
}

impl HighStakesDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            HighStakesDomain::Medical => "medical",
            HighStakesDomain::Legal => "legal",
            HighStakesDomain::Financial => "financial",
            HighStakesDomain::Safety => "safety",
        }
    }
}

/// Output of the high-stakes domain detector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighStakes {
    pub is_high_stakes: bool,
    pub domains: BTreeSet<HighStakesDomain>,
}

impl HighStakes {
    /// Build from a set of detected domains; `is_high_stakes` follows non-emptiness.
    pub fn from_domains(domains: BTreeSet<HighStakesDomain>) -> Self {
        Self {
            is_high_stakes: !domains.is_empty(),
            domains,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn contains(&self, domain: HighStakesDomain) -> bool {
        self.domains.contains(&domain)
    }
}

/// The classifier's verdict for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthClassification {
    #[serde(rename = "type")]
    pub truth_type: TruthType,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub stage: ClassifierStage,
    /// Rule ids of every marker that matched, in rule-table order.
    pub matched_patterns: Vec<String>,
    pub high_stakes: HighStakes,
    pub conflict_detected: bool,
    /// Set for document reviews: the query is input to analyse, not a fact to verify.
    pub skip_external_lookup: bool,
    /// Short human-readable explanation of the decision.
    pub reason: String,
    /// Present when the stage-2 fallback failed and the last-resort default was used.
    pub fallback_error: Option<String>,
}

impl TruthClassification {
    /// True when the class is one of the three TTL-ranked classes.
    pub fn is_cacheable_class(&self) -> bool {
        matches!(
            self.truth_type,
            TruthType::Volatile | TruthType::SemiStable | TruthType::Permanent
        )
    }
}
