//! Post-generation enforcement types.
//!
//! The doctrine enforcer runs a fixed battery of gates over a generated
//! response and its metadata. Each gate returns a `GateVerdict`; the
//! enforcer folds them into one `EnforcementOutcome` per response.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::SourceClass;
use crate::truth::{HighStakes, TruthType};

/// What kind of claim the response makes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    #[default]
    General,
    /// A statement about the operator's own business policy (returns, pricing, terms).
    BusinessPolicy,
}

/// Which authority governs business-policy claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyHierarchy {
    /// Internal vault documents are authoritative; external sources may not override them.
    VaultFirst,
    ExternalFirst,
}

/// The named operating mode a response is produced under.
///
/// Whether a mode is protected is decided by configuration, not by the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperatingMode(pub String);

impl OperatingMode {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn standard() -> Self {
        Self("standard".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OperatingMode {
    fn default() -> Self {
        Self::standard()
    }
}

/// Everything the gates know about a response besides its text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub truth_type: Option<TruthType>,
    pub confidence: Option<f64>,
    pub source_class: Option<SourceClass>,
    pub verified_at: Option<DateTime<Utc>>,
    /// True when live external verification actually produced data.
    pub external_verification: bool,
    /// TTL of the cache entry backing the claim, if one was set.
    pub cache_ttl_ms: Option<u64>,
    pub lookup_attempted: bool,
    pub lookup_failed: bool,
    /// The response is a known graceful-degradation case.
    pub degraded: bool,
    pub claim_kind: ClaimKind,
    pub policy_hierarchy: Option<PolicyHierarchy>,
    /// An external source replaced an answer the governing hierarchy said to take from the vault.
    pub hierarchy_overridden: bool,
    #[serde(default)]
    pub high_stakes: HighStakes,
}

// ── Gates ─────────────────────────────────────────────────────────────────────

/// The five doctrine gates, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateName {
    Truth,
    Provenance,
    Volatility,
    BusinessPolicy,
    Disclosure,
}

impl GateName {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateName::Truth => "truth",
            GateName::Provenance => "provenance",
            GateName::Volatility => "volatility",
            GateName::BusinessPolicy => "business_policy",
            GateName::Disclosure => "disclosure",
        }
    }
}

impl fmt::Display for GateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A textual fix a gate proposes for the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Correction {
    Prepend(String),
    Append(String),
}

impl Correction {
    /// Apply the correction to `response`.
    pub fn apply(&self, response: &str) -> String {
        match self {
            Correction::Prepend(text) => format!("{text}\n\n{response}"),
            Correction::Append(text) => format!("{response}\n\n{text}"),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Correction::Prepend(t) | Correction::Append(t) => t,
        }
    }
}

/// What a single gate decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum GateVerdict {
    Passed,
    Violation {
        message: String,
        /// `None` for metadata-only violations the gate cannot fix by editing text.
        correction: Option<Correction>,
        /// Non-blocking violations still count as a passed enforcement run.
        blocking: bool,
    },
}

impl GateVerdict {
    pub fn passed(&self) -> bool {
        matches!(self, GateVerdict::Passed)
    }
}

/// Per-gate entry in the enforcement outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    pub passed: bool,
    pub violation: Option<String>,
    pub correction: Option<Correction>,
}

impl From<&GateVerdict> for GateResult {
    fn from(verdict: &GateVerdict) -> Self {
        match verdict {
            GateVerdict::Passed => GateResult {
                passed: true,
                violation: None,
                correction: None,
            },
            GateVerdict::Violation {
                message,
                correction,
                ..
            } => GateResult {
                passed: false,
                violation: Some(message.clone()),
                correction: correction.clone(),
            },
        }
    }
}

/// One recorded violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub gate: GateName,
    pub message: String,
    pub blocking: bool,
}

/// Result of running every gate over one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnforcementOutcome {
    /// Gate results in evaluation order.
    pub gate_results: Vec<(GateName, GateResult)>,
    pub violations: Vec<Violation>,
    /// Present when at least one textual correction was applied. Callers must use it.
    pub corrected_response: Option<String>,
    /// False when any blocking violation was recorded.
    pub enforcement_passed: bool,
}

impl EnforcementOutcome {
    pub fn gate(&self, name: GateName) -> Option<&GateResult> {
        self.gate_results
            .iter()
            .find(|(gate, _)| *gate == name)
            .map(|(_, result)| result)
    }

    /// The text to deliver: the corrected response when present, else `original`.
    pub fn final_text(&self, original: &str) -> String {
        self.corrected_response
            .clone()
            .unwrap_or_else(|| original.to_string())
    }
}

// ── Reasoning escalation ──────────────────────────────────────────────────────

/// Structural steps a bounded-reasoning response must show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningMarker {
    KnownFacts,
    Unknowns,
    Parallels,
    BoundedScenarios,
    ConfidenceRaisers,
}

impl ReasoningMarker {
    pub fn all() -> [ReasoningMarker; 5] {
        [
            ReasoningMarker::KnownFacts,
            ReasoningMarker::Unknowns,
            ReasoningMarker::Parallels,
            ReasoningMarker::BoundedScenarios,
            ReasoningMarker::ConfidenceRaisers,
        ]
    }
}

/// Caller-supplied context for the escalation check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EscalationContext {
    pub truth_type: Option<TruthType>,
    pub confidence: Option<f64>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationVerdict {
    /// Bounded reasoning was not required; nothing was checked.
    NotRequired,
    Sufficient,
    /// Too few markers, but no premature-termination language either.
    Weak,
    /// Too few markers and the response terminates early; a scaffold was appended.
    Insufficient,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationOutcome {
    pub verdict: EscalationVerdict,
    pub markers_present: Vec<ReasoningMarker>,
    pub markers_missing: Vec<ReasoningMarker>,
    pub premature_termination: bool,
    /// Present when a scaffold was appended.
    pub corrected_response: Option<String>,
}
