//! What the pipeline hands back to its caller.

use chrono::{DateTime, Utc};
use serde::Serialize;

use truthgate_contracts::{
    doctrine::{EnforcementOutcome, EscalationOutcome, ResponseMetadata},
    lookup::{
        DegradedResponse, FailedLookup, LookupPriority, LookupReason, LookupRequirement, RequestId,
        VerificationPath, VerifiedLookup,
    },
    truth::{TruthClassification, TruthType},
};

/// Caller-supplied knobs for one lookup.
#[derive(Debug, Clone, Default)]
pub struct LookupOptions {
    /// The generation layer's confidence in its own answer.
    pub internal_confidence: Option<f64>,
    /// The generation layer's own answer, offered as a labelled fallback on degradation.
    pub internal_answer: Option<String>,
    pub force_refresh: bool,
}

/// How the lookup stage ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LookupOutcome {
    /// The requirement policy decided no verification was needed.
    NotRequired,
    Cached(VerifiedLookup),
    Verified(VerifiedLookup),
    Degraded {
        response: DegradedResponse,
        /// `None` when no source was available to try.
        failure: Option<FailedLookup>,
    },
}

/// Result of `TruthPipeline::lookup`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResponse {
    pub request_id: RequestId,
    pub query: String,
    pub classification: TruthClassification,
    pub requirement: LookupRequirement,
    /// TTL the cache policy currently assigns to this truth class; zero when never cached.
    /// Doctrine checks use the stored entry's TTL instead, see `cache_ttl_ms`.
    pub truth_ttl_ms: u64,
    pub internal_confidence: Option<f64>,
    pub outcome: LookupOutcome,
}

impl PipelineResponse {
    fn verified(&self) -> Option<&VerifiedLookup> {
        match &self.outcome {
            LookupOutcome::Cached(v) | LookupOutcome::Verified(v) => Some(v),
            _ => None,
        }
    }

    /// False only when the lookup degraded.
    pub fn success(&self) -> bool {
        !self.degraded()
    }

    pub fn lookup_performed(&self) -> bool {
        !matches!(self.outcome, LookupOutcome::NotRequired)
    }

    pub fn from_cache(&self) -> bool {
        matches!(self.outcome, LookupOutcome::Cached(_))
    }

    pub fn degraded(&self) -> bool {
        matches!(self.outcome, LookupOutcome::Degraded { .. })
    }

    pub fn data(&self) -> Option<&str> {
        self.verified().map(|v| v.data.as_str())
    }

    pub fn sources_used(&self) -> &[String] {
        self.verified().map(|v| v.sources_used.as_slice()).unwrap_or_default()
    }

    pub fn confidence(&self) -> Option<f64> {
        self.verified().map(|v| v.confidence)
    }

    pub fn verified_at(&self) -> Option<DateTime<Utc>> {
        self.verified().map(|v| v.verified_at)
    }

    /// TTL of the cache entry that backs the answer, as stored.
    pub fn cache_ttl_ms(&self) -> Option<u64> {
        self.verified().and_then(|v| v.cache_ttl_ms)
    }

    pub fn truth_type(&self) -> TruthType {
        self.classification.truth_type
    }

    pub fn lookup_reasons(&self) -> &[LookupReason] {
        &self.requirement.reasons
    }

    pub fn lookup_priority(&self) -> LookupPriority {
        self.requirement.priority
    }

    /// Text the generation layer must surface verbatim, if any.
    pub fn disclosure(&self) -> Option<String> {
        match &self.outcome {
            LookupOutcome::Degraded { response, .. } => Some(response.response_text()),
            LookupOutcome::Cached(v) | LookupOutcome::Verified(v) if !v.disclosures.is_empty() => {
                Some(v.disclosures.join(" "))
            }
            _ => None,
        }
    }

    pub fn verification_path(&self) -> Option<&VerificationPath> {
        match &self.outcome {
            LookupOutcome::Degraded { response, .. } => Some(&response.verification_path),
            _ => None,
        }
    }
}

/// Result of `TruthPipeline::respond`: the text to deliver and how it was checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalResponse {
    pub request_id: RequestId,
    /// The text to deliver, with every correction applied.
    pub text: String,
    pub lookup: PipelineResponse,
    pub metadata: ResponseMetadata,
    pub enforcement: EnforcementOutcome,
    pub escalation: EscalationOutcome,
    pub bounded_reasoning_required: bool,
    /// Set when the generator failed and the degradation text was used instead.
    pub generation_error: Option<String>,
}
