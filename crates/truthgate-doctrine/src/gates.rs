//! The five doctrine gates.
//!
//! Each gate is a pure check over `(response, metadata, mode)`. Gates that
//! can fix the problem by editing text return a `Correction`; gates that
//! detect an upstream configuration defect (provenance, volatility) return a
//! metadata-only violation.
//!
//! Every correcting gate passes once its own correction text is present, so
//! enforcing an already-corrected response changes nothing.

use std::sync::LazyLock;

use regex::Regex;

use truthgate_contracts::{
    cache::SourceClass,
    config::DoctrineConfig,
    doctrine::{
        ClaimKind, Correction, GateName, GateVerdict, OperatingMode, PolicyHierarchy,
        ResponseMetadata,
    },
    truth::TruthType,
};

/// Prepended by the truth gate.
pub const TRUTH_DISCLAIMER: &str = "Transparency note: this answer has not been verified against current external sources and may be outdated.";

/// Appended by the business-policy gate.
pub const POLICY_RECONCILE_NOTE: &str = "Policy note: this answer draws on external information. Reconcile it with the internal policy documentation before relying on it.";

pub const DEGRADED_NOTE: &str = "Note: live data was unavailable for this answer, so please verify it with a current source.";
pub const LOOKUP_FAILED_NOTE: &str = "Note: a live lookup was attempted but failed, so this answer could not be verified.";
pub const LOW_CONFIDENCE_NOTE: &str = "Note: confidence in this answer is low, so please verify it independently.";

static DISCLOSURE_LANGUAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\bunverified\b|\bmay be (outdated|out of date|inaccurate)\b|\bnot been verified\b|\bcould not be verified\b|\bcouldn'?t verify\b|\bunable to (verify|confirm)\b|\bcan'?t access current\b|\bcannot access current\b|\bplease verify\b|\bverify (it|this) (with|independently)\b|\bmay not be current\b|\btransparency note\b)",
    )
    .unwrap()
});

/// True when `text` already discloses uncertainty.
pub fn has_disclosure_language(text: &str) -> bool {
    DISCLOSURE_LANGUAGE.is_match(text)
}

/// One post-generation check.
pub trait DoctrineGate: Send + Sync {
    fn name(&self) -> GateName;

    fn check(&self, response: &str, metadata: &ResponseMetadata, mode: &OperatingMode) -> GateVerdict;
}

fn correctable(message: String, correction: Correction, blocking: bool) -> GateVerdict {
    GateVerdict::Violation {
        message,
        correction: Some(correction),
        blocking,
    }
}

fn metadata_only(message: String) -> GateVerdict {
    GateVerdict::Violation {
        message,
        correction: None,
        blocking: true,
    }
}

// ── Truth ────────────────────────────────────────────────────────────────────

/// Low-confidence, unverified, non-permanent claims must carry a disclaimer.
///
/// A missing confidence counts as zero.
#[derive(Debug, Clone)]
pub struct TruthGate {
    pub low_confidence_threshold: f64,
}

impl DoctrineGate for TruthGate {
    fn name(&self) -> GateName {
        GateName::Truth
    }

    fn check(&self, response: &str, metadata: &ResponseMetadata, _mode: &OperatingMode) -> GateVerdict {
        let confidence = metadata.confidence.unwrap_or(0.0);
        let permanent = metadata.truth_type == Some(TruthType::Permanent);
        if confidence >= self.low_confidence_threshold
            || metadata.external_verification
            || permanent
            || response.contains(TRUTH_DISCLAIMER)
        {
            return GateVerdict::Passed;
        }
        correctable(
            format!(
                "confidence {confidence:.2} is below {:.2} with no external verification",
                self.low_confidence_threshold
            ),
            Correction::Prepend(TRUTH_DISCLAIMER.to_string()),
            true,
        )
    }
}

// ── Provenance ───────────────────────────────────────────────────────────────

/// Externally sourced claims must carry complete provenance.
#[derive(Debug, Clone, Default)]
pub struct ProvenanceGate;

impl DoctrineGate for ProvenanceGate {
    fn name(&self) -> GateName {
        GateName::Provenance
    }

    fn check(&self, _response: &str, metadata: &ResponseMetadata, _mode: &OperatingMode) -> GateVerdict {
        let external =
            metadata.source_class == Some(SourceClass::External) || metadata.external_verification;
        if !external {
            return GateVerdict::Passed;
        }

        let missing: Vec<&str> = [
            ("source_class", metadata.source_class.is_none()),
            ("verified_at", metadata.verified_at.is_none()),
            ("confidence", metadata.confidence.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect();

        if missing.is_empty() {
            GateVerdict::Passed
        } else {
            metadata_only(format!(
                "external claim is missing provenance: {}",
                missing.join(", ")
            ))
        }
    }
}

// ── Volatility ───────────────────────────────────────────────────────────────

/// Volatile claims must never be backed by a cache entry that outlives the volatile TTL.
#[derive(Debug, Clone)]
pub struct VolatilityGate {
    pub max_ttl_ms: u64,
}

impl DoctrineGate for VolatilityGate {
    fn name(&self) -> GateName {
        GateName::Volatility
    }

    fn check(&self, _response: &str, metadata: &ResponseMetadata, _mode: &OperatingMode) -> GateVerdict {
        match (metadata.truth_type, metadata.cache_ttl_ms) {
            (Some(TruthType::Volatile), Some(ttl_ms)) if ttl_ms > self.max_ttl_ms => metadata_only(format!(
                "volatile claim cached for {ttl_ms} ms, above the {} ms ceiling",
                self.max_ttl_ms
            )),
            _ => GateVerdict::Passed,
        }
    }
}

// ── Business policy ──────────────────────────────────────────────────────────

/// In protected modes, business-policy claims come from the vault, not the web.
#[derive(Debug, Clone)]
pub struct BusinessPolicyGate {
    pub protected_modes: Vec<String>,
}

impl BusinessPolicyGate {
    fn is_protected(&self, mode: &OperatingMode) -> bool {
        self.protected_modes
            .iter()
            .any(|m| m.eq_ignore_ascii_case(mode.as_str()))
    }
}

impl DoctrineGate for BusinessPolicyGate {
    fn name(&self) -> GateName {
        GateName::BusinessPolicy
    }

    fn check(&self, response: &str, metadata: &ResponseMetadata, mode: &OperatingMode) -> GateVerdict {
        if !self.is_protected(mode)
            || metadata.claim_kind != ClaimKind::BusinessPolicy
            || response.contains(POLICY_RECONCILE_NOTE)
        {
            return GateVerdict::Passed;
        }

        let message = if metadata.source_class == Some(SourceClass::External) {
            format!("business-policy claim sourced externally in protected mode '{}'", mode.as_str())
        } else if metadata.policy_hierarchy == Some(PolicyHierarchy::VaultFirst) && metadata.hierarchy_overridden {
            format!(
                "vault-first hierarchy overridden by an external source in protected mode '{}'",
                mode.as_str()
            )
        } else {
            return GateVerdict::Passed;
        };

        correctable(message, Correction::Append(POLICY_RECONCILE_NOTE.to_string()), true)
    }
}

// ── Disclosure ───────────────────────────────────────────────────────────────

/// Uncertain responses must say so. Never blocks.
#[derive(Debug, Clone)]
pub struct DisclosureGate {
    pub low_confidence_threshold: f64,
}

impl DoctrineGate for DisclosureGate {
    fn name(&self) -> GateName {
        GateName::Disclosure
    }

    fn check(&self, response: &str, metadata: &ResponseMetadata, _mode: &OperatingMode) -> GateVerdict {
        let low_confidence = metadata
            .confidence
            .is_some_and(|c| c < self.low_confidence_threshold);

        let (reason, note) = if metadata.degraded {
            ("response is a degraded answer", DEGRADED_NOTE)
        } else if metadata.lookup_attempted && metadata.lookup_failed {
            ("lookup was attempted and failed", LOOKUP_FAILED_NOTE)
        } else if low_confidence {
            ("confidence is low", LOW_CONFIDENCE_NOTE)
        } else {
            return GateVerdict::Passed;
        };

        if has_disclosure_language(response) {
            return GateVerdict::Passed;
        }
        correctable(
            format!("{reason} but the text carries no disclosure"),
            Correction::Append(note.to_string()),
            false,
        )
    }
}

/// The standard battery, in evaluation order.
pub fn standard_gates(config: &DoctrineConfig) -> Vec<Box<dyn DoctrineGate>> {
    vec![
        Box::new(TruthGate {
            low_confidence_threshold: config.low_confidence_threshold,
        }),
        Box::new(ProvenanceGate),
        Box::new(VolatilityGate {
            max_ttl_ms: config.volatile_max_ttl_secs.saturating_mul(1000),
        }),
        Box::new(BusinessPolicyGate {
            protected_modes: config.protected_modes.clone(),
        }),
        Box::new(DisclosureGate {
            low_confidence_threshold: config.low_confidence_threshold,
        }),
    ]
}
