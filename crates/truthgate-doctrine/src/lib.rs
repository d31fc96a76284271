//! # truthgate-doctrine
//!
//! Post-generation enforcement.
//!
//! - [`DoctrineEnforcer`] runs the five [`DoctrineGate`]s (truth, provenance,
//!   volatility, business-policy, disclosure) over a generated response and
//!   returns the corrected text plus every violation.
//! - [`ReasoningEscalationEnforcer`] checks that a response produced without
//!   verified data still shows its reasoning, and scaffolds it when it does not.

pub mod enforcer;
pub mod escalation;
pub mod gates;

pub use enforcer::DoctrineEnforcer;
pub use escalation::ReasoningEscalationEnforcer;
pub use gates::{has_disclosure_language, DoctrineGate};

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use truthgate_contracts::{
        cache::SourceClass,
        config::DoctrineConfig,
        doctrine::{ClaimKind, GateName, OperatingMode, ResponseMetadata},
        truth::TruthType,
    };

    use crate::gates::{LOW_CONFIDENCE_NOTE, POLICY_RECONCILE_NOTE, TRUTH_DISCLAIMER};
    use crate::DoctrineEnforcer;

    fn enforcer() -> DoctrineEnforcer {
        DoctrineEnforcer::new(&DoctrineConfig::default())
    }

    fn unverified_guess() -> ResponseMetadata {
        ResponseMetadata {
            truth_type: Some(TruthType::SemiStable),
            confidence: Some(0.3),
            ..ResponseMetadata::default()
        }
    }

    // ── Ordering ─────────────────────────────────────────────────────────────

    #[test]
    fn gates_run_in_fixed_order() {
        let outcome = enforcer().enforce_all("Fine.", &ResponseMetadata::default(), &OperatingMode::standard());
        let order: Vec<GateName> = outcome.gate_results.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            order,
            [
                GateName::Truth,
                GateName::Provenance,
                GateName::Volatility,
                GateName::BusinessPolicy,
                GateName::Disclosure
            ]
        );
    }

    #[test]
    fn disclosure_gate_sees_truth_disclaimer_and_does_not_duplicate() {
        let outcome = enforcer().enforce_all("The mayor is Jane Doe.", &unverified_guess(), &OperatingMode::standard());

        let corrected = outcome.corrected_response.clone().unwrap();
        assert!(corrected.starts_with(TRUTH_DISCLAIMER));
        assert!(!corrected.contains(LOW_CONFIDENCE_NOTE));
        assert!(outcome.gate(GateName::Disclosure).unwrap().passed);
        assert!(!outcome.enforcement_passed);
    }

    // ── Idempotence ──────────────────────────────────────────────────────────

    #[test]
    fn enforcing_a_corrected_response_changes_nothing() {
        let metadata = ResponseMetadata {
            claim_kind: ClaimKind::BusinessPolicy,
            source_class: Some(SourceClass::External),
            verified_at: Some(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()),
            ..unverified_guess()
        };
        let mode = OperatingMode::new("business");

        let first = enforcer().enforce_all("Returns are accepted for 60 days.", &metadata, &mode);
        let corrected = first.corrected_response.clone().unwrap();
        assert!(corrected.contains(POLICY_RECONCILE_NOTE));

        let second = enforcer().enforce_all(&corrected, &metadata, &mode);
        assert_eq!(second.corrected_response, None);
        assert_eq!(second.final_text(&corrected), corrected);
        assert_eq!(corrected.matches(TRUTH_DISCLAIMER).count(), 1);
        assert!(second.enforcement_passed);
    }

    // ── Pass-through ─────────────────────────────────────────────────────────

    #[test]
    fn verified_volatile_answer_passes_untouched() {
        let metadata = ResponseMetadata {
            truth_type: Some(TruthType::Volatile),
            confidence: Some(0.75),
            source_class: Some(SourceClass::External),
            verified_at: Some(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()),
            external_verification: true,
            cache_ttl_ms: Some(300_000),
            lookup_attempted: true,
            ..ResponseMetadata::default()
        };

        let outcome = enforcer().enforce_all("Bitcoin: $64,000.00", &metadata, &OperatingMode::standard());

        assert!(outcome.enforcement_passed);
        assert!(outcome.violations.is_empty());
        assert_eq!(outcome.corrected_response, None);
    }

    #[test]
    fn metadata_only_violation_fails_enforcement_without_text_change() {
        let metadata = ResponseMetadata {
            truth_type: Some(TruthType::Volatile),
            confidence: Some(0.75),
            source_class: Some(SourceClass::External),
            verified_at: Some(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()),
            external_verification: true,
            cache_ttl_ms: Some(86_400_000),
            ..ResponseMetadata::default()
        };

        let outcome = enforcer().enforce_all("Bitcoin: $64,000.00", &metadata, &OperatingMode::standard());

        assert!(!outcome.enforcement_passed);
        assert_eq!(outcome.corrected_response, None);
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].gate, GateName::Volatility);
    }
}
