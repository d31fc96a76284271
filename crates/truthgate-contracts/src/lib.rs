//! # truthgate-contracts
//!
//! Shared types, schemas, and contracts for the truthgate pipeline.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions, configuration schema, and error types.

pub mod cache;
pub mod config;
pub mod doctrine;
pub mod error;
pub mod lookup;
pub mod source;
pub mod truth;

#[cfg(test)]
mod tests {
    use super::*;
    use config::TruthgateConfig;
    use doctrine::{Correction, GateResult, GateVerdict};
    use error::TruthgateError;
    use lookup::{DegradedResponse, SourceStatus, VerificationPath, VerificationPointer};
    use source::UrlRule;
    use truth::{ClassifierStage, TruthType};

    // ── TTL table ────────────────────────────────────────────────────────────

    #[test]
    fn default_ttls_rank_strictly_by_truth_class() {
        let cache = TruthgateConfig::default().cache;
        let volatile = cache.ttl_for(TruthType::Volatile);
        let semi = cache.ttl_for(TruthType::SemiStable);
        let permanent = cache.ttl_for(TruthType::Permanent);

        assert!(volatile < semi);
        assert!(semi < permanent);
        assert_eq!(volatile.as_secs(), 300);
        assert_eq!(cache.ttl_for(TruthType::DocumentReview).as_secs(), 0);
    }

    // ── Status tags ──────────────────────────────────────────────────────────

    #[test]
    fn source_status_tags() {
        assert_eq!(SourceStatus::Timeout.tag(), "timeout");
        assert_eq!(SourceStatus::HttpError(503).tag(), "error_503");
        assert_eq!(SourceStatus::ExtractorError.tag(), "extractor_error");

        let json = serde_json::to_string(&SourceStatus::HttpError(404)).unwrap();
        assert_eq!(json, "\"error_404\"");
    }

    // ── Serialized shapes ────────────────────────────────────────────────────

    #[test]
    fn classifier_stage_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ClassifierStage::Fallback).unwrap(), "2");
        let stage: ClassifierStage = serde_json::from_str("1").unwrap();
        assert_eq!(stage, ClassifierStage::PatternScoring);
        assert!(serde_json::from_str::<ClassifierStage>("7").is_err());
    }

    #[test]
    fn truth_type_parses_loosely() {
        assert_eq!("semi-stable".parse::<TruthType>().unwrap(), TruthType::SemiStable);
        assert_eq!("volatile".parse::<TruthType>().unwrap(), TruthType::Volatile);
        assert!("eternal".parse::<TruthType>().is_err());
    }

    #[test]
    fn url_rule_reads_kebab_case_tag() {
        let rule: UrlRule = serde_json::from_value(serde_json::json!({
            "rule": "env-key-gated",
            "env_var": "METALS_API_KEY",
            "template": "https://example.test/{key}"
        }))
        .unwrap();

        assert_eq!(rule.required_credential(), Some("METALS_API_KEY"));
    }

    // ── Doctrine helpers ─────────────────────────────────────────────────────

    #[test]
    fn corrections_prepend_and_append() {
        let prepend = Correction::Prepend("Note first.".to_string());
        let append = Correction::Append("Note last.".to_string());

        assert!(prepend.apply("Body").starts_with("Note first."));
        assert!(append.apply("Body").ends_with("Note last."));
    }

    #[test]
    fn gate_result_from_violation_carries_message() {
        let verdict = GateVerdict::Violation {
            message: "missing verified_at".to_string(),
            correction: None,
            blocking: true,
        };
        let result = GateResult::from(&verdict);

        assert!(!result.passed);
        assert_eq!(result.violation.as_deref(), Some("missing verified_at"));
        assert!(result.correction.is_none());
    }

    #[test]
    fn degraded_response_text_lists_pointers() {
        let degraded = DegradedResponse {
            disclosure: "I can't access current data for this query.".to_string(),
            fallback_answer: None,
            verification_path: VerificationPath {
                category: None,
                sources: vec![
                    VerificationPointer {
                        name: "Reuters".to_string(),
                        url: "https://www.reuters.com".to_string(),
                    },
                    VerificationPointer {
                        name: "AP News".to_string(),
                        url: "https://apnews.com".to_string(),
                    },
                ],
            },
            max_response_words: 30,
            failure_tags: vec![],
        };

        assert_eq!(
            degraded.response_text(),
            "I can't access current data for this query. Check Reuters or AP News."
        );
    }

    // ── Error display messages ───────────────────────────────────────────────

    #[test]
    fn error_config_display() {
        let err = TruthgateError::ConfigError {
            reason: "missing catalog".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("configuration error"));
        assert!(msg.contains("missing catalog"));
    }

    #[test]
    fn error_extraction_display_names_extractor() {
        let err = TruthgateError::ExtractionError {
            extractor: "crypto_prices".to_string(),
            reason: "missing usd field".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("crypto_prices"));
        assert!(msg.contains("missing usd field"));
    }

    #[test]
    fn serde_json_error_converts_to_serialization_error() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: TruthgateError = bad.into();
        assert!(matches!(err, TruthgateError::SerializationError { .. }));
    }
}
