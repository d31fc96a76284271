//! The two-stage truth classifier.
//!
//! Stages run in strict order and the first one to produce a non-ambiguous
//! result wins:
//!
//! 1. **Pre-checks** (stage 0): invalid input, document review, stable
//!    procedural questions.
//! 2. **Pattern scoring** (stage 1): every marker rule is evaluated, matches
//!    are tallied per class, and the winner is chosen by precedence.
//! 3. **Fallback** (stage 2): the `FallbackClassifier` decides ambiguous
//!    queries. It can fail, but it never blocks the pipeline.
//!
//! `classify` is a pure function of its input: no clock, no randomness, no
//! shared mutable state.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use truthgate_contracts::{
    config::ClassifierConfig,
    error::TruthgateResult,
    truth::{ClassifierStage, TruthClassification, TruthType},
};
use truthgate_core::traits::{FallbackClassifier, FallbackVerdict};

use crate::rules::{class_priority, matching_rules};
use crate::stakes::detect_high_stakes;

/// Confidence assigned when permanent and semi-stable markers tie.
const CONFLICT_CONFIDENCE: f64 = 0.6;
/// Confidence of the last-resort default when the fallback classifier fails.
const FALLBACK_ERROR_CONFIDENCE: f64 = 0.3;
const STABLE_PROCEDURAL_CONFIDENCE: f64 = 0.9;
const DOCUMENT_REVIEW_CONFIDENCE: f64 = 0.95;
/// Minimum numbered sections or headers that mark input as a structured document.
const MIN_STRUCTURAL_MARKERS: usize = 3;

static REVIEW_PHRASING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(review|analy[sz]e|analysis|summari[sz]e|feedback on|critique|proofread|evaluate|look over|go through|red[- ]?line)\b",
    )
    .unwrap()
});

static STRUCTURAL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(#{1,6}\s+\S|\d+(\.\d+)*[.)]\s+\S|[IVX]+\.\s+\S|(Section|Article|Clause)\s+\d+)")
        .unwrap()
});

static STABLE_PROCEDURAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*how\s+(do|can|should|would)\s+(i|you|we|one)\s+(cook|bake|boil|tie|spell|build|make|fold|knit|sew|draw|write|pronounce)\b",
    )
    .unwrap()
});

static TEMPORAL_QUALIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(today|tonight|now|current(ly)?|latest|recent(ly)?|this (week|month|year)|(19|20)\d{2}|new rules?)\b",
    )
    .unwrap()
});

/// The default stage-2 classifier: a conservative semi-stable guess.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConservativeFallback;

impl FallbackClassifier for ConservativeFallback {
    fn classify(&self, _query: &str) -> TruthgateResult<FallbackVerdict> {
        Ok(FallbackVerdict {
            truth_type: TruthType::SemiStable,
            confidence: 0.5,
            reason: "no markers matched; defaulting to semi-stable".to_string(),
        })
    }
}

/// Buckets a query into a truth-volatility class.
pub struct TruthClassifier {
    config: ClassifierConfig,
    fallback: Box<dyn FallbackClassifier>,
}

impl TruthClassifier {
    /// Create a classifier with the conservative stage-2 fallback.
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            fallback: Box::new(ConservativeFallback),
        }
    }

    /// Replace the stage-2 fallback (e.g. with a model-backed classifier).
    pub fn with_fallback(mut self, fallback: Box<dyn FallbackClassifier>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Classify `query`. Never fails.
    pub fn classify(&self, query: &str) -> TruthClassification {
        let sanitized: String = query
            .chars()
            .filter(|c| !c.is_control() || c.is_whitespace())
            .take(self.config.max_query_chars)
            .collect();
        let text = sanitized.trim();

        if text.is_empty() {
            debug!("empty query after sanitization");
            return invalid("empty query after sanitization");
        }

        let high_stakes = detect_high_stakes(text);

        // ── Stage 0: pre-checks ──────────────────────────────────────────────
        if let Some(reason) = self.document_review_reason(text) {
            return TruthClassification {
                truth_type: TruthType::DocumentReview,
                confidence: DOCUMENT_REVIEW_CONFIDENCE,
                stage: ClassifierStage::PreCheck,
                matched_patterns: vec![],
                high_stakes,
                conflict_detected: false,
                skip_external_lookup: true,
                reason,
                fallback_error: None,
            };
        }

        if STABLE_PROCEDURAL.is_match(text) && !TEMPORAL_QUALIFIER.is_match(text) {
            return TruthClassification {
                truth_type: TruthType::Permanent,
                confidence: STABLE_PROCEDURAL_CONFIDENCE,
                stage: ClassifierStage::PreCheck,
                matched_patterns: vec!["precheck.stable_procedural".to_string()],
                high_stakes,
                conflict_detected: false,
                skip_external_lookup: false,
                reason: "stable how-to question without temporal qualifiers".to_string(),
                fallback_error: None,
            };
        }

        // ── Stage 1: pattern scoring ─────────────────────────────────────────
        let matched = matching_rules(text);
        let count = |class: TruthType| matched.iter().filter(|r| r.class == class).count();
        let volatile = count(TruthType::Volatile);
        let semi = count(TruthType::SemiStable);
        let permanent = count(TruthType::Permanent);
        let matched_patterns: Vec<String> = matched.iter().map(|r| r.id.to_string()).collect();

        debug!(volatile, semi, permanent, "marker counts");

        if !matched.is_empty() {
            let winner = matched
                .iter()
                .map(|r| r.class)
                .max_by_key(|class| class_priority(*class))
                .unwrap_or(TruthType::Ambiguous);

            let winner_count = count(winner);
            let conflict_detected = volatile == 0 && semi > 0 && permanent > 0 && semi == permanent;
            let confidence = if conflict_detected {
                CONFLICT_CONFIDENCE
            } else {
                score_confidence(winner_count)
            };

            let reason = if conflict_detected {
                format!("{permanent} permanent and {semi} semi-stable markers tied; permanent wins")
            } else if winner == TruthType::Volatile && (semi + permanent) > 0 {
                format!("{volatile} volatile marker(s) override {} other marker(s)", semi + permanent)
            } else {
                format!("{winner_count} {} marker(s) matched", winner.as_str())
            };

            return TruthClassification {
                truth_type: winner,
                confidence,
                stage: ClassifierStage::PatternScoring,
                matched_patterns,
                high_stakes,
                conflict_detected,
                skip_external_lookup: false,
                reason,
                fallback_error: None,
            };
        }

        // ── Stage 2: ambiguous fallback ──────────────────────────────────────
        match self.fallback.classify(text) {
            Ok(verdict) => TruthClassification {
                truth_type: verdict.truth_type,
                confidence: verdict.confidence.clamp(0.0, 1.0),
                stage: ClassifierStage::Fallback,
                matched_patterns,
                high_stakes,
                conflict_detected: false,
                skip_external_lookup: false,
                reason: verdict.reason,
                fallback_error: None,
            },
            Err(e) => {
                warn!(error = %e, "fallback classifier failed; using last-resort default");
                TruthClassification {
                    truth_type: TruthType::SemiStable,
                    confidence: FALLBACK_ERROR_CONFIDENCE,
                    stage: ClassifierStage::Fallback,
                    matched_patterns,
                    high_stakes,
                    conflict_detected: false,
                    skip_external_lookup: false,
                    reason: "fallback classifier failed; defaulting to semi-stable".to_string(),
                    fallback_error: Some(e.to_string()),
                }
            }
        }
    }

    /// Very long input with review phrasing or document structure.
    fn document_review_reason(&self, text: &str) -> Option<String> {
        let chars = text.chars().count();
        if chars <= self.config.document_review_min_chars {
            return None;
        }
        if REVIEW_PHRASING.is_match(&edge_window(text, 500)) {
            return Some(format!("{chars}-char input with review phrasing"));
        }
        let structural = STRUCTURAL_MARKER.find_iter(text).take(MIN_STRUCTURAL_MARKERS).count();
        if structural >= MIN_STRUCTURAL_MARKERS {
            return Some(format!("{chars}-char input with document structure"));
        }
        None
    }
}

impl Default for TruthClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

/// `min(0.95, 0.7 + 0.1 * matches)`.
fn score_confidence(matches: usize) -> f64 {
    (0.7 + 0.1 * matches as f64).min(0.95)
}

fn invalid(reason: &str) -> TruthClassification {
    TruthClassification {
        truth_type: TruthType::Ambiguous,
        confidence: 0.0,
        stage: ClassifierStage::PreCheck,
        matched_patterns: vec![],
        high_stakes: Default::default(),
        conflict_detected: false,
        skip_external_lookup: false,
        reason: reason.to_string(),
        fallback_error: None,
    }
}

/// The first and last `n` chars of `text`, where review requests usually sit.
fn edge_window(text: &str, n: usize) -> String {
    let head: String = text.chars().take(n).collect();
    let total = text.chars().count();
    let tail: String = text.chars().skip(total.saturating_sub(n)).collect();
    format!("{head}\n{tail}")
}

#[cfg(test)]
mod tests {
    use truthgate_contracts::{
        error::{TruthgateError, TruthgateResult},
        truth::{ClassifierStage, TruthType},
    };
    use truthgate_core::traits::{FallbackClassifier, FallbackVerdict};

    use super::TruthClassifier;

    struct FailingFallback;

    impl FallbackClassifier for FailingFallback {
        fn classify(&self, _query: &str) -> TruthgateResult<FallbackVerdict> {
            Err(TruthgateError::ClassifierError {
                reason: "model unavailable".to_string(),
            })
        }
    }

    fn long_document(sections: usize) -> String {
        let mut doc = String::new();
        for i in 1..=sections {
            doc.push_str(&format!("{i}. Section heading number {i}\n"));
            doc.push_str(&"Lorem ipsum dolor sit amet consectetur. ".repeat(60));
            doc.push('\n');
        }
        doc
    }

    // ── Stage 0 ──────────────────────────────────────────────────────────────

    #[test]
    fn empty_input_is_ambiguous_with_zero_confidence() {
        let c = TruthClassifier::default().classify("   \n\t ");
        assert_eq!(c.truth_type, TruthType::Ambiguous);
        assert_eq!(c.confidence, 0.0);
        assert!(c.reason.contains("empty"));
    }

    #[test]
    fn long_review_request_is_document_review() {
        let mut input = String::from("Please review this contract and flag risky clauses.\n");
        input.push_str(&"The party of the first part agrees to the terms. ".repeat(250));
        assert!(input.chars().count() > 10_000);

        let c = TruthClassifier::default().classify(&input);
        assert_eq!(c.truth_type, TruthType::DocumentReview);
        assert!(c.skip_external_lookup);
        assert_eq!(c.stage, ClassifierStage::PreCheck);
    }

    #[test]
    fn long_structured_document_is_document_review() {
        let doc = long_document(6);
        assert!(doc.chars().count() > 10_000);

        let c = TruthClassifier::default().classify(&doc);
        assert_eq!(c.truth_type, TruthType::DocumentReview);
    }

    #[test]
    fn short_review_request_is_not_document_review() {
        let c = TruthClassifier::default().classify("Please review the latest news about the election");
        assert_ne!(c.truth_type, TruthType::DocumentReview);
    }

    #[test]
    fn how_to_cook_is_permanent() {
        let c = TruthClassifier::default().classify("How do I cook rice on the stove?");
        assert_eq!(c.truth_type, TruthType::Permanent);
        assert_eq!(c.confidence, 0.9);
    }

    #[test]
    fn how_to_with_temporal_qualifier_is_not_short_circuited() {
        let c = TruthClassifier::default().classify("How do I build a deck under the 2026 code?");
        assert_ne!(c.stage, ClassifierStage::PreCheck);
    }

    // ── Stage 1 ──────────────────────────────────────────────────────────────

    #[test]
    fn current_price_of_bitcoin_is_volatile() {
        let c = TruthClassifier::default().classify("What is the current price of Bitcoin?");
        assert_eq!(c.truth_type, TruthType::Volatile);
        assert!(c.confidence >= 0.7, "confidence {}", c.confidence);
        assert!(c.matched_patterns.iter().any(|p| p == "volatile.current_quote"));
        assert!(c.matched_patterns.iter().any(|p| p == "permanent.definition"));
        assert!(!c.conflict_detected);
    }

    #[test]
    fn single_permanent_marker_scores_point_eight() {
        let c = TruthClassifier::default().classify("Who invented the telephone?");
        assert_eq!(c.truth_type, TruthType::Permanent);
        assert!((c.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn office_holder_is_semi_stable() {
        let c = TruthClassifier::default().classify("Who is the prime minister of Canada?");
        assert_eq!(c.truth_type, TruthType::SemiStable);
        assert_eq!(c.stage, ClassifierStage::PatternScoring);
    }

    #[test]
    fn tied_permanent_and_semi_stable_markers_flag_conflict() {
        // one permanent marker ("what is") and one semi-stable marker ("population")
        let c = TruthClassifier::default().classify("What is the population of Lagos");
        assert_eq!(c.truth_type, TruthType::Permanent);
        assert!(c.conflict_detected);
        assert_eq!(c.confidence, 0.6);
    }

    #[test]
    fn confidence_is_capped() {
        let c = TruthClassifier::default()
            .classify("Breaking: current price right now today, live updates on the exchange rate of the euro");
        assert_eq!(c.truth_type, TruthType::Volatile);
        assert_eq!(c.confidence, 0.95);
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = TruthClassifier::default();
        let q = "Is ibuprofen still the best choice for a headache these days?";
        let first = classifier.classify(q);
        for _ in 0..5 {
            assert_eq!(classifier.classify(q), first);
        }
    }

    #[test]
    fn high_stakes_is_reported_without_changing_class() {
        let c = TruthClassifier::default().classify("Who invented insulin?");
        assert_eq!(c.truth_type, TruthType::Permanent);
        assert!(c.high_stakes.is_high_stakes);
    }

    // ── Stage 2 ──────────────────────────────────────────────────────────────

    #[test]
    fn unmatched_query_uses_conservative_fallback() {
        let c = TruthClassifier::default().classify("tell me about lighthouses");
        assert_eq!(c.truth_type, TruthType::SemiStable);
        assert_eq!(c.confidence, 0.5);
        assert_eq!(c.stage, ClassifierStage::Fallback);
        assert!(c.fallback_error.is_none());
    }

    #[test]
    fn failing_fallback_degrades_to_low_confidence_default() {
        let classifier = TruthClassifier::default().with_fallback(Box::new(FailingFallback));
        let c = classifier.classify("tell me about lighthouses");

        assert_eq!(c.truth_type, TruthType::SemiStable);
        assert_eq!(c.confidence, 0.3);
        let err = c.fallback_error.expect("error annotation");
        assert!(err.contains("model unavailable"));
    }
}
