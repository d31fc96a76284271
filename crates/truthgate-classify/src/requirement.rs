//! Lookup-requirement policy.
//!
//! Decides whether external verification is warranted and how many sources
//! it may consult. Every reason that contributed is reported so the caller
//! can surface `lookup_reasons` and `lookup_priority` verbatim.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use truthgate_contracts::{
    config::RequirementConfig,
    lookup::{LookupPriority, LookupReason, LookupRequirement},
    truth::{TruthClassification, TruthType},
};

static FRESHNESS_MARKERS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("today", r"(?i)\b(today|tonight)\b"),
        ("latest", r"(?i)\blatest\b"),
        ("current", r"(?i)\bcurrent(ly)?\b"),
        ("right now", r"(?i)\b(right now|at the moment)\b"),
        ("this week", r"(?i)\bthis (week|month|year)\b"),
        ("recent", r"(?i)\b(recent(ly)?|just now|yesterday)\b"),
        ("breaking", r"(?i)\bbreaking\b"),
        ("year", r"\b20[2-9]\d\b"),
    ]
    .into_iter()
    .map(|(id, pattern)| (id, Regex::new(pattern).unwrap()))
    .collect()
});

static NEWS_INTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(news|headlines?|announced|announcement|reported(ly)?|elections?|elected|resign(ed|s)?|died|passed away|arrested|indicted|verdict|ceasefire|attack(ed)?|scandal|breaking)\b",
    )
    .unwrap()
});

static REPORTED_CLAIM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(i (heard|read|saw) that|someone (told|said to) me|is it true that|apparently|rumou?r has it)\b",
    )
    .unwrap()
});

/// The first freshness marker found in `text`, if any.
pub fn freshness_marker(text: &str) -> Option<&'static str> {
    FRESHNESS_MARKERS
        .iter()
        .find(|(_, pattern)| pattern.is_match(text))
        .map(|(id, _)| *id)
}

/// True when `text` reads like a question about current events.
pub fn has_news_intent(text: &str) -> bool {
    NEWS_INTENT.is_match(text) || is_reported_claim(text)
}

/// True when `text` relays a second-hand claim ("I heard that ...").
pub fn is_reported_claim(text: &str) -> bool {
    REPORTED_CLAIM.is_match(text)
}

/// Decides if and how aggressively a query must be verified.
#[derive(Debug, Clone)]
pub struct LookupRequirementPolicy {
    config: RequirementConfig,
    max_sources: usize,
}

impl LookupRequirementPolicy {
    /// `max_sources` caps `max_lookups` whatever the priority implies.
    pub fn new(config: RequirementConfig, max_sources: usize) -> Self {
        Self { config, max_sources }
    }

    /// Decide whether `query` needs a lookup.
    ///
    /// `internal_confidence` is the generation layer's confidence in its own
    /// answer, when it has one.
    pub fn is_lookup_required(
        &self,
        query: &str,
        classification: &TruthClassification,
        internal_confidence: Option<f64>,
    ) -> LookupRequirement {
        let chars = query.chars().count();
        if query.trim().is_empty() {
            return LookupRequirement::not_required(LookupReason::EmptyQuery);
        }
        if chars > self.config.max_query_chars {
            debug!(chars, "query over lookup length limit");
            return LookupRequirement::not_required(LookupReason::QueryTooLong { chars });
        }
        if classification.truth_type == TruthType::DocumentReview
            || classification.skip_external_lookup
        {
            return LookupRequirement::not_required(LookupReason::DocumentReview);
        }

        let mut reasons = Vec::new();
        let mut priority = LookupPriority::None;
        let mut raise = |to: LookupPriority, reason: LookupReason, reasons: &mut Vec<LookupReason>| {
            priority = priority.max(to);
            reasons.push(reason);
        };

        if classification.truth_type == TruthType::Volatile {
            raise(LookupPriority::High, LookupReason::VolatileTruth, &mut reasons);
        }
        if let Some(marker) = freshness_marker(query) {
            raise(
                LookupPriority::Medium,
                LookupReason::FreshnessMarker {
                    marker: marker.to_string(),
                },
                &mut reasons,
            );
        }
        if has_news_intent(query) {
            raise(LookupPriority::Medium, LookupReason::NewsIntent, &mut reasons);
        }
        if classification.high_stakes.is_high_stakes {
            raise(
                LookupPriority::High,
                LookupReason::HighStakes {
                    domains: classification.high_stakes.domains.iter().copied().collect(),
                },
                &mut reasons,
            );
        }

        let internally_unsure = internal_confidence
            .map_or(true, |c| c < self.config.semi_stable_confidence_floor);
        match classification.truth_type {
            TruthType::SemiStable if internally_unsure => {
                raise(LookupPriority::Medium, LookupReason::LowInternalConfidence, &mut reasons);
            }
            TruthType::Ambiguous if internally_unsure => {
                raise(LookupPriority::Low, LookupReason::LowInternalConfidence, &mut reasons);
            }
            TruthType::Permanent
                if reasons.is_empty()
                    && classification.confidence < self.config.permanent_confidence_ceiling
                    && internal_confidence.is_some_and(|c| c < self.config.semi_stable_confidence_floor) =>
            {
                raise(LookupPriority::Low, LookupReason::LowInternalConfidence, &mut reasons);
            }
            _ => {}
        }

        if reasons.is_empty() {
            return LookupRequirement::not_required(LookupReason::StableKnowledge);
        }

        LookupRequirement {
            required: true,
            max_lookups: priority.max_lookups().min(self.max_sources),
            reasons,
            priority,
        }
    }
}

impl Default for LookupRequirementPolicy {
    fn default() -> Self {
        Self::new(RequirementConfig::default(), 3)
    }
}

#[cfg(test)]
mod tests {
    use truthgate_contracts::config::RequirementConfig;
    use truthgate_contracts::lookup::{LookupPriority, LookupReason, LookupRequirement};
    use truthgate_contracts::truth::TruthType;

    use crate::classifier::TruthClassifier;

    use super::{freshness_marker, has_news_intent, LookupRequirementPolicy};

    fn decide(query: &str, internal: Option<f64>) -> LookupRequirement {
        let classification = TruthClassifier::default().classify(query);
        LookupRequirementPolicy::default().is_lookup_required(query, &classification, internal)
    }

    #[test]
    fn over_length_query_never_requires_lookup() {
        let query = format!("current price of bitcoin {}", "x".repeat(10_001));
        let req = decide(&query, None);

        assert!(!req.required);
        assert_eq!(req.max_lookups, 0);
        assert!(matches!(req.reasons[0], LookupReason::QueryTooLong { .. }));
    }

    #[test]
    fn exactly_ten_thousand_and_one_chars_is_rejected() {
        let query = "a".repeat(10_001);
        let req = decide(&query, None);
        assert!(!req.required);
        assert_eq!(req.max_lookups, 0);
    }

    #[test]
    fn volatile_query_requires_high_priority_lookup() {
        let req = decide("What is the current price of Bitcoin?", None);

        assert!(req.required);
        assert_eq!(req.priority, LookupPriority::High);
        assert_eq!(req.max_lookups, 3);
        assert!(req.reasons.contains(&LookupReason::VolatileTruth));
    }

    #[test]
    fn confident_permanent_fact_skips_lookup() {
        let req = decide("Who invented the telephone?", Some(0.95));
        assert!(!req.required);
        assert_eq!(req.reasons, vec![LookupReason::StableKnowledge]);
    }

    #[test]
    fn semi_stable_with_low_internal_confidence_is_medium() {
        let req = decide("Who is the prime minister of Canada?", Some(0.4));
        assert!(req.required);
        assert_eq!(req.priority, LookupPriority::Medium);
        assert_eq!(req.max_lookups, 2);
    }

    #[test]
    fn semi_stable_with_high_internal_confidence_is_skipped() {
        let req = decide("Who is the prime minister of Canada?", Some(0.9));
        assert!(!req.required);
    }

    #[test]
    fn high_stakes_escalates_priority() {
        let req = decide("Was the acetaminophen dosage guidance changed?", Some(0.9));
        assert!(req.required);
        assert_eq!(req.priority, LookupPriority::High);
        assert!(req
            .reasons
            .iter()
            .any(|r| matches!(r, LookupReason::HighStakes { .. })));
    }

    #[test]
    fn document_review_is_never_looked_up() {
        let mut doc = String::from("Please summarize this report.\n");
        doc.push_str(&"Quarterly revenue grew in every region. ".repeat(300));
        let classification = TruthClassifier::default().classify(&doc);
        assert_eq!(classification.truth_type, TruthType::DocumentReview);

        let config = RequirementConfig {
            max_query_chars: 100_000,
            ..Default::default()
        };
        let req = LookupRequirementPolicy::new(config, 3).is_lookup_required(&doc, &classification, None);
        assert!(!req.required);
        assert_eq!(req.reasons, vec![LookupReason::DocumentReview]);
    }

    #[test]
    fn marker_helpers() {
        assert_eq!(freshness_marker("what happened today"), Some("today"));
        assert_eq!(freshness_marker("history of rome"), None);
        assert!(has_news_intent("I heard that the mayor resigned"));
        assert!(!has_news_intent("how do magnets work"));
    }
}
