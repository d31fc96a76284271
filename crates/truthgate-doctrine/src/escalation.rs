//! Reasoning escalation.
//!
//! When verified data is unavailable the response must still reason: state
//! what is known, name the unknowns, draw parallels, bound the scenarios and
//! say what would raise confidence. A response that shows fewer than three
//! of these and bails out ("consult a professional") gets a scaffold for the
//! missing steps appended. It is never rejected.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use truthgate_contracts::doctrine::{
    EscalationContext, EscalationOutcome, EscalationVerdict, ReasoningMarker,
};

/// Markers a response must show to count as sufficient.
pub const REQUIRED_MARKERS: usize = 3;

static MARKER_PATTERNS: LazyLock<Vec<(ReasoningMarker, Regex)>> = LazyLock::new(|| {
    [
        (
            ReasoningMarker::KnownFacts,
            r"(?i)\b(what (we|i) (do )?know|known facts?|it is (known|established)|is confirmed|has been confirmed|we know that|the facts are|established that)\b",
        ),
        (
            ReasoningMarker::Unknowns,
            r"(?i)\b(unknowns?|unclear|uncertain|not (yet )?known|(we|i) don'?t (yet )?know|can'?t confirm|cannot confirm|remains to be seen|open question)\b",
        ),
        (
            ReasoningMarker::Parallels,
            r"(?i)\b(similar(ly)?|historically|in past cases|precedents?|comparable|by analogy|in previous|typically)\b",
        ),
        (
            ReasoningMarker::BoundedScenarios,
            r"(?i)(\bif\b[^.]{1,80}\bthen\b|\bscenarios?\b|\blikely range\b|\bbest case\b|\bworst case\b|\bmost likely\b|\bon the other hand\b)",
        ),
        (
            ReasoningMarker::ConfidenceRaisers,
            r"(?i)\b(more (certain|confident)|raise (my |our )?confidence|increase (my |our )?confidence|would confirm|to confirm this|to verify this|official (source|announcement|statement)|more information)\b",
        ),
    ]
    .into_iter()
    .map(|(marker, pattern)| (marker, Regex::new(pattern).unwrap()))
    .collect()
});

static PREMATURE_TERMINATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(i (can'?t|cannot|am unable to|'m unable to) (help|answer|say|provide|comment)|consult (a|an|your) (doctor|lawyer|professional|physician|attorney|pharmacist|financial advisor)|(please )?(see|contact|ask) (a|an|your) (doctor|professional|lawyer|physician)|i don'?t have (access|information|data)|there'?s no way to know|it'?s impossible to (say|know))",
    )
    .unwrap()
});

/// Present markers, in canonical order.
pub fn markers_present(response: &str) -> Vec<ReasoningMarker> {
    MARKER_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(response))
        .map(|(marker, _)| *marker)
        .collect()
}

pub fn has_premature_termination(response: &str) -> bool {
    PREMATURE_TERMINATION.is_match(response)
}

fn scaffold_line(marker: ReasoningMarker) -> &'static str {
    match marker {
        ReasoningMarker::KnownFacts => "What is known: the facts that are established, and where they come from.",
        ReasoningMarker::Unknowns => "What is unknown: the specific gaps that prevent a firm answer.",
        ReasoningMarker::Parallels => "Comparable cases: similar situations and how they turned out.",
        ReasoningMarker::BoundedScenarios => "Likely scenarios: the plausible range of outcomes, from most to least likely.",
        ReasoningMarker::ConfidenceRaisers => "What would raise confidence: the source or fact that would settle the question.",
    }
}

fn scaffold(missing: &[ReasoningMarker], context: &EscalationContext) -> String {
    let header = match context.topic.as_deref() {
        Some(topic) if !topic.trim().is_empty() => {
            format!("Reasoning through \"{}\" with what is available:", topic.trim())
        }
        _ => "Reasoning through this with what is available:".to_string(),
    };
    let mut lines = vec![header];
    lines.extend(missing.iter().map(|m| format!("- {}", scaffold_line(*m))));
    lines.join("\n")
}

/// Checks bounded-reasoning responses for the required structure.
#[derive(Debug, Clone, Default)]
pub struct ReasoningEscalationEnforcer;

impl ReasoningEscalationEnforcer {
    pub fn new() -> Self {
        Self
    }

    /// Check `response`.
    ///
    /// `bounded_reasoning_required` comes from the caller; nothing is
    /// checked when it is false.
    pub fn enforce(
        &self,
        response: &str,
        bounded_reasoning_required: bool,
        context: &EscalationContext,
    ) -> EscalationOutcome {
        if !bounded_reasoning_required {
            return EscalationOutcome {
                verdict: EscalationVerdict::NotRequired,
                markers_present: Vec::new(),
                markers_missing: Vec::new(),
                premature_termination: false,
                corrected_response: None,
            };
        }

        let present = markers_present(response);
        let missing: Vec<ReasoningMarker> = ReasoningMarker::all()
            .into_iter()
            .filter(|m| !present.contains(m))
            .collect();
        let premature_termination = has_premature_termination(response);

        let (verdict, corrected_response) = if present.len() >= REQUIRED_MARKERS {
            debug!(markers = present.len(), "bounded reasoning sufficient");
            (EscalationVerdict::Sufficient, None)
        } else if premature_termination {
            warn!(
                markers = present.len(),
                missing = missing.len(),
                "response terminated early, appending reasoning scaffold"
            );
            let corrected = format!("{response}\n\n{}", scaffold(&missing, context));
            (EscalationVerdict::Insufficient, Some(corrected))
        } else {
            info!(markers = present.len(), "bounded reasoning weak");
            (EscalationVerdict::Weak, None)
        };

        EscalationOutcome {
            verdict,
            markers_present: present,
            markers_missing: missing,
            premature_termination,
            corrected_response,
        }
    }
}
