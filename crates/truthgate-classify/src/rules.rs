//! The ordered marker rule table.
//!
//! Each `MarkerRule` pairs a case-insensitive pattern with the truth class it
//! signals and that class's precedence. The table is compiled once and
//! evaluated in declaration order; every matching rule is recorded, and the
//! winner is chosen by precedence, not by position.
//!
//! Precedence: VOLATILE (3) > PERMANENT (2) > SEMI_STABLE (1). Explicit time
//! sensitivity trumps everything; absent it, stable facts default to low churn.

use std::sync::LazyLock;

use regex::Regex;

use truthgate_contracts::truth::TruthType;

/// One row of the rule table.
#[derive(Debug)]
pub struct MarkerRule {
    /// Stable identifier, reported in `matched_patterns`.
    pub id: &'static str,
    pub class: TruthType,
    pub priority: u8,
    pub pattern: Regex,
}

/// Precedence of a truth class when markers of several classes match.
pub fn class_priority(class: TruthType) -> u8 {
    match class {
        TruthType::Volatile => 3,
        TruthType::Permanent => 2,
        TruthType::SemiStable => 1,
        TruthType::DocumentReview | TruthType::Ambiguous => 0,
    }
}

fn rule(id: &'static str, class: TruthType, pattern: &str) -> MarkerRule {
    MarkerRule {
        id,
        class,
        priority: class_priority(class),
        pattern: Regex::new(pattern).unwrap(),
    }
}

static MARKER_RULES: LazyLock<Vec<MarkerRule>> = LazyLock::new(|| {
    use TruthType::{Permanent, SemiStable, Volatile};

    vec![
        // ── Volatile ─────────────────────────────────────────────────────────
        rule(
            "volatile.current_quote",
            Volatile,
            r"(?i)\b(current|live|latest|today'?s|real[- ]time|spot)\s+(price|rate|value|quote|score|odds)s?\b",
        ),
        rule(
            "volatile.price_of",
            Volatile,
            r"(?i)\b(price|cost|value|exchange rate)\s+of\b",
        ),
        rule(
            "volatile.market",
            Volatile,
            r"(?i)\b(trading at|stock price|share price|market cap|exchange rate|how much is \w+ worth)\b",
        ),
        rule(
            "volatile.right_now",
            Volatile,
            r"(?i)\b(right now|at the moment|as of (today|now)|currently|this minute)\b",
        ),
        rule(
            "volatile.today",
            Volatile,
            r"(?i)\b(today|tonight|this (morning|afternoon|evening))\b",
        ),
        rule(
            "volatile.breaking",
            Volatile,
            r"(?i)\b(breaking|just (announced|happened)|latest news|live updates?)\b",
        ),
        rule(
            "volatile.live_event",
            Volatile,
            r"(?i)\b(who won|who is winning|final score|standings|traffic on)\b",
        ),
        rule(
            "volatile.weather",
            Volatile,
            r"(?i)\b(weather|forecast|temperature outside)\b",
        ),
        // ── Semi-stable ──────────────────────────────────────────────────────
        rule(
            "semi.office_holder",
            SemiStable,
            r"(?i)\b(who is|who's)\s+(the\s+)?(current\s+)?(president|prime minister|ceo|governor|mayor|chancellor|king|queen|leader|head coach|secretary|speaker)\b",
        ),
        rule(
            "semi.ranking",
            SemiStable,
            r"(?i)\b(best|top \d+|ranking|rankings|most popular|largest|biggest|richest)\b",
        ),
        rule(
            "semi.statistics",
            SemiStable,
            r"(?i)\b(population|gdp|unemployment|inflation rate|median income)\b",
        ),
        rule(
            "semi.release",
            SemiStable,
            r"(?i)\b(version|release|update|edition)\s+(of|for)\b",
        ),
        rule(
            "semi.regulation",
            SemiStable,
            r"(?i)\b(laws?|regulations?|polic(y|ies)|guidelines?|requirements?|rules?)\s+(on|for|in|about)\b",
        ),
        rule(
            "semi.still",
            SemiStable,
            r"(?i)\b(still|anymore|these days|nowadays)\b",
        ),
        // ── Permanent ────────────────────────────────────────────────────────
        rule(
            "permanent.definition",
            Permanent,
            r"(?i)\b(what is|what are|what's|define|definition of|meaning of)\b",
        ),
        rule(
            "permanent.history",
            Permanent,
            r"(?i)\b(history of|when was|when did|who invented|who discovered|who wrote|who painted|founded in|born in)\b",
        ),
        rule(
            "permanent.science",
            Permanent,
            r"(?i)\b(boiling point|freezing point|speed of light|chemical formula|atomic number|formula for|how many (legs|bones|planets|sides|continents))\b",
        ),
        rule(
            "permanent.mechanism",
            Permanent,
            r"(?i)\bhow (does|do)\s+(an?\s+|the\s+)?\w+\s+work\b",
        ),
        rule(
            "permanent.math",
            Permanent,
            r"(?i)\b(calculate|square root|equation|theorem|derivative|integral)\b",
        ),
        rule(
            "permanent.language",
            Permanent,
            r"(?i)\b(spell|spelling|translate|synonym|antonym|grammar|pronounce)\b",
        ),
    ]
});

/// The compiled rule table, in evaluation order.
pub fn marker_rules() -> &'static [MarkerRule] {
    &MARKER_RULES
}

/// Ids and classes of every rule matching `text`, in table order.
pub fn matching_rules(text: &str) -> Vec<&'static MarkerRule> {
    marker_rules()
        .iter()
        .filter(|rule| rule.pattern.is_match(text))
        .collect()
}
