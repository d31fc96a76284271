//! # truthgate-classify
//!
//! Truth-volatility classification for conversational queries.
//!
//! ## Overview
//!
//! [`TruthClassifier`] buckets a query into `VOLATILE`, `SEMI_STABLE`,
//! `PERMANENT`, `DOCUMENT_REVIEW` or `AMBIGUOUS` using an ordered marker rule
//! table (see [`rules`]) with a pluggable stage-2 fallback.
//! [`detect_high_stakes`] runs alongside it, and
//! [`LookupRequirementPolicy`] turns both into a lookup decision.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use truthgate_classify::{TruthClassifier, LookupRequirementPolicy};
//!
//! let classifier = TruthClassifier::default();
//! let c = classifier.classify("What is the current price of Bitcoin?");
//! let req = LookupRequirementPolicy::default().is_lookup_required(query, &c, None);
//! ```

pub mod classifier;
pub mod requirement;
pub mod rules;
pub mod stakes;

pub use classifier::{ConservativeFallback, TruthClassifier};
pub use requirement::{freshness_marker, has_news_intent, is_reported_claim, LookupRequirementPolicy};
pub use stakes::detect_high_stakes;
