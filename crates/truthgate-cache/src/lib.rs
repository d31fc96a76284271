//! # truthgate-cache
//!
//! A fingerprint-keyed freshness cache for verified answers.
//!
//! Paraphrased queries share one entry (see [`fingerprint`]); each entry's
//! lifetime is fixed by its truth class when stored. [`FreshnessCache`] takes
//! an injectable [`Clock`](truthgate_core::traits::Clock) and
//! [`CacheStore`](truthgate_core::traits::CacheStore) backend.

pub mod cache;
pub mod fingerprint;
pub mod store;

pub use cache::FreshnessCache;
pub use fingerprint::fingerprint;
pub use store::InMemoryStore;
