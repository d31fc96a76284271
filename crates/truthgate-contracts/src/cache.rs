//! Freshness-cache record and statistics types.
//!
//! A `CacheEntry` is created on a successful lookup and is read-checked for
//! expiry on every access. Its TTL is frozen at creation time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::truth::TruthType;

/// Where a claim's supporting data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceClass {
    /// Internal knowledge, vault documents, or the model's own answer.
    Internal,
    /// A live external source fetched by the lookup executor.
    External,
}

/// One verified answer stored under a query fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub original_query: String,
    /// Arbitrary JSON body. The cache never inspects this.
    pub data: serde_json::Value,
    pub truth_type: TruthType,
    pub source_class: SourceClass,
    pub sources_used: Vec<String>,
    pub confidence: f64,
    pub verified_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ttl_ms: u64,
}

impl CacheEntry {
    /// True once `now` has reached `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Why a cache read produced no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// The query normalised to an empty fingerprint.
    InvalidKey,
    /// Nothing stored under the fingerprint.
    Absent,
    /// An entry existed but had expired; it was evicted by this read.
    Expired,
}

/// The result of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(CacheEntry),
    Miss(MissReason),
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }

    /// Consume the read and return the entry on a hit.
    pub fn into_entry(self) -> Option<CacheEntry> {
        match self {
            CacheLookup::Hit(entry) => Some(entry),
            CacheLookup::Miss(_) => None,
        }
    }
}

/// Snapshot of the cache's running counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub evictions: u64,
    /// `hits / (hits + misses)`, or 0 before any read.
    pub hit_rate: f64,
    /// Live (stored, not yet evicted) entries per truth class.
    pub by_truth_type: BTreeMap<TruthType, u64>,
    pub size: usize,
}
