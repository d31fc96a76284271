//! The `FreshnessCache` service object.
//!
//! One instance per process (or per test). The clock and the storage backend
//! are injected, so tests get isolated caches with controllable time.
//!
//! Expiry is lazy: `get` evicts an expired entry on read and records both an
//! eviction and a miss. `clear_expired` sweeps the rest. An entry's TTL is
//! taken from the TTL table when it is created and never recomputed, so
//! `set_ttl_policy` only affects entries stored afterwards.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use tracing::{debug, info};

use truthgate_contracts::{
    cache::{CacheEntry, CacheLookup, CacheStats, MissReason, SourceClass},
    config::CacheConfig,
    truth::TruthType,
};
use truthgate_core::{
    traits::{CacheStore, Clock},
    SystemClock,
};

use crate::{fingerprint::fingerprint, store::InMemoryStore};

#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    stores: u64,
    evictions: u64,
}

/// Fingerprint-keyed store of verified answers with per-class TTLs.
pub struct FreshnessCache {
    clock: Arc<dyn Clock>,
    store: Box<dyn CacheStore>,
    ttl_policy: RwLock<CacheConfig>,
    counters: Mutex<Counters>,
}

impl FreshnessCache {
    /// A cache on the system clock with an in-memory backend.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_parts(config, Arc::new(SystemClock), Box::new(InMemoryStore::new()))
    }

    pub fn with_parts(config: CacheConfig, clock: Arc<dyn Clock>, store: Box<dyn CacheStore>) -> Self {
        Self {
            clock,
            store,
            ttl_policy: RwLock::new(config),
            counters: Mutex::new(Counters::default()),
        }
    }

    /// The cache key for `query`.
    pub fn fingerprint(&self, query: &str) -> String {
        fingerprint(query)
    }

    /// TTL currently configured for `truth_type`.
    pub fn ttl_for(&self, truth_type: TruthType) -> Duration {
        self.ttl_policy
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .ttl_for(truth_type)
    }

    /// Replace the TTL table. Live entries keep the TTL they were stored with.
    pub fn set_ttl_policy(&self, config: CacheConfig) {
        *self
            .ttl_policy
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
    }

    /// Store a verified answer.
    ///
    /// Returns `None` without storing when the query has no usable
    /// fingerprint or when the truth class has a zero TTL.
    pub fn set(
        &self,
        query: &str,
        data: serde_json::Value,
        truth_type: TruthType,
        sources_used: Vec<String>,
        confidence: f64,
    ) -> Option<CacheEntry> {
        let key = fingerprint(query);
        if key.is_empty() {
            debug!("refusing to cache query with empty fingerprint");
            return None;
        }

        let ttl = self.ttl_for(truth_type);
        if ttl.is_zero() {
            debug!(query_fingerprint = %key, truth_type = %truth_type, "truth class is never cached");
            return None;
        }

        let ttl_ms = u64::try_from(ttl.as_millis()).ok()?;
        let verified_at = self.clock.now();
        let expires_at = verified_at.checked_add_signed(chrono::Duration::from_std(ttl).ok()?)?;
        let source_class = if sources_used.is_empty() {
            SourceClass::Internal
        } else {
            SourceClass::External
        };

        let entry = CacheEntry {
            fingerprint: key,
            original_query: query.to_string(),
            data,
            truth_type,
            source_class,
            sources_used,
            confidence,
            verified_at,
            expires_at,
            ttl_ms,
        };

        self.store.insert(entry.clone());
        self.counters().stores += 1;
        debug!(
            query_fingerprint = %entry.fingerprint,
            truth_type = %truth_type,
            ttl_ms,
            "cached verified answer"
        );
        Some(entry)
    }

    /// Read the entry for `query`, evicting it if it has expired.
    pub fn get(&self, query: &str) -> CacheLookup {
        let key = fingerprint(query);
        if key.is_empty() {
            self.counters().misses += 1;
            return CacheLookup::Miss(MissReason::InvalidKey);
        }

        let Some(entry) = self.store.get(&key) else {
            self.counters().misses += 1;
            return CacheLookup::Miss(MissReason::Absent);
        };

        if entry.is_expired_at(self.clock.now()) {
            self.store.remove(&key);
            let mut counters = self.counters();
            counters.evictions += 1;
            counters.misses += 1;
            debug!(query_fingerprint = %key, "evicted expired entry on read");
            return CacheLookup::Miss(MissReason::Expired);
        }

        self.counters().hits += 1;
        debug!(query_fingerprint = %key, "cache hit");
        CacheLookup::Hit(entry)
    }

    /// Drop the entry for `query`. Returns whether one existed.
    pub fn invalidate(&self, query: &str) -> bool {
        let key = fingerprint(query);
        !key.is_empty() && self.store.remove(&key).is_some()
    }

    /// Drop every entry of `truth_type`. Returns the number removed.
    pub fn invalidate_by_type(&self, truth_type: TruthType) -> usize {
        let removed = self
            .store
            .remove_where(&|entry| entry.truth_type == truth_type)
            .len();
        info!(truth_type = %truth_type, removed, "invalidated cache entries by type");
        removed
    }

    /// Sweep all expired entries. Each counts as an eviction.
    pub fn clear_expired(&self) -> usize {
        let now = self.clock.now();
        let removed = self.store.remove_where(&|entry| entry.is_expired_at(now)).len();
        self.counters().evictions += removed as u64;
        removed
    }

    /// Drop everything and reset the counters. Returns the number removed.
    pub fn clear(&self) -> usize {
        let removed = self.store.remove_where(&|_| true).len();
        *self.counters() = Counters::default();
        info!(removed, "cache cleared");
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = {
            let counters = self.counters();
            let reads = counters.hits + counters.misses;
            CacheStats {
                hits: counters.hits,
                misses: counters.misses,
                stores: counters.stores,
                evictions: counters.evictions,
                hit_rate: if reads == 0 {
                    0.0
                } else {
                    counters.hits as f64 / reads as f64
                },
                ..CacheStats::default()
            }
        };

        for entry in self.store.entries() {
            *stats.by_truth_type.entry(entry.truth_type).or_insert(0) += 1;
        }
        stats.size = self.store.len();
        stats
    }

    fn counters(&self) -> MutexGuard<'_, Counters> {
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for FreshnessCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl std::fmt::Debug for FreshnessCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreshnessCache")
            .field("size", &self.store.len())
            .finish_non_exhaustive()
    }
}
