//! In-memory implementation of `CacheStore`.
//!
//! `InMemoryStore` keeps entries in a `HashMap` behind a `Mutex`. It is the
//! default backend of `FreshnessCache`; clones share the same map.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use truthgate_contracts::cache::CacheEntry;
use truthgate_core::traits::CacheStore;

/// Process-local, fingerprint-keyed entry map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Entries are plain data, so a poisoned map is still consistent.
    fn map(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheStore for InMemoryStore {
    fn get(&self, fingerprint: &str) -> Option<CacheEntry> {
        self.map().get(fingerprint).cloned()
    }

    fn insert(&self, entry: CacheEntry) {
        self.map().insert(entry.fingerprint.clone(), entry);
    }

    fn remove(&self, fingerprint: &str) -> Option<CacheEntry> {
        self.map().remove(fingerprint)
    }

    fn remove_where(&self, predicate: &dyn Fn(&CacheEntry) -> bool) -> Vec<CacheEntry> {
        let mut map = self.map();
        let doomed: Vec<String> = map
            .values()
            .filter(|entry| predicate(entry))
            .map(|entry| entry.fingerprint.clone())
            .collect();
        doomed
            .iter()
            .filter_map(|fingerprint| map.remove(fingerprint))
            .collect()
    }

    fn entries(&self) -> Vec<CacheEntry> {
        self.map().values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.map().len()
    }
}
