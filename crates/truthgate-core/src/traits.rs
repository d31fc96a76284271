//! Core trait definitions for the truthgate pipeline.
//!
//! These traits are the seams between the deterministic core and everything
//! that is environment-dependent or external:
//!
//! - `Clock`:              time source for TTLs and `verified_at`
//! - `Credentials`:        credential lookup for key-gated sources
//! - `Fetcher`:            outbound HTTP GET
//! - `CacheStore`:         storage backend behind the freshness cache
//! - `FallbackClassifier`: stage-2 classifier for ambiguous queries
//! - `ResponseGenerator`:  the prose-writing collaborator
//!
//! Tests substitute every one of them; production wiring uses the standard
//! implementations in this crate and in `truthgate-lookup`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use truthgate_contracts::{
    cache::CacheEntry,
    error::TruthgateResult,
    lookup::VerificationPath,
    truth::TruthType,
};

/// A source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Credential lookup for key-gated sources.
///
/// Returning `None` (or an empty string) makes the source resolve to no URL,
/// which the executor records as a skip rather than an error.
pub trait Credentials: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;

    /// True when `name` resolves to a non-empty credential.
    fn has(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.trim().is_empty())
    }
}

/// A successfully fetched 2xx response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBody {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Why a fetch produced no body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    Timeout,
    /// A non-2xx status code.
    Status(u16),
    Transport(String),
}

/// Outbound HTTP GET.
///
/// Implementations must honour `timeout` and map non-2xx responses to
/// `FetchFailure::Status`. The executor additionally wraps every call in its
/// own timeout, so a misbehaving implementation cannot block a lookup.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedBody, FetchFailure>;
}

/// Storage backend for the freshness cache.
///
/// Keys are fingerprints. Concurrent writers to the same key race under
/// last-write-wins; entries are idempotent re-derivations of the same fact.
pub trait CacheStore: Send + Sync {
    fn get(&self, fingerprint: &str) -> Option<CacheEntry>;

    /// Insert or replace the entry stored under `entry.fingerprint`.
    fn insert(&self, entry: CacheEntry);

    fn remove(&self, fingerprint: &str) -> Option<CacheEntry>;

    /// Remove every entry matching `predicate`, returning the removed entries.
    fn remove_where(&self, predicate: &dyn Fn(&CacheEntry) -> bool) -> Vec<CacheEntry>;

    /// Snapshot of all stored entries (order unspecified).
    fn entries(&self) -> Vec<CacheEntry>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What a stage-2 classifier returns for an ambiguous query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackVerdict {
    pub truth_type: TruthType,
    pub confidence: f64,
    pub reason: String,
}

/// Stage-2 classifier for queries no marker matched.
///
/// Intended to be replaced by a model-backed classifier. An `Err` never blocks
/// the pipeline: the classifier substitutes a last-resort default.
pub trait FallbackClassifier: Send + Sync {
    fn classify(&self, query: &str) -> TruthgateResult<FallbackVerdict>;
}

/// Context strings handed to the response generator.
///
/// The generator injects `data`, `disclosure` and `verification_path` verbatim
/// into its own prompt; it never sees cache or classifier internals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationContext {
    pub query: String,
    pub truth_type: Option<TruthType>,
    pub confidence: Option<f64>,
    pub data: Option<String>,
    pub disclosure: Option<String>,
    pub verification_path: Option<VerificationPath>,
    pub bounded_reasoning_required: bool,
}

/// The prose-writing collaborator.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(&self, context: &GenerationContext) -> TruthgateResult<String>;
}
