//! Cache & Fingerprint (spec.md §4.7): a content-addressed store mapping
//! `fingerprint(trial_id, criteria_text)` to a compiled tree with a TTL.
//! Defined as a small `{get, put, delete}` interface (spec.md §9 Design
//! Notes) so the Compiler never depends on a concrete backend;
//! `InMemoryCache` is the only implementation shipped here, but a
//! distributed KV store is a drop-in swap.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::error::EngineError;
use crate::schema::CriterionTree;

/// A stored, compiled tree plus the bookkeeping needed to decide
/// freshness (spec.md §3 Cache entry).
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub trial_id: String,
    pub criteria_text: String,
    pub compiled_tree: CriterionTree,
    pub created_at: SystemTime,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: SystemTime) -> bool {
        now.duration_since(self.created_at)
            .map(|age| age < self.ttl)
            .unwrap_or(true)
    }
}

/// `fingerprint = hash(trial_id, criteria_text)` (spec.md §4.6 step 1):
/// a SHA-256 digest over the two fields joined by a byte that cannot
/// appear in either, so `(trial_id, criteria_text)` pairs that would
/// concatenate identically as plain strings still hash distinctly.
pub fn fingerprint(trial_id: &str, criteria_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(trial_id.as_bytes());
    hasher.update([0x1f]);
    hasher.update(criteria_text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `{get, put, delete}` (spec.md §9 Design Notes). Implementations must
/// not assume strong consistency: "cache misses are recoverable by
/// re-compilation" (spec.md §4.7).
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, fingerprint: &str) -> Result<Option<CacheEntry>, EngineError>;
    async fn put(&self, entry: CacheEntry) -> Result<(), EngineError>;
    async fn delete(&self, fingerprint: &str) -> Result<(), EngineError>;
}

/// Lock-free, process-local cache over `dashmap`. TTL expiry is lazy: an
/// expired entry is only removed when a `get` observes it stale (spec.md
/// §4.7), matching the "deletion on TTL expiry is lazy (on read)"
/// requirement.
#[derive(Default)]
pub struct InMemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, fingerprint: &str) -> Result<Option<CacheEntry>, EngineError> {
        let now = SystemTime::now();
        let Some(entry) = self.entries.get(fingerprint) else {
            return Ok(None);
        };
        if entry.is_fresh(now) {
            Ok(Some(entry.clone()))
        } else {
            drop(entry);
            self.entries.remove(fingerprint);
            Ok(None)
        }
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), EngineError> {
        // Concurrent compilations of the same fingerprint are permitted
        // (spec.md §5): last writer wins, and the produced tree is
        // identical by construction (P2), so this is a plain overwrite.
        self.entries.insert(entry.fingerprint.clone(), entry);
        Ok(())
    }

    async fn delete(&self, fingerprint: &str) -> Result<(), EngineError> {
        self.entries.remove(fingerprint);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(fingerprint: &str, ttl: Duration) -> CacheEntry {
        CacheEntry {
            fingerprint: fingerprint.to_string(),
            trial_id: "t1".into(),
            criteria_text: "Inclusion: Age >= 18.".into(),
            compiled_tree: vec![],
            created_at: SystemTime::now(),
            ttl,
        }
    }

    #[test]
    fn fingerprint_is_deterministic() {
        assert_eq!(
            fingerprint("t1", "Age >= 18"),
            fingerprint("t1", "Age >= 18")
        );
    }

    #[test]
    fn fingerprint_distinguishes_boundary_shifted_inputs() {
        // "t1" + "2text" vs "t12" + "text" would collide under naive
        // concatenation; the separator byte must prevent that.
        assert_ne!(fingerprint("t1", "2text"), fingerprint("t12", "text"));
    }

    #[tokio::test]
    async fn put_then_get_round_trips_within_ttl() {
        let cache = InMemoryCache::new();
        let fp = fingerprint("t1", "Age >= 18");
        cache.put(entry(&fp, Duration::from_secs(3600))).await.unwrap();
        let got = cache.get(&fp).await.unwrap();
        assert!(got.is_some());
    }

    #[tokio::test]
    async fn expired_entry_is_lazily_evicted_on_read() {
        let cache = InMemoryCache::new();
        let fp = fingerprint("t1", "Age >= 18");
        cache.put(entry(&fp, Duration::from_secs(0))).await.unwrap();
        std::thread::sleep(Duration::from_millis(5));
        let got = cache.get(&fp).await.unwrap();
        assert!(got.is_none());
        assert!(cache.entries.is_empty());
    }

    #[tokio::test]
    async fn miss_returns_none_without_error() {
        let cache = InMemoryCache::new();
        assert!(cache.get("nonexistent").await.unwrap().is_none());
    }
}
