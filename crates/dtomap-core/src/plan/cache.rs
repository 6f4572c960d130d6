//! Concurrent plan cache
//!
//! Plans are stored per (type id, overrides fingerprint). Lookups go through a
//! sharded map so hits never take a global lock. Two threads missing the same
//! key may both build; the later insert wins, which is harmless because a plan
//! is a pure function of its key. Build failures are stored like plans.
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

use super::ResolvedMappingPlan;
use crate::error::BuildError;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Cached outcome of a plan build
pub type CachedPlan = Result<Arc<ResolvedMappingPlan>, BuildError>;

/// Cache key: target type and overrides fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub type_id: String,
    pub fingerprint: String,
}

impl PlanKey {
    pub fn new(type_id: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            fingerprint: fingerprint.into(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cached entries, failures included
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Plan cache shared by every resolve call of an engine
#[derive(Debug)]
pub struct PlanCache {
    entries: DashMap<PlanKey, CachedPlan>,
    hits: AtomicU64,
    misses: AtomicU64,
    enabled: bool,
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanCache {
    /// Create an enabled cache
    pub fn new() -> Self {
        Self::with_enabled(true)
    }

    /// Create a cache; a disabled cache builds on every lookup
    pub fn with_enabled(enabled: bool) -> Self {
        Self {
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            enabled,
        }
    }

    /// Whether entries are stored
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return the cached outcome for `key`, building and storing it on a miss
    pub fn get_or_build<F>(&self, key: PlanKey, build: F) -> CachedPlan
    where
        F: FnOnce() -> CachedPlan,
    {
        if self.enabled {
            if let Some(entry) = self.entries.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return entry.value().clone();
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(type_id = %key.type_id, fingerprint = %key.fingerprint, "plan cache miss");

        let outcome = build();
        if self.enabled {
            self.entries.insert(key, outcome.clone());
        }
        outcome
    }

    /// Whether an entry exists for `key`
    pub fn contains(&self, key: &PlanKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop every entry of `type_id`; returns how many were removed
    pub fn invalidate(&self, type_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.type_id != type_id);
        let removed = before.saturating_sub(self.entries.len());
        debug!(type_id, removed, "invalidated cached plans");
        removed
    }

    /// Drop every entry; counters are kept
    pub fn clear(&self) {
        self.entries.clear();
        debug!("cleared plan cache");
    }

    /// Reset hit and miss counters
    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Current size and counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn plan(type_id: &str) -> CachedPlan {
        Ok(Arc::new(ResolvedMappingPlan::new(
            type_id.to_string(),
            "fp".to_string(),
            Vec::new(),
            Vec::new(),
        )))
    }

    #[test]
    fn test_builds_once_per_key() {
        let cache = PlanCache::new();
        let builds = Cell::new(0);
        let build = || {
            builds.set(builds.get() + 1);
            plan("User")
        };

        let first = cache.get_or_build(PlanKey::new("User", "a"), build).unwrap();
        let second = cache.get_or_build(PlanKey::new("User", "a"), build).unwrap();

        assert_eq!(builds.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            cache.stats(),
            CacheStats {
                size: 1,
                hits: 1,
                misses: 1
            }
        );
    }

    #[test]
    fn test_failures_are_cached() {
        let cache = PlanCache::new();
        let builds = Cell::new(0);
        let build = || {
            builds.set(builds.get() + 1);
            Err(BuildError::filter_not_found("shout"))
        };

        assert!(cache.get_or_build(PlanKey::new("User", "a"), build).is_err());
        assert!(cache.get_or_build(PlanKey::new("User", "a"), build).is_err());
        assert_eq!(builds.get(), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_invalidate_by_type() {
        let cache = PlanCache::new();
        cache.get_or_build(PlanKey::new("User", "a"), || plan("User")).unwrap();
        cache.get_or_build(PlanKey::new("User", "b"), || plan("User")).unwrap();
        cache.get_or_build(PlanKey::new("Order", "a"), || plan("Order")).unwrap();

        assert_eq!(cache.invalidate("User"), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&PlanKey::new("Order", "a")));
        assert_eq!(cache.invalidate("Missing"), 0);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 3);
        cache.reset_stats();
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_disabled_cache_always_builds() {
        let cache = PlanCache::with_enabled(false);
        let builds = Cell::new(0);
        let build = || {
            builds.set(builds.get() + 1);
            plan("User")
        };
        cache.get_or_build(PlanKey::new("User", "a"), build).unwrap();
        cache.get_or_build(PlanKey::new("User", "a"), build).unwrap();

        assert_eq!(builds.get(), 2);
        assert_eq!(cache.stats(), CacheStats { size: 0, hits: 0, misses: 2 });
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            size: 1,
            hits: 3,
            misses: 1,
        };
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
