//! Process-wide unit vector cache keyed by exact unit text.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

struct CacheEntry {
    vector: Arc<Vec<f32>>,
    last_used: AtomicU64,
}

/// Cache statistics snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorCacheStats {
    /// Current entry count
    pub entries: usize,
    /// Lookups served from the cache
    pub hits: usize,
    /// Lookups that missed
    pub misses: usize,
    /// Entries evicted so far
    pub evictions: usize,
}

impl VectorCacheStats {
    /// Hit rate over all lookups.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded, concurrent text → vector cache with least-recently-used eviction.
///
/// Keys are the exact unit text, so identical spans from different runs
/// share a vector. Concurrent inserts of the same key are last-writer-wins.
pub struct VectorCache {
    entries: DashMap<String, CacheEntry>,
    max_entries: usize,
    tick: AtomicU64,
    hits: AtomicUsize,
    misses: AtomicUsize,
    evictions: AtomicUsize,
}

impl VectorCache {
    /// Create a cache holding at most `max_entries` vectors.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
            tick: AtomicU64::new(0),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            evictions: AtomicUsize::new(0),
        }
    }

    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed)
    }

    /// Look up a vector, updating its recency.
    pub fn get(&self, text: &str) -> Option<Arc<Vec<f32>>> {
        match self.entries.get(text) {
            Some(entry) => {
                entry.last_used.store(self.next_tick(), Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(&entry.vector))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert a vector, evicting the least recently used entries when full.
    pub fn insert(&self, text: impl Into<String>, vector: Vec<f32>) {
        let entry = CacheEntry {
            vector: Arc::new(vector),
            last_used: AtomicU64::new(self.next_tick()),
        };
        self.entries.insert(text.into(), entry);
        if self.entries.len() > self.max_entries {
            self.evict();
        }
    }

    fn evict(&self) {
        // Shrink to 90% of capacity so eviction does not run on every insert.
        let target = (self.max_entries * 9 / 10).max(1);
        let excess = self.entries.len().saturating_sub(target);
        if excess == 0 {
            return;
        }

        let mut by_age: Vec<(u64, String)> = self
            .entries
            .iter()
            .map(|entry| (entry.last_used.load(Ordering::Relaxed), entry.key().clone()))
            .collect();
        by_age.sort_unstable();

        for (_, key) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        self.evictions.fetch_add(excess, Ordering::Relaxed);
        debug!(evicted = excess, "Evicted least recently used vectors");
    }

    /// True when `text` is cached, without touching statistics.
    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(text)
    }

    /// Number of cached vectors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Statistics snapshot.
    pub fn stats(&self) -> VectorCacheStats {
        VectorCacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_and_misses_are_counted() {
        let cache = VectorCache::new(8);
        assert!(cache.get("a").is_none());
        cache.insert("a", vec![1.0]);
        assert_eq!(cache.get("a").unwrap().as_slice(), &[1.0]);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn eviction_removes_least_recently_used() {
        let cache = VectorCache::new(10);
        for i in 0..10 {
            cache.insert(format!("k{i}"), vec![i as f32]);
        }
        // Touch k0 so it becomes the most recent.
        cache.get("k0");
        cache.insert("k10", vec![10.0]);

        assert!(cache.len() <= 10);
        assert!(cache.contains("k0"));
        assert!(cache.contains("k10"));
        assert!(!cache.contains("k1"));
        assert!(cache.stats().evictions >= 1);
    }

    #[test]
    fn last_writer_wins() {
        let cache = VectorCache::new(4);
        cache.insert("x", vec![1.0]);
        cache.insert("x", vec![2.0]);
        assert_eq!(cache.get("x").unwrap().as_slice(), &[2.0]);
        assert_eq!(cache.len(), 1);
    }
}
