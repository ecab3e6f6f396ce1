// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Response caching layer
//!
//! This module provides an in-memory cache for validated upstream payloads. Entries
//! expire after a fixed TTL and the store is bounded by a maximum entry count, evicting
//! the least recently used entry first. The cache is best-effort: callers treat any
//! absence as a miss and fall through to the network.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};
use url::form_urlencoded;

use crate::query::QueryParams;

/// Build the cache key for a request
///
/// `base` is the canonical request URL without query string. Parameters are sorted by
/// name, null values are dropped and the rest are URL-encoded. The query suffix is only
/// appended when at least one parameter survives, so two logically identical requests
/// always share a key regardless of parameter insertion order.
pub fn cache_key(base: &str, params: Option<&QueryParams>) -> String {
    let Some(params) = params else {
        return base.to_string();
    };

    let mut pairs: Vec<(&str, String)> = params.rendered().collect();
    pairs.sort_by(|(a, _), (b, _)| a.cmp(b));

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();

    if query.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{query}")
    }
}

/// Cached value with access tracking
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    last_used: u64,
    access_count: u64,
}

impl<V> CacheEntry<V> {
    fn is_valid(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() < ttl
    }
}

/// Bounded TTL cache with least recently used eviction
#[derive(Debug)]
pub struct ResponseCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    max_entries: usize,
    /// Logical clock used to order accesses
    clock: AtomicU64,
    stats: DashMap<&'static str, u64>,
}

impl<V: Clone> ResponseCache<V> {
    /// Create a cache with the given TTL and capacity
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries,
            clock: AtomicU64::new(0),
            stats: DashMap::new(),
        }
    }

    /// Fetch a fresh entry, removing it if it has expired
    pub fn get(&self, key: &str) -> Option<V> {
        if let Some(mut cached) = self.entries.get_mut(key) {
            if cached.is_valid(self.ttl) {
                cached.last_used = self.tick();
                cached.access_count += 1;
                self.increment_stat("hits");
                trace!(key, access_count = cached.access_count, "cache hit");
                return Some(cached.value.clone());
            }
            drop(cached);
            if self.remove_stale(key) {
                self.increment_stat("expired");
                debug!(key, "expired cache entry removed");
            }
        }

        self.increment_stat("misses");
        None
    }

    /// Remove `key` only while its entry is expired; a concurrently stored fresh value stays
    fn remove_stale(&self, key: &str) -> bool {
        self.entries
            .remove_if(key, |_, entry| !entry.is_valid(self.ttl))
            .is_some()
    }

    /// Store a value, evicting the least recently used entry when at capacity
    pub fn insert(&self, key: impl Into<String>, value: V) {
        if self.max_entries == 0 {
            return;
        }

        let key = key.into();
        if !self.entries.contains_key(&key) {
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                clippy::cast_precision_loss
            )]
            let capacity_threshold = (self.max_entries as f64 * 0.9) as usize;

            if self.entries.len() >= capacity_threshold {
                self.cleanup_expired();
            }
            while self.entries.len() >= self.max_entries {
                if !self.evict_lru() {
                    break;
                }
            }
        }

        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
            last_used: self.tick(),
            access_count: 0,
        };
        self.entries.insert(key.clone(), entry);
        self.increment_stat("stores");

        trace!(
            key = %key,
            size = self.entries.len(),
            max_entries = self.max_entries,
            "stored response in cache"
        );
    }

    /// Remove a single entry
    pub fn remove(&self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|(_, entry)| entry.value)
    }

    /// Remove every entry, keeping statistics
    pub fn clear(&self) {
        self.entries.clear();
        debug!("cleared all cached responses");
    }

    /// Number of entries currently held, expired or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry and return how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_valid(self.ttl));
        let removed = before.saturating_sub(self.entries.len());

        if removed > 0 {
            self.add_stat("expired", removed as u64);
            debug!(
                removed_entries = removed,
                remaining_entries = self.entries.len(),
                "cleaned up expired cache entries"
            );
        }

        removed
    }

    /// Snapshot of cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.get_stat("hits");
        let misses = self.get_stat("misses");
        let total_lookups = hits + misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if total_lookups > 0 {
            hits as f64 / total_lookups as f64
        } else {
            0.0
        };

        let entry_count = self.entries.len();
        #[allow(clippy::cast_precision_loss)]
        let utilization_rate = if self.max_entries > 0 {
            entry_count as f64 / self.max_entries as f64
        } else {
            0.0
        };

        let ttl_ms = u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX);

        CacheStats {
            entry_count,
            hits,
            misses,
            stores: self.get_stat("stores"),
            evictions: self.get_stat("evictions"),
            expired: self.get_stat("expired"),
            hit_rate,
            utilization_rate,
            max_capacity: self.max_entries,
            ttl_ms,
        }
    }

    fn evict_lru(&self) -> bool {
        let lru_key = self
            .entries
            .iter()
            .min_by_key(|item| item.value().last_used)
            .map(|item| item.key().clone());

        let Some(key) = lru_key else {
            return false;
        };

        if let Some((_, entry)) = self.entries.remove(&key) {
            self.increment_stat("evictions");
            info!(
                key = %key,
                access_count = entry.access_count,
                age_ms = entry.inserted_at.elapsed().as_millis(),
                remaining_entries = self.entries.len(),
                "evicted lru cache entry due to capacity limit"
            );
        }
        true
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn increment_stat(&self, key: &'static str) {
        self.add_stat(key, 1);
    }

    fn add_stat(&self, key: &'static str, amount: u64) {
        self.stats
            .entry(key)
            .and_modify(|v| *v += amount)
            .or_insert(amount);
    }

    fn get_stat(&self, key: &str) -> u64 {
        self.stats.get(key).map_or(0, |v| *v)
    }
}

/// Cache statistics and metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cached entries
    pub entry_count: usize,
    /// Cache hit count
    pub hits: u64,
    /// Cache miss count
    pub misses: u64,
    /// Number of values stored
    pub stores: u64,
    /// Number of capacity evictions
    pub evictions: u64,
    /// Number of entries dropped after expiry
    pub expired: u64,
    /// Cache hit rate (0.0 to 1.0)
    pub hit_rate: f64,
    /// Cache utilization rate (0.0 to 1.0)
    pub utilization_rate: f64,
    /// Maximum cache capacity
    pub max_capacity: usize,
    /// Entry TTL in milliseconds
    pub ttl_ms: u64,
}
