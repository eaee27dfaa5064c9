//! Fingerprint-keyed decision cache
//!
//! FIFO eviction with a TTL. Correctness only depends on the staleness bound
//! (an expired entry is never returned) and the capacity bound, so no recency
//! bookkeeping is done on reads.

use crate::core::config::CacheConfig;
use crate::decision::action::Action;
use crate::decision::context::Fingerprint;
use ahash::AHashMap;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    action: Action,
    inserted_at: Instant,
    generation: u64,
}

#[derive(Debug)]
pub struct DecisionCache {
    entries: AHashMap<Fingerprint, CacheEntry>,
    /// Insertion order; records whose generation no longer matches the live
    /// entry are skipped and compacted away
    order: VecDeque<(Fingerprint, u64)>,
    ttl: Duration,
    capacity: usize,
    enabled: bool,
    next_generation: u64,
    misses: u64,
}

impl DecisionCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: AHashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            ttl,
            capacity,
            enabled: true,
            next_generation: 0,
            misses: 0,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let mut cache = Self::new(Duration::from_millis(config.ttl_ms), config.capacity);
        cache.enabled = config.enabled;
        cache
    }

    /// Look up `key` as of `now`. Expired entries are removed and count as misses.
    pub fn get_at(&mut self, key: Fingerprint, now: Instant) -> Option<Action> {
        if !self.enabled {
            return None;
        }
        match self.entries.get(&key) {
            Some(entry) if now.saturating_duration_since(entry.inserted_at) < self.ttl => {
                Some(entry.action)
            }
            Some(_) => {
                self.entries.remove(&key);
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert or overwrite `key`; evicts the oldest insertion when over capacity.
    pub fn insert_at(&mut self, key: Fingerprint, action: Action, now: Instant) {
        if !self.enabled {
            return;
        }
        let generation = self.next_generation;
        self.next_generation += 1;
        self.entries.insert(
            key,
            CacheEntry {
                action,
                inserted_at: now,
                generation,
            },
        );
        self.order.push_back((key, generation));

        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some((old_key, old_gen)) => {
                    if self.entries.get(&old_key).map(|e| e.generation) == Some(old_gen) {
                        self.entries.remove(&old_key);
                    }
                }
                None => break,
            }
        }

        if self.order.len() > self.capacity * 2 {
            self.compact();
        }
    }

    fn compact(&mut self) {
        let entries = &self.entries;
        self.order
            .retain(|(key, gen)| entries.get(key).map(|e| e.generation) == Some(*gen));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
