//! Enumeration of tile groups that sum to a roll.
//!
//! The enumerator is a bottom-up dynamic program over partial sums. For each
//! sum `s` it records every subset of the available tiles that adds up to `s`,
//! built by extending the subsets of `s - j` with tile `j`. Subsets are
//! bitmasks, so deduplication is by set identity rather than insertion order.
//!
//! This is the dominant cost of the solver, so [`CombinationCache`] keeps the
//! result for every `(available, target)` pair it has seen.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::exact::board::Board;

/// Every subset of `available` whose values sum exactly to `target`.
///
/// Returns an empty vector when the target is unreachable. The result is
/// sorted by mask so that callers iterate in a deterministic order.
pub fn combinations_summing_to(available: Board, target: u32) -> Vec<Board> {
    if target == 0 || target > available.sum() {
        return Vec::new();
    }

    let tiles: Vec<u32> = available.values().map(u32::from).collect();
    let target = target as usize;

    // table[s] holds the masks of all subsets summing to s
    let mut table: Vec<FxHashSet<u32>> = vec![FxHashSet::default(); target + 1];

    for s in 1..=target {
        let mut found = FxHashSet::default();

        if s <= 32 && available.contains(s as u8) {
            found.insert(1u32 << (s - 1));
        }

        for &j in tiles.iter().filter(|&&j| (j as usize) < s) {
            let bit = 1u32 << (j - 1);
            for &subset in &table[s - j as usize] {
                if subset & bit == 0 {
                    found.insert(subset | bit);
                }
            }
        }

        table[s] = found;
    }

    let mut result: Vec<Board> = table[target].iter().map(|&m| Board::from_mask(m)).collect();
    result.sort_unstable();
    result
}

/// Thread-safe cache of enumerator results keyed by `(available, target)`.
///
/// Entries are written once and never change, so concurrent readers only
/// contend briefly on the lock.
#[derive(Debug, Default)]
pub struct CombinationCache {
    entries: RwLock<FxHashMap<(u32, u32), Vec<Board>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CombinationCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached version of [`combinations_summing_to`].
    pub fn get(&self, available: Board, target: u32) -> Vec<Board> {
        let key = (available.mask(), target);

        if let Some(found) = self.entries.read().unwrap().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return found.clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let computed = combinations_summing_to(available, target);
        self.entries
            .write()
            .unwrap()
            .entry(key)
            .or_insert_with(|| computed.clone());
        computed
    }

    /// Number of cached `(available, target)` pairs.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Check if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that ran the enumerator.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Fraction of lookups answered from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
