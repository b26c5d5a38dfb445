//! Memo store for solved board values.
//!
//! This module provides the thread-safe, write-once map from board bitmask to
//! expected optimal score used by the exact solver.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::{RwLock, RwLockReadGuard};

use crate::exact::board::Board;

/// Thread-safe write-once storage for expected values.
///
/// Keys are board bitmasks over the original tile positions. An entry is
/// written exactly once; later writes for the same key are ignored, so the
/// stored value is immutable after the first write.
///
/// The storage uses interior mutability with `RwLock` so that the parallel
/// solver can read finished levels while a level's results are collected.
#[derive(Debug)]
pub struct MemoStore {
    /// Expected optimal score: board mask -> value
    values: RwLock<FxHashMap<u32, f64>>,
}

impl Default for MemoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoStore {
    /// Create new empty storage.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(FxHashMap::default()),
        }
    }

    /// Create storage with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: RwLock::new(FxHashMap::with_capacity_and_hasher(
                capacity,
                Default::default(),
            )),
        }
    }

    /// Look up the value of a board, if it has been computed.
    pub fn get(&self, board: Board) -> Option<f64> {
        self.values.read().unwrap().get(&board.mask()).copied()
    }

    /// Store the value of a board.
    ///
    /// Returns `true` if the entry was written, `false` if the board already
    /// had a value (which is left untouched).
    pub fn insert(&self, board: Board, value: f64) -> bool {
        let mut values = self.values.write().unwrap();
        match values.get(&board.mask()) {
            Some(existing) => {
                debug_assert_eq!(
                    existing.to_bits(),
                    value.to_bits(),
                    "Memo entry for {} rewritten with a different value",
                    board
                );
                false
            }
            None => {
                values.insert(board.mask(), value);
                true
            }
        }
    }

    /// Store a batch of values under a single write lock.
    ///
    /// Used by the level-parallel solver once a whole cardinality level has
    /// been evaluated. Returns the number of new entries.
    pub fn insert_batch(&self, entries: &[(Board, f64)]) -> usize {
        let mut values = self.values.write().unwrap();
        let mut written = 0;
        for &(board, value) in entries {
            if let std::collections::hash_map::Entry::Vacant(slot) = values.entry(board.mask()) {
                slot.insert(value);
                written += 1;
            }
        }
        written
    }

    /// Get the number of boards stored.
    pub fn len(&self) -> usize {
        self.values.read().unwrap().len()
    }

    /// Check if no boards are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if a board has a value.
    pub fn contains(&self, board: Board) -> bool {
        self.values.read().unwrap().contains_key(&board.mask())
    }

    /// Get read access to the raw map (for analysis/export).
    pub fn values(&self) -> RwLockReadGuard<'_, FxHashMap<u32, f64>> {
        self.values.read().unwrap()
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.values.write().unwrap().clear();
    }

    /// Get total memory usage estimate in bytes.
    pub fn memory_usage(&self) -> usize {
        self.len() * (std::mem::size_of::<u32>() + std::mem::size_of::<f64>())
    }

    /// Export storage to serializable format, sorted by mask.
    pub fn export(&self) -> StorageExport {
        let mut entries: Vec<(u32, f64)> = self
            .values
            .read()
            .unwrap()
            .iter()
            .map(|(&k, &v)| (k, v))
            .collect();
        entries.sort_unstable_by_key(|&(k, _)| k);
        StorageExport { entries }
    }

    /// Import storage from serialized format, replacing current contents.
    pub fn import(&self, data: StorageExport) {
        let mut values = self.values.write().unwrap();
        values.clear();
        values.extend(data.entries);
    }
}

/// Serializable export format for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageExport {
    /// `(board mask, expected value)` pairs, ascending by mask.
    pub entries: Vec<(u32, f64)>,
}

impl Clone for MemoStore {
    fn clone(&self) -> Self {
        Self {
            values: RwLock::new(self.values.read().unwrap().clone()),
        }
    }
}
