//! Transposition table
//!
//! Caches search values by exact position key. Each table belongs to a single
//! top-level search and is dropped with it.

use rustc_hash::FxHashMap;

use crate::game::PositionKey;

/// How a stored value relates to the true minimax value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Searched inside the window: the true value
    Exact,
    /// Search failed high: true value >= stored value
    Lower,
    /// Search failed low: true value <= stored value
    Upper,
}

/// Cached search result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtEntry {
    /// Remaining depth the value was searched to
    pub depth: u32,
    pub value: i64,
    pub bound: Bound,
}

/// Exact-key transposition table
#[derive(Debug, Default)]
pub struct TranspositionTable {
    entries: FxHashMap<PositionKey, TtEntry>,
    probes: u64,
    hits: u64,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `key` searched at least `depth` plies deep
    pub fn probe(&mut self, key: &PositionKey, depth: u32) -> Option<TtEntry> {
        self.probes += 1;
        let entry = self.entries.get(key).filter(|e| e.depth >= depth).copied();
        if entry.is_some() {
            self.hits += 1;
        }
        entry
    }

    /// Store a result; a shallower search never replaces a deeper one
    pub fn store(&mut self, key: PositionKey, depth: u32, value: i64, bound: Bound) {
        let entry = TtEntry { depth, value, bound };
        self.entries
            .entry(key)
            .and_modify(|existing| {
                if depth >= existing.depth {
                    *existing = entry;
                }
            })
            .or_insert(entry);
    }

    pub fn stats(&self) -> TtStats {
        TtStats {
            entries: self.entries.len(),
            probes: self.probes,
            hits: self.hits,
        }
    }
}

/// Table usage counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtStats {
    pub entries: usize,
    pub probes: u64,
    pub hits: u64,
}
