//! Search configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::eval::Heuristics;

/// Engine settings. Missing JSON fields take their default values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Plies searched below the root (root move included)
    pub max_depth: u32,
    /// Alpha-beta with move ordering and transposition table; plain
    /// minimax otherwise
    pub use_pruning: bool,
    /// Root moves kept after one-ply ranking
    pub root_candidates: usize,
    /// Internal nodes with more legal moves than this are ordered
    pub ordering_threshold: usize,
    /// Wall-clock budget enabling iterative deepening; None searches
    /// `max_depth` directly
    pub time_limit_ms: Option<u64>,
    /// Seed for the opening move (None = entropy)
    pub seed: Option<u64>,
    pub heuristics: Heuristics,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            use_pruning: true,
            root_candidates: 10,
            ordering_threshold: 5,
            time_limit_ms: Some(5000),
            seed: None,
            heuristics: Heuristics::default(),
        }
    }
}

impl SearchConfig {
    /// Alpha-beta at the given depth
    pub fn alpha_beta(max_depth: u32) -> Self {
        Self {
            max_depth,
            use_pruning: true,
            ..Default::default()
        }
    }

    /// Plain minimax at the given depth
    pub fn minimax(max_depth: u32) -> Self {
        Self {
            max_depth,
            use_pruning: false,
            ..Default::default()
        }
    }

    pub fn with_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_pruning(mut self, use_pruning: bool) -> Self {
        self.use_pruning = use_pruning;
        self
    }

    pub fn with_time_limit_ms(mut self, time_limit_ms: Option<u64>) -> Self {
        self.time_limit_ms = time_limit_ms;
        self
    }

    pub fn with_root_candidates(mut self, root_candidates: usize) -> Self {
        self.root_candidates = root_candidates;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_heuristics(mut self, heuristics: Heuristics) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// Parse from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
