//! Gomoku Core - Board, evaluation and search
//!
//! This crate provides the engine behind the `gomoku` CLI:
//! - Board geometry and scan lines on a 15x15 grid
//! - Game state with place/undo and win detection
//! - Pattern-based line evaluation
//! - Minimax and alpha-beta search with iterative deepening

pub mod ai;
pub mod board;
pub mod config;
pub mod error;
pub mod eval;
pub mod game;
pub mod ordering;
pub mod tt;

// Re-exports for convenient access
pub use ai::{SearchContext, SearchEngine, SearchResult, SCORE_MAX, SCORE_MIN};
pub use board::{Pos, BOARD_CAPACITY, BOARD_SIZE, CENTER, WIN_LENGTH};
pub use config::SearchConfig;
pub use error::{GomokuError, Result};
pub use eval::{evaluate, Heuristics, FIVE_VALUE};
pub use game::{BoardState, GameStatus, Player, PositionKey};
pub use ordering::{rank_moves, top_moves, ScoredMove};
