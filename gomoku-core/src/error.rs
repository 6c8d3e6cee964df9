//! Error types

use thiserror::Error;

/// Errors from parsing positions and loading configuration.
///
/// Illegal moves are not errors: `BoardState::place` reports them with a
/// `false` return.
#[derive(Error, Debug)]
pub enum GomokuError {
    /// Malformed `row,col` coordinate or one outside the board
    #[error("Invalid position: {0:?}")]
    InvalidPosition(String),

    /// Board diagram that cannot describe an in-progress game
    #[error("Invalid diagram: {reason}")]
    InvalidDiagram { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GomokuError {
    pub(crate) fn diagram(reason: impl Into<String>) -> Self {
        GomokuError::InvalidDiagram {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GomokuError>;
