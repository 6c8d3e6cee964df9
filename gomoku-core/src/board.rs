//! Board geometry: coordinates, axis directions and scan lines

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::GomokuError;

/// Board side length (cells per row and column)
pub const BOARD_SIZE: usize = 15;

/// Number of cells a game can fill before it is drawn
pub const BOARD_CAPACITY: usize = BOARD_SIZE * BOARD_SIZE;

/// Index of the center row/column
pub const CENTER: usize = BOARD_SIZE / 2;

/// Stones in a row needed to win
pub const WIN_LENGTH: usize = 5;

/// Grid coordinates (row, column), both zero-based
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Check if this position is on the board
    pub fn is_valid(&self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }

    /// Step by (dr, dc); None when the result leaves the board
    pub fn offset(&self, dr: isize, dc: isize) -> Option<Pos> {
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        let pos = Pos::new(row, col);
        pos.is_valid().then_some(pos)
    }

    /// Bit index into a row-major occupancy mask
    #[inline]
    pub fn index(&self) -> usize {
        self.row * BOARD_SIZE + self.col
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

/// Parses `row,col` (spaces allowed around either number)
impl FromStr for Pos {
    type Err = GomokuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GomokuError::InvalidPosition(s.to_string());
        let (row, col) = s.split_once(',').ok_or_else(invalid)?;
        let row: usize = row.trim().parse().map_err(|_| invalid())?;
        let col: usize = col.trim().parse().map_err(|_| invalid())?;
        let pos = Pos::new(row, col);
        if pos.is_valid() {
            Ok(pos)
        } else {
            Err(invalid())
        }
    }
}

/// One representative direction per axis family (dr, dc):
/// horizontal, vertical, main diagonal, anti-diagonal
pub const AXES: [(isize, isize); 4] = [
    (0, 1),  // horizontal
    (1, 0),  // vertical
    (1, 1),  // diagonal \
    (1, -1), // diagonal /
];

/// Every line the evaluator scans, each ordered left to right (top to bottom
/// for columns): all rows, all columns, and the diagonals of both
/// orientations that are at least `WIN_LENGTH` long.
pub fn scan_lines() -> &'static [Vec<Pos>] {
    static LINES: OnceLock<Vec<Vec<Pos>>> = OnceLock::new();
    LINES.get_or_init(build_scan_lines)
}

fn build_scan_lines() -> Vec<Vec<Pos>> {
    let n = BOARD_SIZE as isize;
    let mut lines = Vec::new();

    for i in 0..BOARD_SIZE {
        lines.push((0..BOARD_SIZE).map(|c| Pos::new(i, c)).collect());
        lines.push((0..BOARD_SIZE).map(|r| Pos::new(r, i)).collect());
    }

    // Diagonal offset k: k >= 0 starts on the top row, k < 0 on the left edge
    let reach = n - WIN_LENGTH as isize;
    for k in -reach..=reach {
        let len = (n - k.abs()) as usize;
        let (r0, c0) = if k >= 0 { (0, k as usize) } else { ((-k) as usize, 0) };

        lines.push((0..len).map(|i| Pos::new(r0 + i, c0 + i)).collect());
        // Mirror image across the vertical axis
        lines.push(
            (0..len)
                .map(|i| Pos::new(r0 + i, BOARD_SIZE - 1 - (c0 + i)))
                .collect(),
        );
    }

    lines
}
