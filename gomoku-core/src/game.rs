//! Game state, move generation and win detection

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{Pos, AXES, BOARD_CAPACITY, BOARD_SIZE, WIN_LENGTH};
use crate::error::{GomokuError, Result};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Stone color. Black moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    Black = 0,
    White = 1,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    /// Diagram symbol
    pub fn symbol(self) -> char {
        match self {
            Player::Black => 'X',
            Player::White => 'O',
        }
    }

    fn from_symbol(c: char) -> Option<Option<Player>> {
        match c {
            'X' | 'x' => Some(Some(Player::Black)),
            'O' | 'o' => Some(Some(Player::White)),
            '.' | '_' => Some(None),
            _ => None,
        }
    }
}

/// Terminal status of a game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Won(Player),
    Drawn,
}

/// Cell contents; `None` is an empty cell
pub type Grid = [[Option<Player>; BOARD_SIZE]; BOARD_SIZE];

/// Exact key of a position: stone masks for both colors plus side to move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PositionKey {
    stones: [[u64; 4]; 2],
    to_move: Player,
}

// ============================================================================
// BOARD STATE
// ============================================================================

/// Mutable game state with undo history.
///
/// Search mutates it with `place`/`undo` pairs; `undo` restores the exact
/// prior state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardState {
    grid: Grid,
    current_player: Player,
    /// Every stone placed, in order; used only by `undo`
    history: Vec<(Pos, Player)>,
    last_move: Option<Pos>,
    status: GameStatus,
    /// Full winning run, end to end; empty unless `status` is `Won`
    winning_line: Vec<Pos>,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Empty board, Black to move
    pub fn new() -> Self {
        Self {
            grid: [[None; BOARD_SIZE]; BOARD_SIZE],
            current_player: Player::Black,
            history: Vec::with_capacity(BOARD_CAPACITY),
            last_move: None,
            status: GameStatus::InProgress,
            winning_line: Vec::new(),
        }
    }

    /// Parse a diagram of `BOARD_SIZE` rows: `X` black, `O` white, `.` empty.
    ///
    /// Whitespace and digits are ignored, so the `Display` output (with its
    /// row and column labels) parses back. Stones are replayed alternately,
    /// Black first, in row-major order; the diagram must describe a game that
    /// is still in progress.
    pub fn from_diagram(text: &str) -> Result<Self> {
        let rows: Vec<Vec<char>> = text
            .lines()
            .map(|line| {
                line.chars()
                    .filter(|c| !c.is_whitespace() && !c.is_ascii_digit())
                    .collect::<Vec<_>>()
            })
            .filter(|row| !row.is_empty())
            .collect();

        if rows.len() != BOARD_SIZE {
            return Err(GomokuError::diagram(format!(
                "expected {} rows, found {}",
                BOARD_SIZE,
                rows.len()
            )));
        }

        let mut black = Vec::new();
        let mut white = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            if row.len() != BOARD_SIZE {
                return Err(GomokuError::diagram(format!(
                    "row {} has {} cells, expected {}",
                    r,
                    row.len(),
                    BOARD_SIZE
                )));
            }
            for (c, &ch) in row.iter().enumerate() {
                match Player::from_symbol(ch) {
                    Some(Some(Player::Black)) => black.push(Pos::new(r, c)),
                    Some(Some(Player::White)) => white.push(Pos::new(r, c)),
                    Some(None) => {}
                    None => {
                        return Err(GomokuError::diagram(format!(
                            "unexpected character {:?} at {},{}",
                            ch, r, c
                        )))
                    }
                }
            }
        }

        if white.len() != black.len() && white.len() + 1 != black.len() {
            return Err(GomokuError::diagram(format!(
                "{} black and {} white stones cannot arise from alternating play",
                black.len(),
                white.len()
            )));
        }

        let mut state = Self::new();
        for (i, &b) in black.iter().enumerate() {
            let mut ok = state.play(b);
            if let Some(&w) = white.get(i) {
                ok = ok && state.play(w);
            }
            if !ok {
                return Err(GomokuError::diagram("position is already decided"));
            }
        }
        if state.is_over() {
            return Err(GomokuError::diagram("position is already decided"));
        }

        Ok(state)
    }

    /// Back to the empty board
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status != GameStatus::InProgress
    }

    pub fn winner(&self) -> Option<Player> {
        match self.status {
            GameStatus::Won(player) => Some(player),
            _ => None,
        }
    }

    /// Stones of the winning run, empty unless the game is won
    pub fn winning_line(&self) -> &[Pos] {
        &self.winning_line
    }

    pub fn last_move(&self) -> Option<Pos> {
        self.last_move
    }

    /// Read-only view of the cells
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Stone at `pos` (None for empty or off-board)
    pub fn cell(&self, pos: Pos) -> Option<Player> {
        if pos.is_valid() {
            self.grid[pos.row][pos.col]
        } else {
            None
        }
    }

    /// Placed stones in order
    pub fn history(&self) -> &[(Pos, Player)] {
        &self.history
    }

    pub fn stone_count(&self) -> usize {
        self.history.len()
    }

    /// Exact key for the transposition table
    pub fn position_key(&self) -> PositionKey {
        let mut stones = [[0u64; 4]; 2];
        for &(pos, player) in &self.history {
            let bit = pos.index();
            stones[player as usize][bit / 64] |= 1 << (bit % 64);
        }
        PositionKey {
            stones,
            to_move: self.current_player,
        }
    }

    // ========================================================================
    // MOVES
    // ========================================================================

    /// True if the current player may place a stone at (row, col)
    pub fn is_legal(&self, row: usize, col: usize) -> bool {
        !self.is_over() && row < BOARD_SIZE && col < BOARD_SIZE && self.grid[row][col].is_none()
    }

    /// All empty cells in row-major order; empty once the game is over
    pub fn legal_moves(&self) -> Vec<Pos> {
        if self.is_over() {
            return vec![];
        }

        let mut moves = Vec::with_capacity(BOARD_CAPACITY - self.history.len());
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                if self.grid[row][col].is_none() {
                    moves.push(Pos::new(row, col));
                }
            }
        }
        moves
    }

    /// Place a stone for the current player.
    ///
    /// Returns false (and changes nothing) when the move is illegal.
    pub fn place(&mut self, row: usize, col: usize) -> bool {
        if !self.is_legal(row, col) {
            return false;
        }

        let pos = Pos::new(row, col);
        let player = self.current_player;
        self.grid[row][col] = Some(player);
        self.history.push((pos, player));
        self.last_move = Some(pos);

        if let Some(line) = self.winning_run(pos, player) {
            self.status = GameStatus::Won(player);
            self.winning_line = line;
        } else if self.history.len() >= BOARD_CAPACITY {
            self.status = GameStatus::Drawn;
        } else {
            self.current_player = player.opponent();
        }

        true
    }

    /// `place` taking a `Pos`
    pub fn play(&mut self, pos: Pos) -> bool {
        self.place(pos.row, pos.col)
    }

    /// Take back the last stone.
    ///
    /// The game is always reopened, even when the undone stone was the
    /// winning one. Returns false if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some((pos, player)) = self.history.pop() else {
            return false;
        };

        self.grid[pos.row][pos.col] = None;
        self.current_player = player;
        self.status = GameStatus::InProgress;
        self.winning_line.clear();
        self.last_move = self.history.last().map(|&(p, _)| p);

        true
    }

    // ========================================================================
    // WIN DETECTION
    // ========================================================================

    /// Longest contiguous run through `pos` along each axis; returns the
    /// first run of at least `WIN_LENGTH` stones, ordered end to end.
    fn winning_run(&self, pos: Pos, player: Player) -> Option<Vec<Pos>> {
        for &(dr, dc) in &AXES {
            let mut start = pos;
            while let Some(prev) = start.offset(-dr, -dc) {
                if self.cell(prev) != Some(player) {
                    break;
                }
                start = prev;
            }

            let mut run = vec![start];
            let mut cur = start;
            while let Some(next) = cur.offset(dr, dc) {
                if self.cell(next) != Some(player) {
                    break;
                }
                run.push(next);
                cur = next;
            }

            if run.len() >= WIN_LENGTH {
                return Some(run);
            }
        }

        None
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        for col in 0..BOARD_SIZE {
            write!(f, "{:>3}", col)?;
        }
        writeln!(f)?;

        for (r, row) in self.grid.iter().enumerate() {
            write!(f, "{:>2}", r)?;
            for cell in row {
                let symbol = cell.map_or('.', Player::symbol);
                write!(f, "{:>3}", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
