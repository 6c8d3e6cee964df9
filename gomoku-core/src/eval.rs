//! Position evaluation by line patterns

use serde::{Deserialize, Serialize};

use crate::board::{scan_lines, BOARD_SIZE, WIN_LENGTH};
use crate::game::{BoardState, Grid, Player};

/// Weights for run scoring, indexed by run length - 1 (lengths 1..=4)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Heuristics {
    /// Base value of a run with both ends open
    pub run_base: [f64; 4],
    /// Factor when exactly one end is open
    pub one_open: [f64; 4],
    /// Factor for the color that is not the evaluating side
    pub not_to_move: [f64; 4],
    /// Factor for runs bridged by a single gap
    pub broken: [f64; 4],
    /// Value of a run of five or more
    pub five: i64,
    /// Value of a five or more that needs its gap filled
    pub broken_five: i64,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            run_base: [2.0, 5.0, 1000.0, 10000.0],
            one_open: [0.5, 0.6, 0.01, 0.25],
            not_to_move: [1.0, 1.0, 0.2, 0.15],
            broken: [1.0, 1.2, 0.9, 0.4],
            five: FIVE_VALUE,
            broken_five: 8000,
        }
    }
}

/// Value of a completed five (default weights)
pub const FIVE_VALUE: i64 = 100_000;

/// Net advantage of `perspective`: its own runs count positive, the
/// opponent's negative.
pub fn evaluate(state: &BoardState, perspective: Player, heuristics: &Heuristics) -> i64 {
    let grid = state.grid();
    line_contribution(grid, Player::Black, perspective, heuristics)
        + line_contribution(grid, Player::White, perspective, heuristics)
}

/// Sum of run values for `color` over every scan line, negated when `color`
/// is not `perspective`.
pub fn line_contribution(
    grid: &Grid,
    color: Player,
    perspective: Player,
    heuristics: &Heuristics,
) -> i64 {
    let to_move = color == perspective;
    let mut cells = [None; BOARD_SIZE];

    let total: i64 = scan_lines()
        .iter()
        .map(|line| {
            for (cell, pos) in cells.iter_mut().zip(line) {
                *cell = grid[pos.row][pos.col];
            }
            evaluate_line(&cells[..line.len()], color, to_move, heuristics)
        })
        .sum();

    if to_move {
        total
    } else {
        -total
    }
}

/// Score the runs of `color` along one line, left to right.
///
/// `blocked` counts closed ends of the current run (board edge or opposing
/// stone). A single empty cell followed by `color` is absorbed into the run
/// and marks it broken. The broken flag is only cleared when a run ends on an
/// empty cell, and runs ending on an opposing stone or the line end are
/// scored as unbroken.
pub fn evaluate_line(
    line: &[Option<Player>],
    color: Player,
    to_move: bool,
    heuristics: &Heuristics,
) -> i64 {
    let mut total = 0;
    let mut run = 0usize;
    let mut blocked = 2u8;
    let mut broken = false;

    for (i, &cell) in line.iter().enumerate() {
        match cell {
            Some(stone) if stone == color => run += 1,
            None if run > 0 => {
                if !broken && line.get(i + 1) == Some(&Some(color)) {
                    broken = true;
                } else {
                    total += run_value(run, blocked - 1, to_move, broken, heuristics);
                    run = 0;
                    blocked = 1;
                    broken = false;
                }
            }
            None => blocked = 1,
            Some(_) if run > 0 => {
                total += run_value(run, blocked, to_move, false, heuristics);
                run = 0;
                blocked = 2;
            }
            Some(_) => blocked = 2,
        }
    }

    if run > 0 {
        total += run_value(run, blocked, to_move, false, heuristics);
    }

    total
}

/// Value of one run; fractional products truncate toward zero
fn run_value(run: usize, blocked: u8, to_move: bool, broken: bool, h: &Heuristics) -> i64 {
    if blocked == 2 && run < WIN_LENGTH {
        return 0;
    }

    if run >= WIN_LENGTH {
        return if broken { h.broken_five } else { h.five };
    }

    let i = run - 1;
    let mut value = h.run_base[i];
    if blocked == 1 {
        value *= h.one_open[i];
    }
    if !to_move {
        value *= h.not_to_move[i];
    }
    if broken {
        value *= h.broken[i];
    }
    value as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(s: &str) -> Vec<Option<Player>> {
        s.chars()
            .map(|c| match c {
                'X' => Some(Player::Black),
                'O' => Some(Player::White),
                _ => None,
            })
            .collect()
    }

    fn black_line(s: &str, to_move: bool) -> i64 {
        evaluate_line(&line(s), Player::Black, to_move, &Heuristics::default())
    }

    fn board(moves: &[(usize, usize)]) -> BoardState {
        let mut state = BoardState::new();
        for &(r, c) in moves {
            assert!(state.place(r, c));
        }
        state
    }

    #[test]
    fn test_run_shapes() {
        assert_eq!(black_line("..XXX..", true), 1000);
        assert_eq!(black_line("..XXX..", false), 200);
        assert_eq!(black_line("OXXX..", true), 10);
        assert_eq!(black_line("OXXX..", false), 2);
        assert_eq!(black_line(".XXXX.", true), 10000);
        assert_eq!(black_line(".XXXX.", false), 1500);
        assert_eq!(black_line("OXXXX.", true), 2500);
        assert_eq!(black_line("OXXXX.", false), 375);
        // Line end counts as blocked
        assert_eq!(black_line("XXXX.", true), 2500);
    }

    #[test]
    fn test_dead_runs_score_zero() {
        assert_eq!(black_line("OXX.XO", true), 0);
        assert_eq!(black_line("XX.XXO", true), 0);
        assert_eq!(black_line("X.XXX", true), 0);
    }

    #[test]
    fn test_fives() {
        assert_eq!(black_line("XXXXX", true), 100_000);
        assert_eq!(black_line("OXXXXXO", false), 100_000);
    }

    #[test]
    fn test_broken_runs() {
        assert_eq!(black_line(".XX.X..", true), 900);
        assert_eq!(black_line(".XX.X..", false), 180);
        assert_eq!(black_line("..X.XXX.", true), 4000);
        assert_eq!(black_line("OXX.XX.", true), 1000);
        // Only one gap per run
        assert_eq!(black_line("X.X.X", true), 4);
        assert_eq!(black_line(".XX.XX.XX.", true), 4005);
    }

    #[test]
    fn test_stale_broken_flag() {
        // The broken run ends on O, so the flag carries into the three
        assert_eq!(black_line("X.XO.XXX.", true), 900);
        assert_eq!(black_line("X.XO.XXX.", false), 180);
        // ...and stops the next run from bridging its gap
        assert_eq!(black_line("X.XO.XX.X.", true), 8);
    }

    #[test]
    fn test_empty_board_scores_zero() {
        let state = BoardState::new();
        let h = Heuristics::default();
        assert_eq!(evaluate(&state, Player::Black, &h), 0);
        assert_eq!(evaluate(&state, Player::White, &h), 0);
    }

    #[test]
    fn test_single_stone() {
        let state = board(&[(7, 7)]);
        let h = Heuristics::default();
        // Four open singles through the stone
        assert_eq!(evaluate(&state, Player::Black, &h), 8);
        assert_eq!(evaluate(&state, Player::White, &h), -8);
    }

    #[test]
    fn test_perspective_symmetry_short_runs() {
        let h = Heuristics::default();
        for moves in [
            vec![(7, 6), (0, 0), (7, 7)],
            vec![(3, 3), (3, 4), (4, 4), (10, 12), (0, 14)],
            vec![(14, 14), (0, 0), (13, 13), (1, 1), (6, 9)],
        ] {
            let state = board(&moves);
            let black = evaluate(&state, Player::Black, &h);
            let white = evaluate(&state, Player::White, &h);
            assert_eq!(black, -white, "asymmetric for {:?}", moves);
        }
        assert_eq!(evaluate(&board(&[(7, 6), (0, 0), (7, 7)]), Player::Black, &h), 14);
    }

    #[test]
    fn test_long_runs_discounted_for_waiting_side() {
        let state = board(&[(7, 6), (0, 0), (7, 7), (0, 14), (7, 8)]);
        let h = Heuristics::default();
        assert_eq!(evaluate(&state, Player::Black, &h), 1012);
        assert_eq!(evaluate(&state, Player::White, &h), -212);
    }

    #[test]
    fn test_open_four_position() {
        let state = board(&[
            (5, 5), (12, 0),
            (5, 6), (12, 2),
            (5, 7), (12, 4),
            (5, 8), (12, 6),
        ]);
        let h = Heuristics::default();
        assert_eq!(evaluate(&state, Player::Black, &h), 9994);
        assert_eq!(evaluate(&state, Player::White, &h), -1494);
    }
}
