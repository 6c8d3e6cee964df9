//! Move ordering by one-ply evaluation

use serde::{Deserialize, Serialize};

use crate::board::Pos;
use crate::eval::{evaluate, Heuristics};
use crate::game::{BoardState, Player};

/// A legal move with the evaluation of the position it leads to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredMove {
    pub pos: Pos,
    pub score: i64,
}

/// Every legal move, best first for `perspective`.
///
/// Works on a scratch copy; `state` is untouched. Ties keep row-major order.
pub fn rank_moves(state: &BoardState, perspective: Player, heuristics: &Heuristics) -> Vec<ScoredMove> {
    let mut scratch = state.clone();
    rank_in_place(&mut scratch, perspective, heuristics)
}

/// The `k` best moves for `perspective`
pub fn top_moves(
    state: &BoardState,
    k: usize,
    perspective: Player,
    heuristics: &Heuristics,
) -> Vec<ScoredMove> {
    let mut ranked = rank_moves(state, perspective, heuristics);
    ranked.truncate(k);
    ranked
}

/// `rank_moves` using place/undo on the given board
pub(crate) fn rank_in_place(
    state: &mut BoardState,
    perspective: Player,
    heuristics: &Heuristics,
) -> Vec<ScoredMove> {
    let moves = state.legal_moves();
    let mut scored = score_moves(state, &moves, perspective, heuristics);
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

/// Reorder `moves` by one-ply score: descending for the maximizing side,
/// ascending for the minimizing side.
pub(crate) fn order_moves(
    state: &mut BoardState,
    moves: &[Pos],
    perspective: Player,
    maximizing: bool,
    heuristics: &Heuristics,
) -> Vec<Pos> {
    let mut scored = score_moves(state, moves, perspective, heuristics);
    if maximizing {
        scored.sort_by(|a, b| b.score.cmp(&a.score));
    } else {
        scored.sort_by(|a, b| a.score.cmp(&b.score));
    }
    scored.into_iter().map(|m| m.pos).collect()
}

fn score_moves(
    state: &mut BoardState,
    moves: &[Pos],
    perspective: Player,
    heuristics: &Heuristics,
) -> Vec<ScoredMove> {
    moves
        .iter()
        .map(|&pos| {
            let placed = state.play(pos);
            debug_assert!(placed, "ordering a move that is not legal: {}", pos);
            let score = evaluate(state, perspective, heuristics);
            let undone = state.undo();
            debug_assert!(undone);
            ScoredMove { pos, score }
        })
        .collect()
}
