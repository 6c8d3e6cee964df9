//! Tree search: minimax, alpha-beta and iterative deepening

use std::time::{Duration, Instant};

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Pos, CENTER};
use crate::config::SearchConfig;
use crate::eval::evaluate;
use crate::game::{BoardState, Player};
use crate::ordering::{order_moves, rank_in_place, ScoredMove};
use crate::tt::{Bound, TranspositionTable, TtStats};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Worst possible score; also the score of the "no move" result
pub const SCORE_MIN: i64 = i64::MIN;

/// Best possible score
pub const SCORE_MAX: i64 = i64::MAX;

/// Nominal score of the opening move on an empty board
pub const OPENING_SCORE: i64 = 1;

/// Nominal score of the reply to a single stone
pub const OPENING_REPLY_SCORE: i64 = 2;

// ============================================================================
// RESULTS AND CONTEXT
// ============================================================================

/// Outcome of a top-level search
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// None when there was no legal move
    pub best_move: Option<Pos>,
    pub score: i64,
    /// Deepest fully completed iteration (the fixed depth when not iterating)
    pub depth: u32,
    /// Nodes visited
    pub nodes: u64,
    /// The time budget ran out before `max_depth` completed
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl SearchResult {
    /// Sentinel for an empty search space
    pub fn no_move() -> Self {
        Self::found(None, SCORE_MIN)
    }

    fn found(best_move: Option<Pos>, score: i64) -> Self {
        Self {
            best_move,
            score,
            depth: 0,
            nodes: 0,
            timed_out: false,
            elapsed: Duration::ZERO,
        }
    }
}

/// State owned by a single top-level search: transposition table and node
/// counter. Never shared between searches.
pub struct SearchContext<'a> {
    config: &'a SearchConfig,
    table: TranspositionTable,
    nodes: u64,
}

impl<'a> SearchContext<'a> {
    pub fn new(config: &'a SearchConfig) -> Self {
        Self {
            config,
            table: TranspositionTable::new(),
            nodes: 0,
        }
    }

    /// Nodes visited so far
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn table_stats(&self) -> TtStats {
        self.table.stats()
    }
}

// ============================================================================
// SEARCH ENGINE
// ============================================================================

/// Engine player: configuration plus the RNG used for the opening move
pub struct SearchEngine {
    config: SearchConfig,
    rng: ChaCha8Rng,
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self { config, rng }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Best move for the side to move, using the configured depth and
    /// algorithm
    pub fn search(&mut self, state: &mut BoardState) -> SearchResult {
        let ai_color = state.current_player();
        let (depth, pruning) = (self.config.max_depth, self.config.use_pruning);
        self.best_move(state, depth, ai_color, pruning)
    }

    /// Best move for `ai_color`.
    ///
    /// `state` is mutated during the search and handed back unchanged. With
    /// a configured time limit the search deepens iteratively up to
    /// `max_depth`; otherwise it searches `max_depth` directly.
    pub fn best_move(
        &mut self,
        state: &mut BoardState,
        max_depth: u32,
        ai_color: Player,
        use_pruning: bool,
    ) -> SearchResult {
        let start = Instant::now();

        if let Some(mut result) = self.opening_move(state) {
            result.elapsed = start.elapsed();
            return result;
        }

        let stones = state.stone_count();
        let mut ctx = SearchContext::new(&self.config);
        let mut result = match self.config.time_limit_ms {
            Some(ms) => iterative_deepening(
                state,
                max_depth,
                ai_color,
                use_pruning,
                Duration::from_millis(ms),
                &mut ctx,
            ),
            None => fixed_depth(state, max_depth, ai_color, use_pruning, &mut ctx),
        };
        debug_assert_eq!(state.stone_count(), stones, "search left stones on the board");

        result.elapsed = start.elapsed();
        if let Some(pos) = result.best_move {
            tracing::debug!(
                "{:?} plays {} (score={}, depth={}, nodes={}, {:?})",
                ai_color,
                pos,
                result.score,
                result.depth,
                result.nodes,
                result.elapsed
            );
        }
        result
    }

    /// Book replies for the first two stones, skipping search
    fn opening_move(&mut self, state: &BoardState) -> Option<SearchResult> {
        if state.is_over() {
            return None;
        }

        match state.stone_count() {
            0 => {
                let row = CENTER - 1 + self.rng.gen_range(0..3);
                let col = CENTER - 1 + self.rng.gen_range(0..3);
                Some(SearchResult::found(Some(Pos::new(row, col)), OPENING_SCORE))
            }
            1 => {
                let stone = state.last_move()?;
                let dr = if stone.row <= CENTER { 1 } else { -1 };
                let dc = if stone.col <= CENTER { 1 } else { -1 };
                let reply = stone.offset(dr, dc)?;
                Some(SearchResult::found(Some(reply), OPENING_REPLY_SCORE))
            }
            _ => None,
        }
    }
}

// ============================================================================
// ROOT SEARCH
// ============================================================================

/// Search the top root candidates once, `depth` plies deep
pub fn fixed_depth(
    state: &mut BoardState,
    depth: u32,
    ai_color: Player,
    use_pruning: bool,
    ctx: &mut SearchContext,
) -> SearchResult {
    let candidates = root_candidates(state, ai_color, ctx);
    let Some(first) = candidates.first().copied() else {
        return SearchResult::no_move();
    };

    let mut best: Option<(Pos, i64)> = None;
    for candidate in &candidates {
        let value = search_root_move(state, candidate.pos, depth.saturating_sub(1), ai_color, use_pruning, ctx);
        if best.map_or(true, |(_, v)| value > v) {
            best = Some((candidate.pos, value));
        }
    }

    let (pos, score) = best.unwrap_or((first.pos, first.score));
    tracing::info!("depth {}: {} nodes, best {} ({})", depth, ctx.nodes, pos, score);
    SearchResult {
        depth,
        nodes: ctx.nodes,
        ..SearchResult::found(Some(pos), score)
    }
}

/// Deepen from 1 to `max_depth` plies until the time budget runs out.
///
/// The clock is checked before each root candidate. On overrun the better
/// of the unfinished iteration's best and the last completed iteration's
/// best is returned.
pub fn iterative_deepening(
    state: &mut BoardState,
    max_depth: u32,
    ai_color: Player,
    use_pruning: bool,
    budget: Duration,
    ctx: &mut SearchContext,
) -> SearchResult {
    let start = Instant::now();
    let mut candidates = root_candidates(state, ai_color, ctx);
    let Some(first) = candidates.first().copied() else {
        return SearchResult::no_move();
    };

    // One-ply ranking stands in until the first iteration completes
    let mut best = (first.pos, first.score);
    let mut completed = 0;

    for depth in 1..=max_depth {
        if depth > 1 {
            candidates = root_candidates(state, ai_color, ctx);
        }

        let depth_start_nodes = ctx.nodes;
        let mut partial: Option<(Pos, i64)> = None;

        for candidate in &candidates {
            if start.elapsed() >= budget {
                tracing::debug!(
                    "time limit reached at depth {} after {} nodes",
                    depth,
                    ctx.nodes
                );
                let (pos, score) = choose_on_timeout(partial, best);
                return SearchResult {
                    depth: completed,
                    nodes: ctx.nodes,
                    timed_out: true,
                    ..SearchResult::found(Some(pos), score)
                };
            }

            let value = search_root_move(state, candidate.pos, depth - 1, ai_color, use_pruning, ctx);
            if partial.map_or(true, |(_, v)| value > v) {
                partial = Some((candidate.pos, value));
            }
        }

        if let Some(p) = partial {
            best = p;
        }
        completed = depth;
        tracing::info!(
            "depth {}: {} nodes, best {} ({})",
            depth,
            ctx.nodes - depth_start_nodes,
            best.0,
            best.1
        );
    }

    SearchResult {
        depth: completed,
        nodes: ctx.nodes,
        ..SearchResult::found(Some(best.0), best.1)
    }
}

/// Result when time runs out mid-iteration: the unfinished iteration's best
/// only if it strictly beats the last completed iteration
fn choose_on_timeout(partial: Option<(Pos, i64)>, completed: (Pos, i64)) -> (Pos, i64) {
    match partial {
        Some(p) if p.1 > completed.1 => p,
        _ => completed,
    }
}

/// Top-ranked root moves for `ai_color`
fn root_candidates(state: &mut BoardState, ai_color: Player, ctx: &SearchContext) -> Vec<ScoredMove> {
    let mut ranked = rank_in_place(state, ai_color, &ctx.config.heuristics);
    ranked.truncate(ctx.config.root_candidates);
    ranked
}

/// Value of playing `pos` at the root, searched `depth` more plies
fn search_root_move(
    state: &mut BoardState,
    pos: Pos,
    depth: u32,
    ai_color: Player,
    use_pruning: bool,
    ctx: &mut SearchContext,
) -> i64 {
    make(state, pos);
    let value = if use_pruning {
        alpha_beta(state, SCORE_MIN, SCORE_MAX, depth, ai_color, ctx)
    } else {
        minimax(state, depth, ai_color, ctx)
    };
    unmake(state);
    value
}

// ============================================================================
// MINIMAX / ALPHA-BETA
// ============================================================================

/// Plain minimax over every legal move.
///
/// Maximizes when `ai_color` is to move. Leaves are scored for `ai_color`.
pub fn minimax(state: &mut BoardState, depth: u32, ai_color: Player, ctx: &mut SearchContext) -> i64 {
    ctx.nodes += 1;

    if depth == 0 || state.is_over() {
        return evaluate(state, ai_color, &ctx.config.heuristics);
    }

    let maximizing = state.current_player() == ai_color;
    let mut value = if maximizing { SCORE_MIN } else { SCORE_MAX };

    for pos in state.legal_moves() {
        make(state, pos);
        let child = minimax(state, depth - 1, ai_color, ctx);
        unmake(state);

        value = if maximizing {
            value.max(child)
        } else {
            value.min(child)
        };
    }

    value
}

/// Minimax with alpha-beta cutoffs, one-ply move ordering and the
/// transposition table.
///
/// Table entries carry a bound, so values cut off by the window are never
/// reused as exact.
pub fn alpha_beta(
    state: &mut BoardState,
    mut alpha: i64,
    mut beta: i64,
    depth: u32,
    ai_color: Player,
    ctx: &mut SearchContext,
) -> i64 {
    ctx.nodes += 1;

    if depth == 0 || state.is_over() {
        return evaluate(state, ai_color, &ctx.config.heuristics);
    }

    let key = state.position_key();
    if let Some(entry) = ctx.table.probe(&key, depth) {
        match entry.bound {
            Bound::Exact => return entry.value,
            Bound::Lower => alpha = alpha.max(entry.value),
            Bound::Upper => beta = beta.min(entry.value),
        }
        if alpha >= beta {
            return entry.value;
        }
    }

    let (window_alpha, window_beta) = (alpha, beta);
    let maximizing = state.current_player() == ai_color;

    let mut moves = state.legal_moves();
    if moves.len() > ctx.config.ordering_threshold {
        moves = order_moves(state, &moves, ai_color, maximizing, &ctx.config.heuristics);
    }

    let mut value = if maximizing { SCORE_MIN } else { SCORE_MAX };
    for pos in moves {
        make(state, pos);
        let child = alpha_beta(state, alpha, beta, depth - 1, ai_color, ctx);
        unmake(state);

        if maximizing {
            value = value.max(child);
            alpha = alpha.max(value);
        } else {
            value = value.min(child);
            beta = beta.min(value);
        }
        if alpha >= beta {
            break;
        }
    }

    let bound = if value <= window_alpha {
        Bound::Upper
    } else if value >= window_beta {
        Bound::Lower
    } else {
        Bound::Exact
    };
    ctx.table.store(key, depth, value, bound);

    value
}

#[inline]
fn make(state: &mut BoardState, pos: Pos) {
    let placed = state.play(pos);
    debug_assert!(placed, "search generated an illegal move: {}", pos);
}

#[inline]
fn unmake(state: &mut BoardState) {
    let undone = state.undo();
    debug_assert!(undone, "search undo with empty history");
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BOARD_SIZE;
    use crate::eval::{Heuristics, FIVE_VALUE};
    use crate::game::GameStatus;

    fn board(moves: &[(usize, usize)]) -> BoardState {
        let mut state = BoardState::new();
        for &(r, c) in moves {
            assert!(state.place(r, c), "move {},{} rejected", r, c);
        }
        state
    }

    /// Stripe pattern with no five anywhere, minus the given cells
    fn nearly_full(holes: &[(usize, usize)]) -> BoardState {
        let mut text = String::new();
        for r in 0..BOARD_SIZE {
            for c in 0..BOARD_SIZE {
                let ch = if holes.contains(&(r, c)) {
                    '.'
                } else if ((2 * r + c) / 2) % 2 == 0 {
                    'X'
                } else {
                    'O'
                };
                text.push(ch);
            }
            text.push('\n');
        }
        BoardState::from_diagram(&text).unwrap()
    }

    /// Four black and four white cells removed; White to move
    fn small_endgame() -> BoardState {
        nearly_full(&[(0, 0), (3, 7), (9, 2), (14, 12), (0, 2), (6, 6), (11, 9), (13, 13)])
    }

    fn open_four() -> BoardState {
        board(&[
            (5, 5), (12, 0),
            (5, 6), (12, 2),
            (5, 7), (12, 4),
            (5, 8), (12, 6),
        ])
    }

    #[test]
    fn test_small_endgame_fixture() {
        let state = small_endgame();
        assert_eq!(state.legal_moves().len(), 8);
        assert_eq!(state.current_player(), Player::White);
    }

    #[test]
    fn test_first_move_near_center() {
        for seed in 0..20 {
            let mut engine = SearchEngine::new(SearchConfig::default().with_seed(seed));
            let mut state = BoardState::new();
            let result = engine.search(&mut state);
            let pos = result.best_move.unwrap();
            assert!((CENTER - 1..=CENTER + 1).contains(&pos.row));
            assert!((CENTER - 1..=CENTER + 1).contains(&pos.col));
            assert_eq!(result.score, OPENING_SCORE);
            assert_eq!(state, BoardState::new());
        }
    }

    #[test]
    fn test_second_move_toward_center() {
        let mut engine = SearchEngine::new(SearchConfig::default().with_seed(1));
        let cases = [
            ((7, 7), (8, 8)),
            ((7, 8), (8, 7)),
            ((10, 3), (9, 4)),
            ((0, 14), (1, 13)),
            ((14, 14), (13, 13)),
        ];
        for (stone, reply) in cases {
            let mut state = board(&[stone]);
            let result = engine.best_move(&mut state, 2, Player::White, true);
            assert_eq!(result.best_move, Some(Pos::new(reply.0, reply.1)));
            assert_eq!(result.score, OPENING_REPLY_SCORE);
        }
    }

    #[test]
    fn test_no_move_when_game_over() {
        let mut state = board(&[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2), (1, 2), (0, 3), (1, 3), (0, 4)]);
        assert_eq!(state.status(), GameStatus::Won(Player::Black));

        for pruning in [true, false] {
            let mut engine = SearchEngine::new(SearchConfig::default().with_pruning(pruning));
            let result = engine.search(&mut state);
            assert_eq!(result.best_move, None);
            assert_eq!(result.score, SCORE_MIN);
        }
    }

    #[test]
    fn test_takes_immediate_win() {
        let mut state = open_four();
        let mut engine = SearchEngine::new(SearchConfig::alpha_beta(2).with_time_limit_ms(None));
        let result = engine.search(&mut state);
        assert_eq!(result.best_move, Some(Pos::new(5, 4)));
        assert_eq!(result.score, FIVE_VALUE);
        assert_eq!(state, open_four());
    }

    #[test]
    fn test_blocks_four() {
        let mut state = board(&[(5, 5), (5, 4), (5, 6), (12, 0), (5, 7), (12, 2), (5, 8)]);
        assert_eq!(state.current_player(), Player::White);
        let before = state.clone();

        let mut engine = SearchEngine::new(SearchConfig::alpha_beta(2));
        let result = engine.search(&mut state);
        assert_eq!(result.best_move, Some(Pos::new(5, 9)));
        assert!(!result.timed_out);
        assert_eq!(result.depth, 2);
        assert_eq!(state, before);
    }

    #[test]
    fn test_minimax_matches_alpha_beta() {
        let config = SearchConfig::default();
        for depth in 1..=4 {
            for ai_color in [Player::Black, Player::White] {
                let mut state = small_endgame();
                let before = state.clone();

                let mut ctx = SearchContext::new(&config);
                let plain = minimax(&mut state, depth, ai_color, &mut ctx);
                let plain_nodes = ctx.nodes();

                let mut ctx = SearchContext::new(&config);
                let pruned = alpha_beta(&mut state, SCORE_MIN, SCORE_MAX, depth, ai_color, &mut ctx);

                assert_eq!(plain, pruned, "depth {} {:?}", depth, ai_color);
                assert!(ctx.nodes() <= plain_nodes);
                assert_eq!(state, before);
            }
        }
    }

    #[test]
    fn test_root_search_matches_without_pruning() {
        let mut engine_ab = SearchEngine::new(SearchConfig::alpha_beta(3).with_time_limit_ms(None));
        let mut engine_mm = SearchEngine::new(SearchConfig::minimax(3).with_time_limit_ms(None));
        let mut state = small_endgame();

        let ab = engine_ab.search(&mut state);
        let mm = engine_mm.search(&mut state);
        assert_eq!(ab.score, mm.score);
        assert!(ab.nodes < mm.nodes);
        assert_eq!(state, small_endgame());
    }

    #[test]
    fn test_iterative_matches_fixed_depth() {
        for max_depth in 1..=4 {
            let mut state = small_endgame();
            let mut fixed = SearchEngine::new(SearchConfig::alpha_beta(max_depth).with_time_limit_ms(None));
            let mut deepening =
                SearchEngine::new(SearchConfig::alpha_beta(max_depth).with_time_limit_ms(Some(600_000)));

            let a = fixed.search(&mut state);
            let b = deepening.search(&mut state);
            assert_eq!(a.best_move, b.best_move, "depth {}", max_depth);
            assert_eq!(a.score, b.score);
            assert_eq!(b.depth, max_depth);
            assert!(!b.timed_out);
        }
    }

    #[test]
    fn test_iterative_matches_fixed_open_board() {
        let mut state = board(&[(7, 7), (7, 8), (8, 8), (6, 6)]);
        let mut fixed = SearchEngine::new(SearchConfig::alpha_beta(2).with_time_limit_ms(None));
        let mut deepening = SearchEngine::new(SearchConfig::alpha_beta(2).with_time_limit_ms(Some(600_000)));

        let a = fixed.search(&mut state);
        let b = deepening.search(&mut state);
        assert_eq!(a.best_move, b.best_move);
        assert_eq!(a.score, b.score);
    }

    #[test]
    fn test_zero_budget_returns_ranked_move() {
        let mut state = open_four();
        let mut engine = SearchEngine::new(SearchConfig::alpha_beta(4).with_time_limit_ms(Some(0)));
        let result = engine.search(&mut state);
        assert!(result.timed_out);
        assert_eq!(result.depth, 0);
        assert_eq!(result.best_move, Some(Pos::new(5, 4)));
        assert_eq!(result.score, FIVE_VALUE);
        assert_eq!(state, open_four());
    }

    #[test]
    fn test_timeout_prefers_strictly_better_partial() {
        let completed = (Pos::new(7, 7), 120);
        let better = (Pos::new(3, 4), 121);
        assert_eq!(choose_on_timeout(Some(better), completed), better);
    }

    #[test]
    fn test_timeout_keeps_completed_depth() {
        let completed = (Pos::new(7, 7), 120);
        assert_eq!(choose_on_timeout(Some((Pos::new(3, 4), 80)), completed), completed);
        // Ties keep the completed iteration
        assert_eq!(choose_on_timeout(Some((Pos::new(3, 4), 120)), completed), completed);
        assert_eq!(choose_on_timeout(None, completed), completed);
    }

    #[test]
    fn test_custom_heuristics_drive_search() {
        let h = Heuristics {
            five: 7,
            ..Heuristics::default()
        };
        let config = SearchConfig::alpha_beta(1)
            .with_time_limit_ms(None)
            .with_heuristics(h.clone());
        let mut engine = SearchEngine::new(config);
        let mut state = open_four();

        let result = engine.search(&mut state);
        let pos = result.best_move.unwrap();
        assert!(result.score < FIVE_VALUE);

        assert!(state.play(pos));
        assert_eq!(result.score, evaluate(&state, Player::Black, &h));
    }

    #[test]
    fn test_root_candidates_limit() {
        let config = SearchConfig::alpha_beta(1).with_root_candidates(3);
        let mut ctx = SearchContext::new(&config);
        let mut state = open_four();
        let result = fixed_depth(&mut state, 1, Player::Black, true, &mut ctx);
        // One node per searched root move
        assert_eq!(result.nodes, 3);
        assert_eq!(result.best_move, Some(Pos::new(5, 4)));
    }

    #[test]
    fn test_transposition_table_used() {
        let config = SearchConfig::default();
        let mut ctx = SearchContext::new(&config);
        let mut state = small_endgame();
        alpha_beta(&mut state, SCORE_MIN, SCORE_MAX, 4, Player::Black, &mut ctx);

        let stats = ctx.table_stats();
        assert!(stats.entries > 0);
        // Transposed move orders reach the same positions
        assert!(stats.hits > 0);
    }

    #[test]
    fn test_engines_do_not_share_state() {
        let mut a = SearchEngine::new(SearchConfig::alpha_beta(2).with_time_limit_ms(None));
        let mut b = SearchEngine::new(SearchConfig::minimax(2).with_time_limit_ms(None));
        let mut state = small_endgame();

        let first = a.search(&mut state);
        let _ = b.search(&mut state);
        let again = a.search(&mut state);
        assert_eq!(first.best_move, again.best_move);
        assert_eq!(first.score, again.score);
        assert_eq!(first.nodes, again.nodes);
    }
}
