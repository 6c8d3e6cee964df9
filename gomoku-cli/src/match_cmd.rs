//! Match command - play games between two engine configurations
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_engines(), play_match(), report_results()
//! - Level 3: play_single_game(), compute_match_statistics()
//! - Level 4: formatting utilities

use std::time::Instant;

use anyhow::{ensure, Context, Result};
use clap::{Args, ValueEnum};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use gomoku_core::{BoardState, GameStatus, Player, Pos, SearchConfig, SearchEngine};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

/// Search algorithm of one side
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Algorithm {
    AlphaBeta,
    Minimax,
}

impl Algorithm {
    fn label(self) -> &'static str {
        match self {
            Algorithm::AlphaBeta => "alpha-beta",
            Algorithm::Minimax => "minimax",
        }
    }
}

#[derive(Args)]
pub struct MatchArgs {
    /// Algorithm of engine A (Black in odd-numbered games)
    #[arg(long, value_enum, default_value = "minimax")]
    pub engine_a: Algorithm,

    /// Algorithm of engine B (White in odd-numbered games)
    #[arg(long, value_enum, default_value = "alpha-beta")]
    pub engine_b: Algorithm,

    /// Number of games to play (will alternate colors)
    #[arg(long, default_value = "2")]
    pub games: usize,

    /// Search depth for both engines (overrides the config file)
    #[arg(long)]
    pub depth: Option<u32>,

    /// Per-move time limit in milliseconds; 0 searches the full depth
    #[arg(long)]
    pub time_limit_ms: Option<u64>,

    /// Play games in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Print the final board of every game
    #[arg(long)]
    pub show_board: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// The two competing engine setups
#[derive(Clone, Debug)]
struct Contestants {
    a: SearchConfig,
    b: SearchConfig,
    a_label: String,
    b_label: String,
}

/// Result of a single game
#[derive(Clone, Debug)]
struct GameRecord {
    game_number: usize,
    status: GameStatus,
    /// True when engine A had Black
    a_black: bool,
    moves: usize,
    nodes_a: u64,
    nodes_b: u64,
    final_board: String,
}

impl GameRecord {
    /// Winning engine: `Some(true)` for A, `Some(false)` for B
    fn a_won(&self) -> Option<bool> {
        match self.status {
            GameStatus::Won(player) => Some((player == Player::Black) == self.a_black),
            _ => None,
        }
    }
}

/// Aggregated match results
#[derive(Clone, Debug)]
struct MatchResults {
    games: Vec<GameRecord>,
    a_wins: usize,
    b_wins: usize,
    draws: usize,
    avg_moves: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run match command
///
/// 1. Build both engine configurations
/// 2. Play the match (multiple games)
/// 3. Report results
pub fn run(args: MatchArgs, base: SearchConfig, seed: Option<u64>) -> Result<()> {
    let contestants = build_engines(&args, &base)?;

    tracing::info!(
        "Starting match: {} vs {} ({} games, depth={})",
        contestants.a_label,
        contestants.b_label,
        args.games,
        contestants.a.max_depth
    );

    let start = Instant::now();
    let results = play_match(&contestants, &args, seed)?;
    tracing::info!("Match finished in {:?}", start.elapsed());

    report_results(&results, &contestants, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Apply command-line overrides to the base configuration
fn build_engines(args: &MatchArgs, base: &SearchConfig) -> Result<Contestants> {
    ensure!(args.games > 0, "--games must be at least 1");

    let mut config = base.clone();
    if let Some(depth) = args.depth {
        ensure!(depth > 0, "--depth must be at least 1");
        config = config.with_depth(depth);
    }
    if let Some(ms) = args.time_limit_ms {
        config = config.with_time_limit_ms(if ms == 0 { None } else { Some(ms) });
    }

    let side = |algorithm: Algorithm| config.clone().with_pruning(algorithm == Algorithm::AlphaBeta);
    Ok(Contestants {
        a: side(args.engine_a),
        b: side(args.engine_b),
        a_label: format!("A ({})", args.engine_a.label()),
        b_label: format!("B ({})", args.engine_b.label()),
    })
}

/// Play all games in the match
fn play_match(contestants: &Contestants, args: &MatchArgs, seed: Option<u64>) -> Result<MatchResults> {
    // Per-game seeds up front so parallel and sequential runs agree
    let mut rng = create_rng(seed);
    let seeds: Vec<u64> = (0..args.games).map(|_| rng.gen()).collect();

    let play = |(game_num, &game_seed): (usize, &u64)| -> Result<GameRecord> {
        // Alternate colors for fairness
        let a_black = game_num % 2 == 0;
        let record = play_single_game(contestants, game_num + 1, a_black, game_seed)?;
        tracing::info!(
            "Game {}: {:?} ({} moves)",
            record.game_number,
            record.status,
            record.moves
        );
        Ok(record)
    };

    let games = if args.parallel {
        seeds.par_iter().enumerate().map(play).collect::<Result<Vec<_>>>()?
    } else {
        seeds.iter().enumerate().map(play).collect::<Result<Vec<_>>>()?
    };

    Ok(compute_match_statistics(games))
}

/// Report match results
fn report_results(results: &MatchResults, contestants: &Contestants, args: &MatchArgs) {
    if args.json {
        print_json_results(results, contestants, args.show_board);
    } else {
        print_text_results(results, contestants, args.show_board);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play one game to completion
fn play_single_game(
    contestants: &Contestants,
    game_number: usize,
    a_black: bool,
    seed: u64,
) -> Result<GameRecord> {
    let mut engine_a = SearchEngine::new(contestants.a.clone().with_seed(seed));
    let mut engine_b = SearchEngine::new(contestants.b.clone().with_seed(seed.wrapping_add(1)));
    let (mut nodes_a, mut nodes_b) = (0, 0);

    let mut state = BoardState::new();
    while !state.is_over() {
        let a_to_move = (state.current_player() == Player::Black) == a_black;
        let (engine, nodes) = if a_to_move {
            (&mut engine_a, &mut nodes_a)
        } else {
            (&mut engine_b, &mut nodes_b)
        };

        let result = engine.search(&mut state);
        let pos: Pos = result
            .best_move
            .with_context(|| format!("Game {}: engine found no move", game_number))?;
        *nodes += result.nodes;
        ensure!(state.play(pos), "Game {}: engine chose illegal move {}", game_number, pos);
    }

    Ok(GameRecord {
        game_number,
        status: state.status(),
        a_black,
        moves: state.stone_count(),
        nodes_a,
        nodes_b,
        final_board: state.to_string(),
    })
}

/// Compute aggregate statistics from game records
fn compute_match_statistics(games: Vec<GameRecord>) -> MatchResults {
    let a_wins = games.iter().filter(|g| g.a_won() == Some(true)).count();
    let b_wins = games.iter().filter(|g| g.a_won() == Some(false)).count();
    let draws = games.iter().filter(|g| g.status == GameStatus::Drawn).count();

    let total_moves: usize = games.iter().map(|g| g.moves).sum();
    let avg_moves = if games.is_empty() {
        0.0
    } else {
        total_moves as f32 / games.len() as f32
    };

    MatchResults {
        games,
        a_wins,
        b_wins,
        draws,
        avg_moves,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn percent(count: usize, total: usize) -> f32 {
    if total > 0 {
        count as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

/// "A", "B" or "draw"
fn outcome_label(game: &GameRecord) -> &'static str {
    match game.a_won() {
        Some(true) => "A",
        Some(false) => "B",
        None => "draw",
    }
}

/// Print results as JSON
fn print_json_results(results: &MatchResults, contestants: &Contestants, show_board: bool) {
    #[derive(serde::Serialize)]
    struct JsonGame {
        game_number: usize,
        black: String,
        white: String,
        winner: String,
        moves: usize,
        nodes_a: u64,
        nodes_b: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        final_board: Option<String>,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        engine_a: String,
        engine_b: String,
        total_games: usize,
        a_wins: usize,
        b_wins: usize,
        draws: usize,
        avg_moves: f32,
        games: Vec<JsonGame>,
    }

    let output = JsonOutput {
        engine_a: contestants.a_label.clone(),
        engine_b: contestants.b_label.clone(),
        total_games: results.games.len(),
        a_wins: results.a_wins,
        b_wins: results.b_wins,
        draws: results.draws,
        avg_moves: results.avg_moves,
        games: results
            .games
            .iter()
            .map(|g| {
                let (black, white) = if g.a_black { ("A", "B") } else { ("B", "A") };
                JsonGame {
                    game_number: g.game_number,
                    black: black.to_string(),
                    white: white.to_string(),
                    winner: outcome_label(g).to_string(),
                    moves: g.moves,
                    nodes_a: g.nodes_a,
                    nodes_b: g.nodes_b,
                    final_board: show_board.then(|| g.final_board.clone()),
                }
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

/// Print results as text
fn print_text_results(results: &MatchResults, contestants: &Contestants, show_board: bool) {
    let total = results.games.len();

    println!("\n=== Match Results ===");
    println!("{} vs {}", contestants.a_label, contestants.b_label);
    println!("Total games: {}", total);
    println!("A wins:      {} ({:.1}%)", results.a_wins, percent(results.a_wins, total));
    println!("B wins:      {} ({:.1}%)", results.b_wins, percent(results.b_wins, total));
    println!("Draws:       {} ({:.1}%)", results.draws, percent(results.draws, total));
    println!("Avg moves:   {:.1}", results.avg_moves);

    println!("\nGame details:");
    for game in &results.games {
        let black = if game.a_black { "A" } else { "B" };
        println!(
            "  Game {}: winner {} in {} moves (Black: {}, nodes A={}, B={})",
            game.game_number,
            outcome_label(game),
            game.moves,
            black,
            game.nodes_a,
            game.nodes_b
        );
        if show_board {
            println!("{}", game.final_board);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(game_number: usize, status: GameStatus, a_black: bool, moves: usize) -> GameRecord {
        GameRecord {
            game_number,
            status,
            a_black,
            moves,
            nodes_a: 0,
            nodes_b: 0,
            final_board: String::new(),
        }
    }

    fn args(depth: Option<u32>, time_limit_ms: Option<u64>) -> MatchArgs {
        MatchArgs {
            engine_a: Algorithm::Minimax,
            engine_b: Algorithm::AlphaBeta,
            games: 2,
            depth,
            time_limit_ms,
            parallel: false,
            show_board: false,
            json: false,
        }
    }

    #[test]
    fn test_compute_match_statistics_empty() {
        let results = compute_match_statistics(vec![]);
        assert_eq!(results.a_wins, 0);
        assert_eq!(results.b_wins, 0);
        assert_eq!(results.draws, 0);
        assert_eq!(results.avg_moves, 0.0);
    }

    #[test]
    fn test_compute_match_statistics() {
        let games = vec![
            record(1, GameStatus::Won(Player::Black), true, 10),
            record(2, GameStatus::Won(Player::Black), false, 20),
            record(3, GameStatus::Won(Player::White), false, 30),
            record(4, GameStatus::Drawn, true, 225),
        ];

        let results = compute_match_statistics(games);
        assert_eq!(results.a_wins, 2);
        assert_eq!(results.b_wins, 1);
        assert_eq!(results.draws, 1);
        assert_eq!(results.avg_moves, 71.25);
    }

    #[test]
    fn test_build_engines_overrides() {
        let contestants = build_engines(&args(Some(3), Some(0)), &SearchConfig::default()).unwrap();
        assert!(!contestants.a.use_pruning);
        assert!(contestants.b.use_pruning);
        assert_eq!(contestants.a.max_depth, 3);
        assert_eq!(contestants.b.time_limit_ms, None);

        let kept = build_engines(&args(None, None), &SearchConfig::default()).unwrap();
        assert_eq!(kept.a.max_depth, 2);
        assert_eq!(kept.a.time_limit_ms, Some(5000));

        assert!(build_engines(&args(Some(0), None), &SearchConfig::default()).is_err());
    }

    #[test]
    fn test_single_game_finishes() {
        let contestants = build_engines(&args(Some(1), Some(0)), &SearchConfig::default()).unwrap();
        let game = play_single_game(&contestants, 1, true, 42).unwrap();
        assert_ne!(game.status, GameStatus::InProgress);
        assert!(game.moves >= 9);
        assert!(game.nodes_a > 0 && game.nodes_b > 0);
    }

    #[test]
    fn test_create_rng_deterministic() {
        let mut rng1 = create_rng(Some(42));
        let mut rng2 = create_rng(Some(42));
        assert_eq!(rng1.gen::<u64>(), rng2.gen::<u64>());
    }
}
