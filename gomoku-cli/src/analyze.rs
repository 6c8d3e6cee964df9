//! Analyze command - search a single position
//!
//! Reads a board diagram (`X`, `O`, `.`; labels allowed), runs the engine for
//! the side to move and prints the chosen move with search statistics.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use gomoku_core::{top_moves, BoardState, ScoredMove, SearchConfig, SearchEngine, SearchResult};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Board diagram file
    #[arg(value_name = "FILE")]
    pub position: PathBuf,

    /// Search depth (overrides the config file)
    #[arg(long)]
    pub depth: Option<u32>,

    /// Time limit in milliseconds; 0 searches the full depth
    #[arg(long)]
    pub time_limit_ms: Option<u64>,

    /// Use plain minimax instead of alpha-beta
    #[arg(long)]
    pub minimax: bool,

    /// Number of one-ply candidates to list
    #[arg(long, default_value = "5")]
    pub candidates: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: AnalyzeArgs, base: SearchConfig, seed: Option<u64>) -> Result<()> {
    let mut state = load_position(&args.position)?;
    let config = apply_overrides(&args, base, seed);

    tracing::info!(
        "Analyzing {} ({} stones, {:?} to move, depth={})",
        args.position.display(),
        state.stone_count(),
        state.current_player(),
        config.max_depth
    );

    let ranked = top_moves(&state, args.candidates, state.current_player(), &config.heuristics);
    let mut engine = SearchEngine::new(config);
    let result = engine.search(&mut state);

    if args.json {
        print_json(&state, &result, &ranked)?;
    } else {
        print_text(&state, &result, &ranked);
    }
    Ok(())
}

fn load_position(path: &Path) -> Result<BoardState> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read position: {}", path.display()))?;
    BoardState::from_diagram(&text).with_context(|| format!("Invalid position: {}", path.display()))
}

fn apply_overrides(args: &AnalyzeArgs, base: SearchConfig, seed: Option<u64>) -> SearchConfig {
    let mut config = base;
    if let Some(depth) = args.depth {
        config = config.with_depth(depth);
    }
    if let Some(ms) = args.time_limit_ms {
        config = config.with_time_limit_ms(if ms == 0 { None } else { Some(ms) });
    }
    if args.minimax {
        config = config.with_pruning(false);
    }
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    config
}

fn print_json(state: &BoardState, result: &SearchResult, ranked: &[ScoredMove]) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonOutput<'a> {
        to_move: String,
        stones: usize,
        result: &'a SearchResult,
        candidates: &'a [ScoredMove],
    }

    let output = JsonOutput {
        to_move: format!("{:?}", state.current_player()),
        stones: state.stone_count(),
        result,
        candidates: ranked,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text(state: &BoardState, result: &SearchResult, ranked: &[ScoredMove]) {
    println!("{}", state);
    println!("{:?} to move, {} stones", state.current_player(), state.stone_count());

    if !ranked.is_empty() {
        println!("\nOne-ply candidates:");
        for (i, m) in ranked.iter().enumerate() {
            println!("  {}. {:<6} {}", i + 1, m.pos.to_string(), m.score);
        }
    }

    println!();
    match result.best_move {
        Some(pos) => println!("Best move: {}", pos),
        None => println!("Best move: none"),
    }
    println!("Score:     {}", result.score);
    println!("Depth:     {}{}", result.depth, if result.timed_out { " (time limit)" } else { "" });
    println!("Nodes:     {}", result.nodes);
    println!("Time:      {:?}", result.elapsed);
}
