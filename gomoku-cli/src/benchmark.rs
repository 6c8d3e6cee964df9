//! Bench command - compare minimax and alpha-beta search cost
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: run_benchmarks(), report_results()
//! - Level 3: benchmark_search()
//! - Level 4: timing utilities, formatting

use std::time::{Duration, Instant};

use anyhow::{ensure, Result};
use clap::Args;

use gomoku_core::{BoardState, Pos, SearchConfig, SearchEngine};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct BenchmarkArgs {
    /// Deepest search to time
    #[arg(long, default_value = "3")]
    pub max_depth: u32,

    /// Skip minimax (it grows much faster than alpha-beta)
    #[arg(long)]
    pub alpha_beta_only: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// One timed search
#[derive(Clone, Debug)]
struct BenchmarkResult {
    algorithm: &'static str,
    depth: u32,
    nodes: u64,
    time: Duration,
    best_move: Option<Pos>,
    score: i64,
}

impl BenchmarkResult {
    fn nodes_per_second(&self) -> f64 {
        let secs = self.time.as_secs_f64();
        if secs > 0.0 {
            self.nodes as f64 / secs
        } else {
            0.0
        }
    }
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run bench command
///
/// 1. Set up the benchmark position
/// 2. Search it at every depth with each algorithm
/// 3. Report all results
pub fn run(args: BenchmarkArgs, base: SearchConfig, seed: Option<u64>) -> Result<()> {
    ensure!(args.max_depth > 0, "--max-depth must be at least 1");

    let position = benchmark_position();
    tracing::info!(
        "Benchmarking depths 1..={} on a {}-stone position",
        args.max_depth,
        position.stone_count()
    );

    let results = run_benchmarks(&position, &args, &base, seed);
    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn run_benchmarks(
    position: &BoardState,
    args: &BenchmarkArgs,
    base: &SearchConfig,
    seed: Option<u64>,
) -> Vec<BenchmarkResult> {
    let mut results = Vec::new();
    for depth in 1..=args.max_depth {
        if !args.alpha_beta_only {
            results.push(benchmark_search(position, base, depth, false, seed));
        }
        results.push(benchmark_search(position, base, depth, true, seed));
    }
    results
}

fn report_results(results: &[BenchmarkResult], args: &BenchmarkArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Time one full-depth search of `position`
fn benchmark_search(
    position: &BoardState,
    base: &SearchConfig,
    depth: u32,
    use_pruning: bool,
    seed: Option<u64>,
) -> BenchmarkResult {
    let mut config = base
        .clone()
        .with_depth(depth)
        .with_pruning(use_pruning)
        .with_time_limit_ms(None);
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }

    let mut engine = SearchEngine::new(config);
    let mut state = position.clone();

    let start = Instant::now();
    let result = engine.search(&mut state);
    let time = start.elapsed();

    let algorithm = if use_pruning { "alpha-beta" } else { "minimax" };
    tracing::info!("{} depth {}: {} nodes in {:?}", algorithm, depth, result.nodes, time);

    BenchmarkResult {
        algorithm,
        depth,
        nodes: result.nodes,
        time,
        best_move: result.best_move,
        score: result.score,
    }
}

/// Fixed middle-game position, White to move
fn benchmark_position() -> BoardState {
    let mut state = BoardState::new();
    for (r, c) in [(7, 7), (8, 8), (7, 8), (7, 6), (6, 7), (8, 7), (6, 9)] {
        let placed = state.play(Pos::new(r, c));
        debug_assert!(placed, "benchmark move {},{} rejected", r, c);
    }
    state
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Format duration for display
fn format_duration(d: Duration) -> String {
    if d.as_secs() >= 60 {
        format!("{}m {:.1}s", d.as_secs() / 60, (d.as_secs() % 60) as f64 + d.subsec_millis() as f64 / 1000.0)
    } else if d.as_secs() >= 1 {
        format!("{:.2}s", d.as_secs_f64())
    } else if d.as_millis() >= 1 {
        format!("{:.1}ms", d.as_secs_f64() * 1000.0)
    } else {
        format!("{:.1}us", d.as_secs_f64() * 1_000_000.0)
    }
}

fn format_move(pos: Option<Pos>) -> String {
    pos.map_or_else(|| "-".to_string(), |p| p.to_string())
}

/// Print results as JSON
fn print_json_results(results: &[BenchmarkResult]) {
    #[derive(serde::Serialize)]
    struct JsonBenchmark {
        algorithm: &'static str,
        depth: u32,
        nodes: u64,
        time_ms: f64,
        nodes_per_second: f64,
        best_move: String,
        score: i64,
    }

    let output: Vec<JsonBenchmark> = results
        .iter()
        .map(|r| JsonBenchmark {
            algorithm: r.algorithm,
            depth: r.depth,
            nodes: r.nodes,
            time_ms: r.time.as_secs_f64() * 1000.0,
            nodes_per_second: r.nodes_per_second(),
            best_move: format_move(r.best_move),
            score: r.score,
        })
        .collect();

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

/// Print results as text table
fn print_text_results(results: &[BenchmarkResult]) {
    println!("\n=== Gomoku Search Benchmark ===\n");
    println!(
        "{:<12} {:>6} {:>12} {:>12} {:>12} {:>7} {:>10}",
        "Algorithm", "Depth", "Nodes", "Time", "Nodes/s", "Move", "Score"
    );
    println!("{}", "-".repeat(77));

    for r in results {
        println!(
            "{:<12} {:>6} {:>12} {:>12} {:>12.0} {:>7} {:>10}",
            r.algorithm,
            r.depth,
            r.nodes,
            format_duration(r.time),
            r.nodes_per_second(),
            format_move(r.best_move),
            r.score
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
