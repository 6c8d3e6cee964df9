//! Gomoku CLI - Command-line interface
//!
//! Commands:
//! - match: Play engine-vs-engine games
//! - analyze: Search a position read from a diagram file
//! - bench: Compare minimax and alpha-beta cost by depth

mod analyze;
mod benchmark;
mod match_cmd;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gomoku_core::SearchConfig;

#[derive(Parser)]
#[command(name = "gomoku")]
#[command(about = "Gomoku search engine")]
struct Cli {
    /// Random seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Search configuration JSON file (defaults apply to missing fields)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play engine-vs-engine games
    Match(match_cmd::MatchArgs),
    /// Find the engine's move in a position
    Analyze(analyze::AnalyzeArgs),
    /// Time minimax against alpha-beta at increasing depths
    Bench(benchmark::BenchmarkArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let base = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Match(args) => match_cmd::run(args, base, cli.seed),
        Commands::Analyze(args) => analyze::run(args, base, cli.seed),
        Commands::Bench(args) => benchmark::run(args, base, cli.seed),
    }
}

/// Config file if given, defaults otherwise
fn load_config(path: Option<&Path>) -> Result<SearchConfig> {
    match path {
        Some(path) => SearchConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(SearchConfig::default()),
    }
}
