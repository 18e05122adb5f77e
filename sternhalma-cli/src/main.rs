//! Sternhalma CLI - Command-line interface
//!
//! Commands:
//! - play: Play a game between two engines (or an engine and a random mover)
//! - moves: List legal destinations for a cell in the opening position
//! - bench: Time the serial, parallel and hybrid search strategies

mod benchmark;
mod moves_cmd;
mod play_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sternhalma")]
#[command(about = "Bitboard Chinese Checkers engine")]
struct Cli {
    /// Seed for random players and random positions
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single game
    Play(play_cmd::PlayArgs),
    /// Show legal moves for one cell
    Moves(moves_cmd::MovesArgs),
    /// Benchmark search strategies
    Bench(benchmark::BenchmarkArgs),
}

fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => play_cmd::run(args, cli.seed),
        Commands::Moves(args) => moves_cmd::run(args),
        Commands::Bench(args) => benchmark::run(args, cli.seed),
    }
}
