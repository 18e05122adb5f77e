//! Bench command - compare search strategies
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_positions(), run_benchmarks(), report_results()
//! - Level 3: benchmark_strategy()
//! - Level 4: timing utilities, formatting

use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Args;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use sternhalma_core::{GameState, Position, SearchConfig, Searcher, Strategy};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct BenchmarkArgs {
    /// Maximum search depth to test
    #[arg(long, default_value = "4")]
    pub depth: u32,

    /// Number of test positions (the opening plus random middlegames)
    #[arg(long, default_value = "3")]
    pub positions: usize,

    /// Random plies played to reach each middlegame position
    #[arg(long, default_value = "20")]
    pub plies: usize,

    /// Worker threads for the parallel strategies
    #[arg(long)]
    pub threads: Option<usize>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Timing of one strategy at one depth, summed over all positions
#[derive(Clone, Debug, serde::Serialize)]
struct BenchmarkResult {
    strategy: Strategy,
    depth: u32,
    positions: usize,
    #[serde(serialize_with = "as_millis")]
    total_time: Duration,
    nodes: u64,
    leaves: u64,
    cache_hits: u64,
    /// Positions where the chosen move equals the parallel (exact) choice
    agrees_with_full: usize,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run benchmark command
///
/// This function reads like a table of contents:
/// 1. Build the test positions
/// 2. Time every strategy at every depth
/// 3. Report all results
pub fn run(args: BenchmarkArgs, seed: Option<u64>) -> Result<()> {
    tracing::info!(
        "Starting benchmarks: {} positions, max depth {}",
        args.positions,
        args.depth
    );

    let workers = Searcher::new(SearchConfig {
        threads: args.threads,
        ..Default::default()
    })?
    .workers();
    tracing::info!("Parallel strategies use {} worker(s)", workers);

    let positions = build_positions(args.positions, args.plies, seed);
    let results = run_benchmarks(&positions, &args)?;

    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Opening position followed by random middlegames
fn build_positions(count: usize, plies: usize, seed: Option<u64>) -> Vec<Position> {
    let mut rng = create_rng(seed);
    let mut positions = vec![GameState::new().position()];

    while positions.len() < count {
        let mut game = GameState::new();
        for _ in 0..plies {
            if game.is_over() {
                break;
            }
            let next = match game.legal_moves().choose(&mut rng) {
                Some(&mv) => game.apply_move(mv),
                None => Ok(game.pass()),
            };
            // generated moves are always legal
            game = match next {
                Ok(state) => state,
                Err(_) => break,
            };
        }
        positions.push(game.position());
    }

    positions.truncate(count.max(1));
    positions
}

fn run_benchmarks(positions: &[Position], args: &BenchmarkArgs) -> Result<Vec<BenchmarkResult>> {
    let mut results = Vec::new();

    for depth in 1..=args.depth {
        tracing::info!("Benchmarking depth {}...", depth);

        let config = SearchConfig {
            threads: args.threads,
            ..SearchConfig::with_depth(depth)
        };
        let reference: Vec<_> = positions
            .iter()
            .map(|p| sternhalma_core::best_move_parallel(p, &config).map(|r| r.best_move()))
            .collect::<Result<_, _>>()?;

        for strategy in [Strategy::Serial, Strategy::Parallel, Strategy::Hybrid] {
            let config = config.clone().strategy(strategy);
            results.push(benchmark_strategy(positions, &reference, config)?);
        }
    }

    Ok(results)
}

/// Report all benchmark results
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

fn benchmark_strategy(
    positions: &[Position],
    reference: &[Option<sternhalma_core::Move>],
    config: SearchConfig,
) -> Result<BenchmarkResult> {
    let strategy = config.strategy;
    let depth = config.depth;
    let searcher = Searcher::new(config)?;

    let mut result = BenchmarkResult {
        strategy,
        depth,
        positions: positions.len(),
        total_time: Duration::ZERO,
        nodes: 0,
        leaves: 0,
        cache_hits: 0,
        agrees_with_full: 0,
    };

    for (position, expected) in positions.iter().zip(reference) {
        let start = Instant::now();
        let found = searcher.search(position)?;
        result.total_time += start.elapsed();

        result.nodes += found.stats.nodes;
        result.leaves += found.stats.leaves;
        result.cache_hits += found.stats.cache_hits;
        if found.best_move() == *expected {
            result.agrees_with_full += 1;
        }
    }

    Ok(result)
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

fn as_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

fn nodes_per_second(result: &BenchmarkResult) -> f64 {
    let secs = result.total_time.as_secs_f64();
    if secs > 0.0 {
        result.nodes as f64 / secs
    } else {
        0.0
    }
}

/// Print results as JSON
fn print_json_results(results: &[BenchmarkResult]) {
    if let Ok(json) = serde_json::to_string_pretty(results) {
        println!("{}", json);
    }
}

/// Print results as text
fn print_text_results(results: &[BenchmarkResult]) {
    println!("\n=== Search Benchmark ===");
    println!(
        "{:<10} {:>5} {:>12} {:>12} {:>14} {:>10} {:>8}",
        "Strategy", "Depth", "Time (ms)", "Nodes", "Nodes/sec", "Cache hits", "Agree"
    );
    println!("{}", "-".repeat(77));

    for r in results {
        println!(
            "{:<10} {:>5} {:>12.2} {:>12} {:>14.0} {:>10} {:>5}/{}",
            r.strategy.to_string(),
            r.depth,
            r.total_time.as_secs_f64() * 1000.0,
            r.nodes,
            nodes_per_second(r),
            r.cache_hits,
            r.agrees_with_full,
            r.positions
        );
    }
}
