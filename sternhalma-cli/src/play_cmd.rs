//! Play command - run one game from the opening position
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_config(), play_game(), report_result()
//! - Level 3: Player::choose(), summarize()
//! - Level 4: formatting utilities

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use sternhalma_core::{GameResult, GameState, Move, SearchConfig, Searcher, Side, Strategy, Turn};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PlayerKind {
    /// Alpha-beta search
    Engine,
    /// Uniformly random legal move
    Random,
}

#[derive(Args)]
pub struct PlayArgs {
    /// Who plays North
    #[arg(long, value_enum, default_value = "engine")]
    pub north: PlayerKind,

    /// Who plays South
    #[arg(long, value_enum, default_value = "engine")]
    pub south: PlayerKind,

    /// Search depth (overrides the config file)
    #[arg(long)]
    pub depth: Option<u32>,

    /// Search strategy: serial, parallel or hybrid (overrides the config file)
    #[arg(long)]
    pub strategy: Option<Strategy>,

    /// Worker threads for the parallel strategies
    #[arg(long)]
    pub threads: Option<usize>,

    /// Search config JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Stop after this many plies
    #[arg(long, default_value = "300")]
    pub max_plies: u32,

    /// Output the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Outcome of one game
#[derive(Clone, Debug)]
struct GameRecord {
    result: GameResult,
    plies: u32,
    turns: Vec<Turn>,
    north_home: u32,
    south_home: u32,
    /// Both sides passed in a row
    stalled: bool,
    elapsed: Duration,
}

/// A side's move chooser
enum Player {
    Engine(Searcher),
    Random,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
///
/// This function reads like a table of contents:
/// 1. Build the search config
/// 2. Play one game
/// 3. Report the result
pub fn run(args: PlayArgs, seed: Option<u64>) -> Result<()> {
    let config = load_config(&args)?;

    tracing::info!(
        "Starting game: {:?} (North) vs {:?} (South), depth={}, strategy={}",
        args.north,
        args.south,
        config.depth,
        config.strategy
    );

    let mut north = Player::new(args.north, &config)?;
    let mut south = Player::new(args.south, &config)?;
    let mut rng = create_rng(seed);

    let record = play_game(GameState::new(), &mut north, &mut south, args.max_plies, &mut rng)?;

    report_result(&record, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Config file first, then command-line overrides
fn load_config(args: &PlayArgs) -> Result<SearchConfig> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::load(path)
            .with_context(|| format!("Failed to load search config: {}", path.display()))?,
        None => SearchConfig::default(),
    };

    if let Some(depth) = args.depth {
        config.depth = depth;
    }
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }

    anyhow::ensure!(config.depth > 0, "search depth must be at least 1");
    Ok(config)
}

/// Alternate turns until someone wins, both sides are stuck, or the ply
/// limit is reached
fn play_game(
    initial: GameState,
    north: &mut Player,
    south: &mut Player,
    max_plies: u32,
    rng: &mut ChaCha8Rng,
) -> Result<GameRecord> {
    let start = Instant::now();
    let mut state = initial;
    let mut passes = 0;

    while !state.is_over() && state.ply < max_plies && passes < 2 {
        let player = match state.current_player() {
            Side::North => &mut *north,
            Side::South => &mut *south,
        };

        state = match player.choose(&state, rng)? {
            Some(mv) => {
                tracing::debug!("ply {}: {:?} plays {}", state.ply, state.current_player(), mv);
                passes = 0;
                state.apply_move(mv)?
            }
            None => {
                tracing::warn!("{:?} has no legal move and passes", state.current_player());
                passes += 1;
                state.pass()
            }
        };
    }

    Ok(summarize(&state, passes >= 2, start.elapsed()))
}

/// Report game result
fn report_result(record: &GameRecord, args: &PlayArgs) {
    if args.json {
        print_json_result(record);
    } else {
        print_text_result(record);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

impl Player {
    fn new(kind: PlayerKind, config: &SearchConfig) -> Result<Self> {
        Ok(match kind {
            PlayerKind::Engine => Player::Engine(Searcher::new(config.clone())?),
            PlayerKind::Random => Player::Random,
        })
    }

    /// Pick a move for the side to move, `None` to pass
    fn choose(&mut self, state: &GameState, rng: &mut ChaCha8Rng) -> Result<Option<Move>> {
        match self {
            Player::Engine(searcher) => Ok(searcher.best_move(&state.position())?),
            Player::Random => Ok(state.legal_moves().choose(rng).copied()),
        }
    }
}

fn summarize(state: &GameState, stalled: bool, elapsed: Duration) -> GameRecord {
    GameRecord {
        result: state.result(),
        plies: state.ply,
        turns: state.history().to_vec(),
        north_home: state.pieces_home(Side::North),
        south_home: state.pieces_home(Side::South),
        stalled,
        elapsed,
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

fn result_label(record: &GameRecord) -> String {
    match record.result {
        GameResult::NorthWins => "North wins".to_string(),
        GameResult::SouthWins => "South wins".to_string(),
        GameResult::Ongoing if record.stalled => "Stalled".to_string(),
        GameResult::Ongoing => format!("Unfinished after {} plies", record.plies),
    }
}

fn format_turn(turn: &Turn) -> String {
    match turn {
        Some(mv) => mv.to_string(),
        None => "pass".to_string(),
    }
}

/// Print result as JSON
fn print_json_result(record: &GameRecord) {
    #[derive(serde::Serialize)]
    struct JsonOutput {
        result: GameResult,
        plies: u32,
        north_home: u32,
        south_home: u32,
        stalled: bool,
        elapsed_ms: f64,
        moves: Vec<Turn>,
    }

    let output = JsonOutput {
        result: record.result,
        plies: record.plies,
        north_home: record.north_home,
        south_home: record.south_home,
        stalled: record.stalled,
        elapsed_ms: record.elapsed.as_secs_f64() * 1000.0,
        moves: record.turns.clone(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

/// Print result as text
fn print_text_result(record: &GameRecord) {
    println!("\n=== Game Result ===");
    println!("Result:      {}", result_label(record));
    println!("Plies:       {}", record.plies);
    println!("North home:  {}/10", record.north_home);
    println!("South home:  {}/10", record.south_home);
    println!("Time:        {:.2}s", record.elapsed.as_secs_f64());

    let moves: Vec<String> = record.turns.iter().map(format_turn).collect();
    for (round, pair) in moves.chunks(2).enumerate() {
        println!("{:>4}. {}", round + 1, pair.join("  "));
    }
}
