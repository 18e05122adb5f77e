//! Alpha-beta minimax over the bitboard move generator
//!
//! Three root strategies share one recursive search:
//! - serial: plain alpha-beta from the root
//! - parallel: every root move searched by its own rayon task
//! - hybrid: a shallow serial pass ranks the root moves, then only the best
//!   few are searched to full depth in parallel
//!
//! Leaves are always scored from the root mover's point of view; the
//! maximizing flag says whose pieces move at each ply.

use std::fmt;
use std::ops::{Add, AddAssign};
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bitboard::Bitboard;
use crate::board::Side;
use crate::error::EngineError;
use crate::eval::{Evaluator, Heuristics, DEFAULT_CACHE_CAPACITY};
use crate::movegen::{moves_from, Move};
use crate::position::Position;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// How root moves are distributed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Serial,
    Parallel,
    #[default]
    Hybrid,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "serial" => Ok(Strategy::Serial),
            "parallel" => Ok(Strategy::Parallel),
            "hybrid" => Ok(Strategy::Hybrid),
            other => Err(format!("unknown strategy '{}' (serial, parallel, hybrid)", other)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Serial => "serial",
            Strategy::Parallel => "parallel",
            Strategy::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

/// Search parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Plies searched, counting the root move
    pub depth: u32,
    pub strategy: Strategy,
    /// Plies used by the hybrid ranking pass, counting the root move like
    /// `depth`. The default 2 scores each root move against every reply.
    pub quick_depth: u32,
    /// Root moves the hybrid strategy keeps for the full-depth pass
    pub top_k: usize,
    /// Worker threads; `None` uses the global rayon pool
    pub threads: Option<usize>,
    /// Evaluation cache entries per worker (0 disables caching)
    pub cache_capacity: usize,
    pub heuristics: Heuristics,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 4,
            strategy: Strategy::Hybrid,
            quick_depth: 2,
            top_k: 5,
            threads: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            heuristics: Heuristics::default(),
        }
    }
}

impl SearchConfig {
    pub fn with_depth(depth: u32) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn heuristics(mut self, heuristics: Heuristics) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read search config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid search config: {}", path.display()))?;
        config
            .heuristics
            .validate()
            .with_context(|| format!("Invalid heuristics in search config: {}", path.display()))?;
        Ok(config)
    }

    fn evaluator(&self, side: Side) -> Evaluator {
        Evaluator::new(side, self.heuristics, self.cache_capacity)
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// Counters accumulated by one search call
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes entered, leaves included
    pub nodes: u64,
    /// Leaves evaluated
    pub leaves: u64,
    /// Moves generated and searched
    pub moves: u64,
    /// Leaf evaluations answered by the cache
    pub cache_hits: u64,
}

impl AddAssign for SearchStats {
    fn add_assign(&mut self, other: Self) {
        self.nodes += other.nodes;
        self.leaves += other.leaves;
        self.moves += other.moves;
        self.cache_hits += other.cache_hits;
    }
}

impl Add for SearchStats {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

/// What a search found
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Found { mv: Move, score: i32 },
    /// The mover has no legal move
    NoMove,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchResult {
    pub outcome: SearchOutcome,
    pub stats: SearchStats,
}

impl SearchResult {
    pub fn best_move(&self) -> Option<Move> {
        match self.outcome {
            SearchOutcome::Found { mv, .. } => Some(mv),
            SearchOutcome::NoMove => None,
        }
    }

    pub fn score(&self) -> Option<i32> {
        match self.outcome {
            SearchOutcome::Found { score, .. } => Some(score),
            SearchOutcome::NoMove => None,
        }
    }

    fn no_move(stats: SearchStats) -> Self {
        Self {
            outcome: SearchOutcome::NoMove,
            stats,
        }
    }
}

// ============================================================================
// SEARCHER
// ============================================================================

/// Configured engine, optionally with its own worker pool
pub struct Searcher {
    config: SearchConfig,
    pool: Option<rayon::ThreadPool>,
}

impl Searcher {
    pub fn new(config: SearchConfig) -> Result<Self, EngineError> {
        config.heuristics.validate()?;
        let pool = match config.threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("search-{}", i))
                    .build()?,
            ),
            None => None,
        };
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Number of workers the parallel strategies will use
    pub fn workers(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Run the configured strategy
    pub fn search(&self, position: &Position) -> Result<SearchResult, EngineError> {
        let run = || match self.config.strategy {
            Strategy::Serial => best_move_serial(position, &self.config),
            Strategy::Parallel => best_move_parallel(position, &self.config),
            Strategy::Hybrid => best_move_hybrid(position, &self.config),
        };
        let result = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }?;

        tracing::debug!(
            "{} search depth {}: {:?} (nodes={}, leaves={}, cache_hits={})",
            self.config.strategy,
            self.config.depth,
            result.outcome,
            result.stats.nodes,
            result.stats.leaves,
            result.stats.cache_hits
        );
        Ok(result)
    }

    /// Get best move for the position
    pub fn best_move(&self, position: &Position) -> Result<Option<Move>, EngineError> {
        Ok(self.search(position)?.best_move())
    }
}

/// Validate raw bitboards and search them with the default strategy
pub fn find_best_move(
    mover: Bitboard,
    opponent: Bitboard,
    occupied: Bitboard,
    side: Side,
    depth: u32,
) -> Result<Option<Move>, EngineError> {
    let position = Position::new(mover, opponent, occupied, side)?;
    let config = SearchConfig::with_depth(depth);
    Ok(best_move_hybrid(&position, &config)?.best_move())
}

// ============================================================================
// ROOT STRATEGIES
// ============================================================================

/// Sequential alpha-beta over every root move
pub fn best_move_serial(position: &Position, config: &SearchConfig) -> Result<SearchResult, EngineError> {
    check_depth(config.depth)?;

    let mut evaluator = config.evaluator(position.side());
    let mut stats = SearchStats::default();
    let mut best: Option<(Move, i32)> = None;
    let mut alpha = i32::MIN;

    for mv in position.moves() {
        stats.moves += 1;
        let score = search_root_move(position, mv, config.depth, alpha, i32::MAX, &mut evaluator, &mut stats);
        // strict comparison: the first move reaching the best score wins
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((mv, score));
        }
        alpha = alpha.max(score);
    }

    stats.cache_hits += evaluator.hits();
    Ok(match best {
        Some((mv, score)) => SearchResult {
            outcome: SearchOutcome::Found { mv, score },
            stats,
        },
        None => SearchResult::no_move(stats),
    })
}

/// Every root move searched independently in parallel
pub fn best_move_parallel(position: &Position, config: &SearchConfig) -> Result<SearchResult, EngineError> {
    check_depth(config.depth)?;
    let moves = position.moves();
    Ok(deepen(position, &moves, config))
}

/// Shallow serial ranking, then a full-depth parallel pass over the top moves.
///
/// A move the shallow pass under-rates can be dropped, so this trades some
/// accuracy for a much smaller full-depth workload.
pub fn best_move_hybrid(position: &Position, config: &SearchConfig) -> Result<SearchResult, EngineError> {
    check_depth(config.depth)?;
    let moves = position.moves();
    let top_k = config.top_k.max(1);
    let quick_depth = config.quick_depth.max(1);

    if config.depth <= quick_depth || moves.len() <= top_k {
        return Ok(deepen(position, &moves, config));
    }

    let (ranked, quick_stats) = quick_rank(position, &moves, quick_depth, config);

    // keep the shortlist in enumeration order so ties resolve as in a full search
    let mut shortlist: Vec<usize> = ranked.iter().take(top_k).map(|&(i, _)| i).collect();
    shortlist.sort_unstable();
    let candidates: Vec<Move> = shortlist.iter().map(|&i| moves[i]).collect();

    tracing::trace!(
        "hybrid shortlist: {:?}",
        ranked.iter().take(top_k).map(|&(i, s)| (moves[i], s)).collect::<Vec<_>>()
    );

    let mut result = deepen(position, &candidates, config);
    result.stats += quick_stats;
    Ok(result)
}

/// Score every root move at `depth` plies, best first. Ties keep their
/// enumeration order.
pub fn quick_rank(
    position: &Position,
    moves: &[Move],
    depth: u32,
    config: &SearchConfig,
) -> (Vec<(usize, i32)>, SearchStats) {
    let mut evaluator = config.evaluator(position.side());
    let mut stats = SearchStats::default();

    let mut ranked: Vec<(usize, i32)> = moves
        .iter()
        .enumerate()
        .map(|(i, &mv)| {
            stats.moves += 1;
            let score = search_root_move(position, mv, depth, i32::MIN, i32::MAX, &mut evaluator, &mut stats);
            (i, score)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    stats.cache_hits += evaluator.hits();
    (ranked, stats)
}

/// Search each candidate on its own worker and keep the best.
///
/// Workers share nothing mutable: each gets the position by value, its own
/// evaluator and its own counters, and starts from an open window.
fn deepen(position: &Position, candidates: &[Move], config: &SearchConfig) -> SearchResult {
    let snapshot = *position;
    let depth = config.depth;

    let scored: Vec<(i32, SearchStats)> = candidates
        .par_iter()
        .map(|&mv| {
            let mut evaluator = config.evaluator(snapshot.side());
            let mut stats = SearchStats {
                moves: 1,
                ..Default::default()
            };
            let score = search_root_move(&snapshot, mv, depth, i32::MIN, i32::MAX, &mut evaluator, &mut stats);
            stats.cache_hits += evaluator.hits();
            tracing::trace!("root {} scored {}", mv, score);
            (score, stats)
        })
        .collect();

    reduce(candidates, &scored)
}

/// Highest score wins; ties go to the earliest candidate
fn reduce(candidates: &[Move], scored: &[(i32, SearchStats)]) -> SearchResult {
    let mut stats = SearchStats::default();
    let mut best: Option<(Move, i32)> = None;

    for (&mv, &(score, worker_stats)) in candidates.iter().zip(scored) {
        stats += worker_stats;
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((mv, score));
        }
    }

    match best {
        Some((mv, score)) => SearchResult {
            outcome: SearchOutcome::Found { mv, score },
            stats,
        },
        None => SearchResult::no_move(stats),
    }
}

fn check_depth(depth: u32) -> Result<(), EngineError> {
    if depth == 0 {
        Err(EngineError::ZeroDepth)
    } else {
        Ok(())
    }
}

// ============================================================================
// MINIMAX WITH ALPHA-BETA
// ============================================================================

/// Play a root move and search the reply tree
#[inline]
fn search_root_move(
    position: &Position,
    mv: Move,
    depth: u32,
    alpha: i32,
    beta: i32,
    evaluator: &mut Evaluator,
    stats: &mut SearchStats,
) -> i32 {
    let mask = mv.mask();
    minimax(
        position.mover() ^ mask,
        position.opponent(),
        position.occupied() ^ mask,
        depth - 1,
        alpha,
        beta,
        false,
        evaluator,
        stats,
    )
}

/// Fail-soft alpha-beta minimax.
///
/// `mover` and `opponent` stay tied to the root player throughout; at
/// maximizing nodes the mover's pieces move, at minimizing nodes the
/// opponent's. A side without a legal move is scored statically.
#[allow(clippy::too_many_arguments)]
pub fn minimax(
    mover: Bitboard,
    opponent: Bitboard,
    occupied: Bitboard,
    depth: u32,
    mut alpha: i32,
    mut beta: i32,
    maximizing: bool,
    evaluator: &mut Evaluator,
    stats: &mut SearchStats,
) -> i32 {
    stats.nodes += 1;

    if depth == 0 {
        stats.leaves += 1;
        return evaluator.evaluate(mover, opponent);
    }

    let pieces = if maximizing { mover } else { opponent };
    let mut best = if maximizing { i32::MIN } else { i32::MAX };
    let mut searched = false;

    'pieces: for from in pieces.indices() {
        let source = Bitboard::from_index(from);
        for dest in moves_from(from, occupied) {
            stats.moves += 1;
            searched = true;
            let mask = source | dest;

            if maximizing {
                let score = minimax(
                    mover ^ mask,
                    opponent,
                    occupied ^ mask,
                    depth - 1,
                    alpha,
                    beta,
                    false,
                    evaluator,
                    stats,
                );
                best = best.max(score);
                alpha = alpha.max(score);
            } else {
                let score = minimax(
                    mover,
                    opponent ^ mask,
                    occupied ^ mask,
                    depth - 1,
                    alpha,
                    beta,
                    true,
                    evaluator,
                    stats,
                );
                best = best.min(score);
                beta = beta.min(score);
            }

            if alpha >= beta {
                break 'pieces;
            }
        }
    }

    if !searched {
        stats.leaves += 1;
        return evaluator.evaluate(mover, opponent);
    }

    best
}

// ============================================================================
// TESTS
// ============================================================================
