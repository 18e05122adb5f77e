//! Sternhalma Core - Bitboard engine for two-player star-board Chinese Checkers
//!
//! This crate provides:
//! - A two-word 81-cell bitboard with parallel bit extract/deposit
//! - Board topology tables built at compile time
//! - Step and chained-jump move generation
//! - Row-progress evaluation with a per-search cache
//! - Alpha-beta search with serial, root-parallel and hybrid strategies

pub mod bitboard;
pub mod board;
pub mod error;
pub mod movegen;
pub mod eval;
pub mod position;
pub mod search;
pub mod game;

// Re-exports for convenient access
pub use bitboard::{Bitboard, CELL_COUNT};
pub use board::{Cell, Side, Topology, DIRECTIONS, PIECES_PER_SIDE, TOPOLOGY};
pub use error::EngineError;
pub use movegen::{all_moves, apply_move, generate_moves, jump_moves, moves_from, step_moves, Move};
pub use eval::{evaluate, Evaluator, Heuristics, DEFAULT_CACHE_CAPACITY};
pub use position::Position;
pub use search::{
    best_move_hybrid, best_move_parallel, best_move_serial, find_best_move, minimax, SearchConfig,
    SearchOutcome, SearchResult, SearchStats, Searcher, Strategy,
};
pub use game::{GameResult, GameState, Turn};
