//! Error types

/// Errors raised at the engine's call boundary
///
/// These describe caller mistakes: malformed bitboards and positions that
/// break the occupancy invariants. A side with no legal move is not an
/// error; searches report it as `SearchOutcome::NoMove`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("expected exactly one piece bit, found {0}")]
    NotSinglePiece(u32),

    #[error("bits outside the 81-cell board: {0:#x}")]
    OutsideBoard(u128),

    #[error("cell index {0} is outside the board")]
    CellOutOfRange(usize),

    #[error("mover and opponent share {0} cell(s)")]
    OverlappingSides(u32),

    #[error("occupied bitboard does not equal mover | opponent")]
    OccupancyMismatch,

    #[error("illegal move {from} -> {to}")]
    IllegalMove { from: usize, to: usize },

    #[error("goal_rows {0} exceeds the board's {1} rows")]
    InvalidGoalRows(u8, usize),

    #[error("search depth must be at least 1")]
    ZeroDepth,

    #[error("failed to build search thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
