//! Validated game position seen from the side to move

use crate::bitboard::{Bitboard, CELL_COUNT};
use crate::board::Side;
use crate::error::EngineError;
use crate::movegen::{all_moves, moves_from, Move};

/// Position snapshot: the side to move (`mover`), the other side
/// (`opponent`) and their union. Constructed only through validation, so
/// `mover & opponent` is always empty and `occupied == mover | opponent`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    occupied: Bitboard,
    mover: Bitboard,
    opponent: Bitboard,
    side: Side,
}

impl Position {
    /// Check the occupancy invariants and build a position
    pub fn new(
        mover: Bitboard,
        opponent: Bitboard,
        occupied: Bitboard,
        side: Side,
    ) -> Result<Self, EngineError> {
        let overlap = mover & opponent;
        if !overlap.is_empty() {
            return Err(EngineError::OverlappingSides(overlap.count()));
        }
        if occupied != (mover | opponent) {
            return Err(EngineError::OccupancyMismatch);
        }
        Ok(Self {
            occupied,
            mover,
            opponent,
            side,
        })
    }

    /// Build from the two pieces sets, deriving the occupancy
    pub fn from_pieces(mover: Bitboard, opponent: Bitboard, side: Side) -> Result<Self, EngineError> {
        Self::new(mover, opponent, mover | opponent, side)
    }

    /// Caller guarantees `mover & opponent` is empty
    pub(crate) fn from_disjoint(mover: Bitboard, opponent: Bitboard, side: Side) -> Self {
        debug_assert!((mover & opponent).is_empty());
        Self {
            occupied: mover | opponent,
            mover,
            opponent,
            side,
        }
    }

    /// Starting position with `side` to move
    pub fn initial(side: Side) -> Self {
        Self::from_disjoint(side.home(), side.opponent().home(), side)
    }

    pub fn occupied(&self) -> Bitboard {
        self.occupied
    }

    pub fn mover(&self) -> Bitboard {
        self.mover
    }

    pub fn opponent(&self) -> Bitboard {
        self.opponent
    }

    /// Which player the mover is
    pub fn side(&self) -> Side {
        self.side
    }

    /// Legal moves for the mover, ordered by piece then destination
    pub fn moves(&self) -> Vec<Move> {
        all_moves(self.mover, self.occupied)
    }

    /// False for moves off the board as well as illegal ones
    pub fn is_legal(&self, mv: Move) -> bool {
        mv.source() < CELL_COUNT
            && mv.dest() < CELL_COUNT
            && self.mover.contains(mv.source())
            && moves_from(mv.source(), self.occupied).contains(mv.dest())
    }

    /// Play a legal move; the result has the opponent to move
    pub fn play(&self, mv: Move) -> Result<Position, EngineError> {
        for index in [mv.source(), mv.dest()] {
            if index >= CELL_COUNT {
                return Err(EngineError::CellOutOfRange(index));
            }
        }
        if !self.is_legal(mv) {
            return Err(EngineError::IllegalMove {
                from: mv.source(),
                to: mv.dest(),
            });
        }
        Ok(self.play_unchecked(mv))
    }

    pub(crate) fn play_unchecked(&self, mv: Move) -> Position {
        let mask = mv.mask();
        Position {
            occupied: self.occupied ^ mask,
            mover: self.opponent,
            opponent: self.mover ^ mask,
            side: self.side.opponent(),
        }
    }
}
