//! Move generation over the occupancy bitboard
//!
//! A piece either steps onto an empty neighbour or jumps over an occupied
//! neighbour onto the empty cell directly behind it. Jumps chain, and every
//! cell reached along a chain is a legal destination on its own.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bitboard::{Bitboard, CELL_COUNT};
use crate::board::TOPOLOGY;
use crate::error::EngineError;

/// A move from one cell to another
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: u8,
    pub to: u8,
}

impl Move {
    pub fn new(from: usize, to: usize) -> Self {
        debug_assert!(from < CELL_COUNT && to < CELL_COUNT);
        Self {
            from: from as u8,
            to: to as u8,
        }
    }

    /// Build from two single-bit boards
    pub fn from_bits(source: Bitboard, dest: Bitboard) -> Result<Self, EngineError> {
        Ok(Self::new(single_index(source)?, single_index(dest)?))
    }

    pub fn source(&self) -> usize {
        self.from as usize
    }

    pub fn dest(&self) -> usize {
        self.to as usize
    }

    pub fn source_bit(&self) -> Bitboard {
        Bitboard::from_index(self.source())
    }

    pub fn dest_bit(&self) -> Bitboard {
        Bitboard::from_index(self.dest())
    }

    /// The two bits a move flips
    pub fn mask(&self) -> Bitboard {
        self.source_bit() | self.dest_bit()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// Index of a single-bit board
pub fn single_index(bit: Bitboard) -> Result<usize, EngineError> {
    match bit.lowest_index() {
        Some(index) if bit.is_single() => Ok(index),
        _ => Err(EngineError::NotSinglePiece(bit.count())),
    }
}

// ============================================================================
// GENERATION
// ============================================================================

/// Empty neighbours of a cell
#[inline]
pub fn step_moves(index: usize, occupied: Bitboard) -> Bitboard {
    TOPOLOGY.neighbors[index] & !occupied
}

/// Landing cells reachable from `index` with a single jump
#[inline]
pub fn jump_hops(index: usize, occupied: Bitboard) -> Bitboard {
    let over = TOPOLOGY.jump_over[index];
    let landings = TOPOLOGY.jump_landings[index];

    // bit k of each compact field refers to the k-th jump direction
    let occupied_over = occupied.extract(over);
    let occupied_landing = occupied.extract(landings);

    (occupied_over & !occupied_landing).deposit(landings)
}

/// Every cell reachable from `index` by a chain of one or more jumps
pub fn jump_moves(index: usize, occupied: Bitboard) -> Bitboard {
    let origin = Bitboard::from_index(index);
    let mut reached = jump_hops(index, occupied) & !origin;
    let mut frontier = reached;

    // `reached` only grows, so this runs at most CELL_COUNT rounds
    while !frontier.is_empty() {
        let mut next = Bitboard::EMPTY;
        for cell in frontier.indices() {
            next |= jump_hops(cell, occupied);
        }
        frontier = next & !reached & !origin;
        reached |= frontier;
    }

    reached
}

/// All destinations for the piece on `index`
#[inline]
pub fn moves_from(index: usize, occupied: Bitboard) -> Bitboard {
    step_moves(index, occupied) | jump_moves(index, occupied)
}

/// Destinations for a single-bit piece, validated
pub fn generate_moves(piece: Bitboard, occupied: Bitboard) -> Result<Bitboard, EngineError> {
    let index = single_index(piece)?;
    Ok(moves_from(index, occupied))
}

/// Every (piece, destination) pair for `pieces`, ordered by piece then
/// destination cell
pub fn all_moves(pieces: Bitboard, occupied: Bitboard) -> Vec<Move> {
    let mut moves = Vec::new();
    for from in pieces.indices() {
        for to in moves_from(from, occupied).indices() {
            moves.push(Move::new(from, to));
        }
    }
    moves
}

/// Number of legal moves for `pieces`
pub fn mobility(pieces: Bitboard, occupied: Bitboard) -> u32 {
    pieces
        .indices()
        .map(|from| moves_from(from, occupied).count())
        .sum()
}

/// Flip source and destination in both boards. Applying the same move twice
/// restores the input.
///
/// `source` and `dest` must each hold exactly one bit.
#[inline]
pub fn apply_move(
    source: Bitboard,
    dest: Bitboard,
    occupied: Bitboard,
    side: Bitboard,
) -> Result<(Bitboard, Bitboard), EngineError> {
    single_index(source)?;
    single_index(dest)?;
    let mask = source | dest;
    Ok((occupied ^ mask, side ^ mask))
}
