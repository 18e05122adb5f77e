//! Position evaluation

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::bitboard::Bitboard;
use crate::board::{Side, MAX_ROW, ROW_COUNT, TOPOLOGY};
use crate::error::EngineError;

/// Default number of memoised positions per search
pub const DEFAULT_CACHE_CAPACITY: usize = 100_000;

/// Heuristic weights for position evaluation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    /// Value of a piece standing in one of the deepest goal rows
    pub goal_weight: i32,
    /// How many rows at the far tip count as the goal
    pub goal_rows: u8,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            goal_weight: 50,
            goal_rows: 3,
        }
    }
}

impl Heuristics {
    /// Reject goal zones larger than the board
    pub fn validate(&self) -> Result<(), EngineError> {
        if usize::from(self.goal_rows) > ROW_COUNT {
            return Err(EngineError::InvalidGoalRows(self.goal_rows, ROW_COUNT));
        }
        Ok(())
    }

    /// Weight of one piece of `side` standing in `row`
    #[inline]
    pub fn row_weight(&self, side: Side, row: i8) -> i32 {
        let progress = side.progress(row) as i32;
        if progress > MAX_ROW as i32 - self.goal_rows as i32 {
            self.goal_weight
        } else {
            progress
        }
    }
}

/// Score `mover` against `opponent`, higher is better for the mover.
///
/// Each piece is worth the number of rows it has advanced toward its goal
/// tip, or `goal_weight` once it sits in the goal rows. Only the two
/// bitboards and the mover's side enter the score.
pub fn evaluate(mover: Bitboard, opponent: Bitboard, mover_side: Side, heuristics: &Heuristics) -> i32 {
    let opponent_side = mover_side.opponent();
    let mut mover_score = 0;
    let mut opponent_score = 0;

    for (row, mask) in TOPOLOGY.row_masks.iter().enumerate() {
        let row = row as i8;
        let mover_count = (mover & *mask).count() as i32;
        let opponent_count = (opponent & *mask).count() as i32;

        if mover_count > 0 {
            mover_score += mover_count * heuristics.row_weight(mover_side, row);
        }
        if opponent_count > 0 {
            opponent_score += opponent_count * heuristics.row_weight(opponent_side, row);
        }
    }

    mover_score - opponent_score
}

/// Memoising evaluator bound to one side and one set of weights.
///
/// The cache is keyed on `(mover, opponent)` alone. That is sound because the
/// side and heuristics are fixed for the evaluator's lifetime and the search
/// always scores leaves from the root mover's point of view. Each search
/// worker owns its own evaluator.
#[derive(Clone, Debug)]
pub struct Evaluator {
    side: Side,
    heuristics: Heuristics,
    cache: FxHashMap<(Bitboard, Bitboard), i32>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl Evaluator {
    pub fn new(side: Side, heuristics: Heuristics, capacity: usize) -> Self {
        Self {
            side,
            heuristics,
            cache: FxHashMap::default(),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn heuristics(&self) -> &Heuristics {
        &self.heuristics
    }

    /// Evaluate, consulting the cache first
    pub fn evaluate(&mut self, mover: Bitboard, opponent: Bitboard) -> i32 {
        if self.capacity == 0 {
            self.misses += 1;
            return evaluate(mover, opponent, self.side, &self.heuristics);
        }

        if let Some(&score) = self.cache.get(&(mover, opponent)) {
            self.hits += 1;
            return score;
        }

        self.misses += 1;
        let score = evaluate(mover, opponent, self.side, &self.heuristics);
        if self.cache.len() >= self.capacity {
            self.cache.clear();
        }
        self.cache.insert((mover, opponent), score);
        score
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
