//! Game state: both sides' pieces, whose turn it is and what has been played

use serde::{Deserialize, Serialize};

use crate::bitboard::Bitboard;
use crate::board::Side;
use crate::error::EngineError;
use crate::movegen::Move;
use crate::position::Position;

/// Game result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Ongoing,
    NorthWins,
    SouthWins,
}

impl GameResult {
    pub fn winner(self) -> Option<Side> {
        match self {
            GameResult::Ongoing => None,
            GameResult::NorthWins => Some(Side::North),
            GameResult::SouthWins => Some(Side::South),
        }
    }
}

/// A played turn; `None` when the side had no legal move and passed
pub type Turn = Option<Move>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    north: Bitboard,
    south: Bitboard,
    to_move: Side,
    /// Turns played so far, passes included
    pub ply: u32,
    history: Vec<Turn>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Both sides on their home triangles, North to move
    pub fn new() -> Self {
        Self {
            north: Side::North.home(),
            south: Side::South.home(),
            to_move: Side::North,
            ply: 0,
            history: Vec::new(),
        }
    }

    /// Arbitrary setup; the two piece sets must not overlap
    pub fn from_sides(north: Bitboard, south: Bitboard, to_move: Side) -> Result<Self, EngineError> {
        let overlap = north & south;
        if !overlap.is_empty() {
            return Err(EngineError::OverlappingSides(overlap.count()));
        }
        Ok(Self {
            north,
            south,
            to_move,
            ply: 0,
            history: Vec::new(),
        })
    }

    pub fn current_player(&self) -> Side {
        self.to_move
    }

    pub fn pieces(&self, side: Side) -> Bitboard {
        match side {
            Side::North => self.north,
            Side::South => self.south,
        }
    }

    pub fn occupied(&self) -> Bitboard {
        self.north | self.south
    }

    /// The position seen from the side to move
    pub fn position(&self) -> Position {
        let mover = self.pieces(self.to_move);
        let opponent = self.pieces(self.to_move.opponent());
        Position::from_disjoint(mover, opponent, self.to_move)
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.position().moves()
    }

    /// Play a move for the side to move
    pub fn apply_move(&self, mv: Move) -> Result<GameState, EngineError> {
        let next = self.position().play(mv)?;
        // after the move the old mover is the opponent
        let mut state = self.with_pieces(next.opponent());
        state.history.push(Some(mv));
        Ok(state)
    }

    /// Skip the turn of a side that has no legal move
    pub fn pass(&self) -> GameState {
        let mut state = self.with_pieces(self.pieces(self.to_move));
        state.history.push(None);
        state
    }

    /// Copy with the mover's pieces replaced and the turn handed over
    fn with_pieces(&self, mover_pieces: Bitboard) -> GameState {
        let mut state = self.clone();
        match self.to_move {
            Side::North => state.north = mover_pieces,
            Side::South => state.south = mover_pieces,
        }
        state.to_move = self.to_move.opponent();
        state.ply += 1;
        state
    }

    /// A side wins once every one of its pieces stands in its goal triangle
    pub fn result(&self) -> GameResult {
        let done = |side: Side| {
            let pieces = self.pieces(side);
            !pieces.is_empty() && pieces.is_subset(side.goal())
        };
        if done(Side::North) {
            GameResult::NorthWins
        } else if done(Side::South) {
            GameResult::SouthWins
        } else {
            GameResult::Ongoing
        }
    }

    pub fn is_over(&self) -> bool {
        self.result() != GameResult::Ongoing
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Pieces of `side` already in the goal triangle
    pub fn pieces_home(&self, side: Side) -> u32 {
        (self.pieces(side) & side.goal()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;

    #[test]
    fn test_new_game() {
        let game = GameState::new();
        assert_eq!(game.current_player(), Side::North);
        assert_eq!(game.occupied().count(), 20);
        assert_eq!(game.result(), GameResult::Ongoing);
        assert!(!game.legal_moves().is_empty());
    }

    #[test]
    fn test_turns_alternate() {
        let game = GameState::new();
        let mv = game.legal_moves()[0];
        let next = game.apply_move(mv).unwrap();

        assert_eq!(next.current_player(), Side::South);
        assert_eq!(next.ply, 1);
        assert!(next.pieces(Side::North).contains(mv.dest()));
        assert!(!next.pieces(Side::North).contains(mv.source()));
        assert_eq!(next.pieces(Side::South), Side::South.home());
        assert_eq!(next.history(), &[Some(mv)]);

        let reply = next.legal_moves()[0];
        let after = next.apply_move(reply).unwrap();
        assert_eq!(after.current_player(), Side::North);
        assert_eq!(after.pieces(Side::North), next.pieces(Side::North));
    }

    #[test]
    fn test_rejects_opponent_piece() {
        let game = GameState::new();
        let south_piece = Side::South.home().lowest_index().unwrap();
        let mv = Move::new(south_piece, Cell::new(0, 12).index());
        assert!(matches!(game.apply_move(mv), Err(EngineError::IllegalMove { .. })));
    }

    #[test]
    fn test_rejects_move_off_the_board() {
        let game = GameState::new();
        let result = game.apply_move(Move { from: 100, to: 40 });
        assert!(matches!(result, Err(EngineError::CellOutOfRange(100))));
        assert_eq!(game.ply, 0);
    }

    #[test]
    fn test_pass_hands_over_turn() {
        let game = GameState::new().pass();
        assert_eq!(game.current_player(), Side::South);
        assert_eq!(game.history(), &[None]);
        assert_eq!(game.pieces(Side::North), Side::North.home());
    }

    #[test]
    fn test_win_detection() {
        let game = GameState::from_sides(Side::South.home(), Bitboard::from_index(40), Side::South).unwrap();
        assert_eq!(game.result(), GameResult::NorthWins);
        assert_eq!(game.result().winner(), Some(Side::North));
        assert_eq!(game.pieces_home(Side::North), 10);

        let game = GameState::from_sides(Bitboard::from_index(40), Side::North.home(), Side::North).unwrap();
        assert_eq!(game.result(), GameResult::SouthWins);
    }

    #[test]
    fn test_from_sides_rejects_overlap() {
        let both = Bitboard::from_indices(&[40, 41]);
        assert!(GameState::from_sides(both, Bitboard::from_index(41), Side::North).is_err());
    }
}
