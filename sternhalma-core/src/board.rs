//! Star-board geometry with doubled axial coordinates
//!
//! The two-player board is a diamond of 17 rows: row `r` holds the cells
//! `q = -w, -w + 2, ..., w` where `w = min(r, 16 - r)`. Horizontal neighbours
//! sit two columns apart, diagonal neighbours one column and one row apart.
//! Cells are numbered row by row, left to right, so cell 0 is the northern
//! tip and cell 80 the southern tip.

use serde::{Deserialize, Serialize};

use crate::bitboard::{Bitboard, CELL_COUNT};

/// Hex layers from a tip to the widest row
pub const LAYERS: i8 = 9;

/// Rows each player starts in
pub const HOME_LAYERS: i8 = 4;

/// Index of the last row
pub const MAX_ROW: i8 = 2 * (LAYERS - 1);

/// Number of rows
pub const ROW_COUNT: usize = MAX_ROW as usize + 1;

/// Pieces per player
pub const PIECES_PER_SIDE: u32 = 10;

/// Neighbour offsets (dq, dr), sorted by (dr, dq).
///
/// The ordering matches cell numbering, so for every cell the neighbours and
/// their jump landings appear in the same relative bit order.
pub const DIRECTIONS: [(i8, i8); 6] = [
    (-1, -1), // NW
    (1, -1),  // NE
    (-2, 0),  // W
    (2, 0),   // E
    (-1, 1),  // SW
    (1, 1),   // SE
];

/// Doubled axial coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub q: i8,
    pub r: i8,
}

impl Cell {
    pub const fn new(q: i8, r: i8) -> Self {
        Self { q, r }
    }

    /// Check if this cell is on the board
    pub const fn is_valid(&self) -> bool {
        if self.r < 0 || self.r > MAX_ROW {
            return false;
        }
        (self.q - self.r) % 2 == 0 && self.q.abs() <= half_width(self.r)
    }

    /// Cell index (bit position); the cell must be valid
    pub const fn index(&self) -> usize {
        debug_assert!(self.is_valid());
        row_start(self.r) + ((self.q + half_width(self.r)) / 2) as usize
    }

    /// Cell for an index in `0..CELL_COUNT`
    pub const fn from_index(index: usize) -> Self {
        debug_assert!(index < CELL_COUNT);
        let mut r = 0;
        let mut start = 0;
        while start + row_len(r) <= index {
            start += row_len(r);
            r += 1;
        }
        let offset = (index - start) as i8;
        Self::new(2 * offset - half_width(r), r)
    }

    /// Get neighbor in direction (0-5); may be off the board
    pub const fn neighbor(&self, direction: usize) -> Cell {
        let (dq, dr) = DIRECTIONS[direction % 6];
        Cell::new(self.q + dq, self.r + dr)
    }
}

/// Largest |q| in row `r`
const fn half_width(r: i8) -> i8 {
    if r <= MAX_ROW / 2 {
        r
    } else {
        MAX_ROW - r
    }
}

const fn row_len(r: i8) -> usize {
    half_width(r) as usize + 1
}

const fn row_start(r: i8) -> usize {
    let mut start = 0;
    let mut row = 0;
    while row < r {
        start += row_len(row);
        row += 1;
    }
    start
}

/// The two players. North starts on the top tip and races south; South the
/// reverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    North = 0,
    South = 1,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::North => Side::South,
            Side::South => Side::North,
        }
    }

    /// Starting triangle
    pub fn home(self) -> Bitboard {
        TOPOLOGY.homes[self as usize]
    }

    /// Target triangle (the opponent's home)
    pub fn goal(self) -> Bitboard {
        self.opponent().home()
    }

    /// Rows already travelled from the far edge, 0..=MAX_ROW
    pub const fn progress(self, row: i8) -> i8 {
        match self {
            Side::North => row,
            Side::South => MAX_ROW - row,
        }
    }
}

/// Precomputed lookup tables, one entry per cell
pub struct Topology {
    /// Adjacent cells
    pub neighbors: [Bitboard; CELL_COUNT],
    /// Adjacent cells that have a landing cell behind them
    pub jump_over: [Bitboard; CELL_COUNT],
    /// Landing cells: each `jump_over` neighbour reflected through it
    pub jump_landings: [Bitboard; CELL_COUNT],
    /// Cells of each row
    pub row_masks: [Bitboard; ROW_COUNT],
    /// Starting triangles, indexed by `Side`
    pub homes: [Bitboard; 2],
}

impl Topology {
    /// Build every table from the board layout
    pub const fn build() -> Self {
        let mut neighbors = [Bitboard::EMPTY; CELL_COUNT];
        let mut jump_over = [Bitboard::EMPTY; CELL_COUNT];
        let mut jump_landings = [Bitboard::EMPTY; CELL_COUNT];
        let mut row_masks = [Bitboard::EMPTY; ROW_COUNT];
        let mut homes = [Bitboard::EMPTY; 2];

        let mut index = 0;
        while index < CELL_COUNT {
            let cell = Cell::from_index(index);
            let bit = Bitboard::from_index(index);

            let mut direction = 0;
            while direction < DIRECTIONS.len() {
                let over = cell.neighbor(direction);
                if over.is_valid() {
                    let over_bit = Bitboard::from_index(over.index());
                    neighbors[index] = neighbors[index].union(over_bit);

                    let landing = over.neighbor(direction);
                    if landing.is_valid() {
                        jump_over[index] = jump_over[index].union(over_bit);
                        jump_landings[index] =
                            jump_landings[index].union(Bitboard::from_index(landing.index()));
                    }
                }
                direction += 1;
            }

            let row = cell.r as usize;
            row_masks[row] = row_masks[row].union(bit);
            if cell.r < HOME_LAYERS {
                homes[Side::North as usize] = homes[Side::North as usize].union(bit);
            }
            if cell.r > MAX_ROW - HOME_LAYERS {
                homes[Side::South as usize] = homes[Side::South as usize].union(bit);
            }

            index += 1;
        }

        Self {
            neighbors,
            jump_over,
            jump_landings,
            row_masks,
            homes,
        }
    }
}

/// Board tables, built at compile time
pub static TOPOLOGY: Topology = Topology::build();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_validity() {
        assert!(Cell::new(0, 0).is_valid());
        assert!(Cell::new(-8, 8).is_valid());
        assert!(Cell::new(8, 8).is_valid());
        assert!(Cell::new(0, 16).is_valid());
        assert!(!Cell::new(1, 0).is_valid()); // parity
        assert!(!Cell::new(2, 0).is_valid()); // outside the tip
        assert!(!Cell::new(-8, 10).is_valid());
        assert!(!Cell::new(0, 17).is_valid());
        assert!(!Cell::new(0, -2).is_valid());
    }

    #[test]
    fn test_index_roundtrip_covers_board() {
        let mut count = 0;
        for r in 0..=MAX_ROW {
            for q in -MAX_ROW..=MAX_ROW {
                let cell = Cell::new(q, r);
                if cell.is_valid() {
                    assert_eq!(Cell::from_index(cell.index()), cell);
                    count += 1;
                }
            }
        }
        assert_eq!(count, CELL_COUNT);
        assert_eq!(Cell::new(0, 0).index(), 0);
        assert_eq!(Cell::new(-8, 8).index(), 36);
        assert_eq!(Cell::new(-7, 9).index(), 45);
        assert_eq!(Cell::new(0, 16).index(), 80);
    }

    #[test]
    fn test_homes() {
        let north = Side::North.home();
        let south = Side::South.home();
        assert_eq!(north.count(), PIECES_PER_SIDE);
        assert_eq!(south.count(), PIECES_PER_SIDE);
        assert_eq!(north, Bitboard::from_u128((1 << 10) - 1));
        assert_eq!(south, Bitboard::from_u128(((1 << 10) - 1) << 71));
        assert_eq!(Side::North.goal(), south);
    }

    #[test]
    fn test_neighbors_symmetric() {
        for i in 0..CELL_COUNT {
            assert!(!TOPOLOGY.neighbors[i].contains(i));
            for j in TOPOLOGY.neighbors[i].indices() {
                assert!(TOPOLOGY.neighbors[j].contains(i), "{} ~ {}", i, j);
            }
        }
        // tip has two neighbours, a centre cell six
        assert_eq!(TOPOLOGY.neighbors[0], Bitboard::from_indices(&[1, 2]));
        assert_eq!(TOPOLOGY.neighbors[40].count(), 6);
    }

    #[test]
    fn test_jump_tables_aligned() {
        for i in 0..CELL_COUNT {
            let over = TOPOLOGY.jump_over[i];
            let landings = TOPOLOGY.jump_landings[i];
            assert!(over.is_subset(TOPOLOGY.neighbors[i]));
            assert_eq!(over.count(), landings.count());

            // k-th neighbour in bit order pairs with the k-th landing
            let origin = Cell::from_index(i);
            for (o, l) in over.indices().zip(landings.indices()) {
                let o = Cell::from_index(o);
                let l = Cell::from_index(l);
                assert_eq!(l.q - o.q, o.q - origin.q);
                assert_eq!(l.r - o.r, o.r - origin.r);
            }
        }
    }

    #[test]
    fn test_row_masks_partition_board() {
        let mut all = Bitboard::EMPTY;
        for (row, mask) in TOPOLOGY.row_masks.iter().enumerate() {
            assert!((all & *mask).is_empty());
            assert_eq!(mask.count() as usize, row.min(ROW_COUNT - 1 - row) + 1);
            all |= *mask;
        }
        assert_eq!(all, Bitboard::FULL);
    }
}
