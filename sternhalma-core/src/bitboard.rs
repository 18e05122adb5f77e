//! Two-word bitboard covering the 81-cell star board
//!
//! Cell `i` is bit `i`: cells 0..64 live in the low word, cells 64..81 in the
//! low 17 bits of the high word. The high word never carries bits above the
//! board width; every constructor masks it.

use std::fmt;
use std::ops::{
    BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not, Shl, Shr,
};

use crate::error::EngineError;

/// Number of cells on the board
pub const CELL_COUNT: usize = 81;

/// Valid bits of the high word (cells 64..81)
const HI_MASK: u64 = (1 << (CELL_COUNT - 64)) - 1;

/// Fixed-width 81-bit set, one bit per board cell
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Bitboard {
    hi: u64,
    lo: u64,
}

impl Bitboard {
    pub const EMPTY: Self = Self { lo: 0, hi: 0 };
    pub const FULL: Self = Self { lo: u64::MAX, hi: HI_MASK };

    /// Build from raw words; bits above the board width are dropped
    pub(crate) const fn new(lo: u64, hi: u64) -> Self {
        Self { lo, hi: hi & HI_MASK }
    }

    /// Single-bit board for a cell index
    pub const fn from_index(index: usize) -> Self {
        debug_assert!(index < CELL_COUNT);
        if index < 64 {
            Self { lo: 1 << index, hi: 0 }
        } else {
            Self { lo: 0, hi: (1 << (index - 64)) & HI_MASK }
        }
    }

    /// Build from a 128-bit literal known to fit the board. Outside the
    /// crate use `Bitboard::try_from`, which rejects stray bits.
    pub(crate) const fn from_u128(bits: u128) -> Self {
        debug_assert!(bits >> CELL_COUNT == 0);
        Self::new(bits as u64, (bits >> 64) as u64)
    }

    pub const fn to_u128(self) -> u128 {
        (self.lo as u128) | ((self.hi as u128) << 64)
    }

    /// Single-cell board, checked
    pub fn try_from_index(index: usize) -> Result<Self, EngineError> {
        if index < CELL_COUNT {
            Ok(Self::from_index(index))
        } else {
            Err(EngineError::CellOutOfRange(index))
        }
    }

    pub fn from_indices(indices: &[usize]) -> Self {
        indices.iter().copied().collect()
    }

    pub const fn lo(self) -> u64 {
        self.lo
    }

    pub const fn hi(self) -> u64 {
        self.hi
    }

    /// Const-context `|`
    pub const fn union(self, other: Self) -> Self {
        Self { lo: self.lo | other.lo, hi: self.hi | other.hi }
    }

    /// Const-context `&`
    pub const fn intersection(self, other: Self) -> Self {
        Self { lo: self.lo & other.lo, hi: self.hi & other.hi }
    }

    pub const fn is_empty(self) -> bool {
        self.lo == 0 && self.hi == 0
    }

    /// Population count
    pub const fn count(self) -> u32 {
        self.lo.count_ones() + self.hi.count_ones()
    }

    pub const fn is_single(self) -> bool {
        self.count() == 1
    }

    pub const fn contains(self, index: usize) -> bool {
        !self.intersection(Self::from_index(index)).is_empty()
    }

    /// True when every bit of `self` is also set in `other`
    pub const fn is_subset(self, other: Self) -> bool {
        self.lo & !other.lo == 0 && self.hi & !other.hi == 0
    }

    pub fn lowest_index(self) -> Option<usize> {
        if self.lo != 0 {
            Some(self.lo.trailing_zeros() as usize)
        } else if self.hi != 0 {
            Some(64 + self.hi.trailing_zeros() as usize)
        } else {
            None
        }
    }

    pub fn highest_index(self) -> Option<usize> {
        if self.hi != 0 {
            Some(127 - self.hi.leading_zeros() as usize)
        } else if self.lo != 0 {
            Some(63 - self.lo.leading_zeros() as usize)
        } else {
            None
        }
    }

    /// Isolate the lowest set bit (empty stays empty)
    pub fn lowest_bit(self) -> Self {
        if self.lo != 0 {
            Self { lo: self.lo & self.lo.wrapping_neg(), hi: 0 }
        } else {
            Self { lo: 0, hi: self.hi & self.hi.wrapping_neg() }
        }
    }

    /// Isolate the highest set bit (empty stays empty)
    pub fn highest_bit(self) -> Self {
        self.highest_index().map_or(Self::EMPTY, Self::from_index)
    }

    /// Remove and return the lowest set bit
    pub fn pop_lowest(&mut self) -> Option<Self> {
        if self.is_empty() {
            return None;
        }
        let bit = self.lowest_bit();
        *self ^= bit;
        Some(bit)
    }

    /// Single-bit boards in ascending cell order
    pub fn iter(self) -> Bits {
        Bits(self)
    }

    /// Set cell indices in ascending order
    pub fn indices(self) -> Indices {
        Indices(self)
    }

    /// Gather the bits of `self` selected by `mask` into the low
    /// `mask.count()` bits, in ascending mask order.
    ///
    /// Each word is compacted on its own; the high word's result is then
    /// shifted up by the popcount of the low mask word so the two halves
    /// line up.
    pub fn extract(self, mask: Bitboard) -> Bitboard {
        debug_assert!(mask.hi & !HI_MASK == 0, "mask wider than the board");
        let low = pext_u64(self.lo, mask.lo);
        let high = pext_u64(self.hi, mask.hi);
        Bitboard::new(low, 0) | (Bitboard::new(high, 0) << mask.lo.count_ones())
    }

    /// Scatter the low `mask.count()` bits of `self` onto the positions set
    /// in `mask`. Inverse of [`Bitboard::extract`].
    pub fn deposit(self, mask: Bitboard) -> Bitboard {
        debug_assert!(mask.hi & !HI_MASK == 0, "mask wider than the board");
        let split = mask.lo.count_ones();
        let low = pdep_u64(self.lo, mask.lo);
        let high = pdep_u64((self >> split).lo, mask.hi);
        Bitboard::new(low, high)
    }
}

impl TryFrom<u128> for Bitboard {
    type Error = EngineError;

    fn try_from(bits: u128) -> Result<Self, Self::Error> {
        let outside = bits >> CELL_COUNT;
        if outside != 0 {
            return Err(EngineError::OutsideBoard(bits));
        }
        Ok(Self::from_u128(bits))
    }
}

impl FromIterator<usize> for Bitboard {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Bitboard::EMPTY, |acc, index| acc | Bitboard::from_index(index))
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitboard({:#023x})", self.to_u128())
    }
}

impl fmt::Binary for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:081b}", self.to_u128())
    }
}

impl fmt::LowerHex for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.to_u128(), f)
    }
}

// ============================================================================
// OPERATORS
// ============================================================================

impl BitAnd for Bitboard {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(rhs)
    }
}

impl BitOr for Bitboard {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitXor for Bitboard {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self::Output {
        Self { lo: self.lo ^ rhs.lo, hi: self.hi ^ rhs.hi }
    }
}

impl Not for Bitboard {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::new(!self.lo, !self.hi)
    }
}

impl BitAndAssign for Bitboard {
    fn bitand_assign(&mut self, rhs: Self) {
        *self = *self & rhs;
    }
}

impl BitOrAssign for Bitboard {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

impl BitXorAssign for Bitboard {
    fn bitxor_assign(&mut self, rhs: Self) {
        *self = *self ^ rhs;
    }
}

/// Shift toward higher cells, carrying across the word boundary. Bits pushed
/// past cell 80 are lost.
impl Shl<u32> for Bitboard {
    type Output = Self;

    fn shl(self, n: u32) -> Self::Output {
        match n {
            0 => self,
            1..=63 => Self::new(self.lo << n, (self.hi << n) | (self.lo >> (64 - n))),
            64..=127 => Self::new(0, self.lo << (n - 64)),
            _ => Self::EMPTY,
        }
    }
}

/// Shift toward lower cells, carrying across the word boundary.
impl Shr<u32> for Bitboard {
    type Output = Self;

    fn shr(self, n: u32) -> Self::Output {
        match n {
            0 => self,
            1..=63 => Self::new((self.lo >> n) | (self.hi << (64 - n)), self.hi >> n),
            64..=127 => Self::new(self.hi >> (n - 64), 0),
            _ => Self::EMPTY,
        }
    }
}

// ============================================================================
// ITERATORS
// ============================================================================

/// Iterator over single-bit boards, lowest cell first
#[derive(Clone, Debug)]
pub struct Bits(Bitboard);

impl Iterator for Bits {
    type Item = Bitboard;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.pop_lowest()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Bits {}

/// Iterator over set cell indices, lowest first
#[derive(Clone, Debug)]
pub struct Indices(Bitboard);

impl Iterator for Indices {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.0.lowest_index()?;
        self.0 ^= Bitboard::from_index(index);
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Indices {}

impl IntoIterator for Bitboard {
    type Item = Bitboard;
    type IntoIter = Bits;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// 64-BIT EXTRACT / DEPOSIT
// ============================================================================

#[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
#[inline(always)]
#[allow(unused_unsafe)]
fn pext_u64(source: u64, mask: u64) -> u64 {
    // SAFETY: bmi2 is statically enabled for this target.
    unsafe { core::arch::x86_64::_pext_u64(source, mask) }
}

#[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
#[inline(always)]
#[allow(unused_unsafe)]
fn pdep_u64(source: u64, mask: u64) -> u64 {
    // SAFETY: bmi2 is statically enabled for this target.
    unsafe { core::arch::x86_64::_pdep_u64(source, mask) }
}

#[cfg(not(all(target_arch = "x86_64", target_feature = "bmi2")))]
#[inline(always)]
fn pext_u64(source: u64, mask: u64) -> u64 {
    pext_portable(source, mask)
}

#[cfg(not(all(target_arch = "x86_64", target_feature = "bmi2")))]
#[inline(always)]
fn pdep_u64(source: u64, mask: u64) -> u64 {
    pdep_portable(source, mask)
}

#[cfg_attr(all(target_arch = "x86_64", target_feature = "bmi2"), allow(dead_code))]
fn pext_portable(source: u64, mut mask: u64) -> u64 {
    let mut result = 0;
    let mut out = 1u64;
    while mask != 0 {
        if source & mask & mask.wrapping_neg() != 0 {
            result |= out;
        }
        out <<= 1;
        mask &= mask - 1;
    }
    result
}

#[cfg_attr(all(target_arch = "x86_64", target_feature = "bmi2"), allow(dead_code))]
fn pdep_portable(mut source: u64, mut mask: u64) -> u64 {
    let mut result = 0;
    while mask != 0 {
        if source & 1 != 0 {
            result |= mask & mask.wrapping_neg();
        }
        source >>= 1;
        mask &= mask - 1;
    }
    result
}
