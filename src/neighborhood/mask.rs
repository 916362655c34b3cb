//! Bounded set of neighbor ranks.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Set of neighbor ranks backed by one `u64`.
///
/// Bit `n` stands for rank `n` of the neighbor offset table, whichever
/// staged sub-range produced it.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NeighborMask(u64);

impl NeighborMask {
    /// Number of ranks a mask can address.
    pub const CAPACITY: usize = u64::BITS as usize;

    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Wraps raw bits.
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Builds a mask from ranks.
    ///
    /// Panics if a rank is `>= CAPACITY`.
    pub fn from_ranks<I: IntoIterator<Item = usize>>(ranks: I) -> Self {
        ranks.into_iter().fold(Self::EMPTY, Self::with)
    }

    /// Returns a copy with `rank` set.
    #[inline]
    pub fn with(self, rank: usize) -> Self {
        assert!(rank < Self::CAPACITY, "rank {rank} exceeds mask capacity");
        Self(self.0 | (1u64 << rank))
    }

    /// Sets `rank` when `value` is true.
    #[inline]
    pub fn set_if(&mut self, rank: usize, value: bool) {
        assert!(rank < Self::CAPACITY, "rank {rank} exceeds mask capacity");
        self.0 |= (value as u64) << rank;
    }

    /// Sets `rank`.
    #[inline]
    pub fn insert(&mut self, rank: usize) {
        *self = self.with(rank);
    }

    /// Whether `rank` is set.
    #[inline]
    pub fn contains(self, rank: usize) -> bool {
        rank < Self::CAPACITY && self.0 & (1u64 << rank) != 0
    }

    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of ranks in the set.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates set ranks in ascending order.
    pub fn iter(self) -> Ranks {
        Ranks(self.0)
    }
}

impl BitOr for NeighborMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for NeighborMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for NeighborMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

impl fmt::Debug for NeighborMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl IntoIterator for NeighborMask {
    type Item = usize;
    type IntoIter = Ranks;

    fn into_iter(self) -> Ranks {
        self.iter()
    }
}

/// Ascending iterator over the ranks of a [`NeighborMask`].
#[derive(Clone, Debug)]
pub struct Ranks(u64);

impl Iterator for Ranks {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let rank = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(rank)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}
