//! Bit accumulation over staged neighbor values and the keep rule.
//!
//! Each helper sets bits at the absolute rank of the neighbor, so masks built
//! from any partition of the ranks are identical.

use crate::grid::{PackedCharge, PeakStatus};
use crate::neighborhood::{NeighborMask, NeighborhoodTables};

/// Masks accumulated for one pivot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NeighborBits {
    /// Neighbors the pivot exceeds by more than epsilon.
    pub minima: NeighborMask,
    /// Neighbors with strictly more charge than the pivot.
    pub bigger: NeighborMask,
    /// Neighbors whose status carries the peak bit.
    pub peaks: NeighborMask,
}

/// Outcome of evaluating one pivot against its neighborhood.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NeighborEvaluation {
    pub minima: NeighborMask,
    pub bigger: NeighborMask,
    pub peaks_around: NeighborMask,
    /// Peaks that are also bigger than the pivot.
    pub competing: NeighborMask,
    pub keep: bool,
}

impl NeighborBits {
    /// Applies the keep rule.
    pub fn evaluate(&self, tables: &NeighborhoodTables) -> NeighborEvaluation {
        let competing = self.peaks & self.bigger;
        NeighborEvaluation {
            minima: self.minima,
            bigger: self.bigger,
            peaks_around: self.peaks,
            competing,
            keep: keep_peak(self.minima, competing, tables),
        }
    }
}

/// Compares one neighbor charge against the pivot charge `q`.
///
/// Equal charges set neither bit.
#[inline]
pub fn check_minimum(q: f32, epsilon: f32, other: f32, rank: usize, bits: &mut NeighborBits) {
    bits.minima.set_if(rank, q - other > epsilon);
    bits.bigger.set_if(rank, other > q);
}

/// Accumulates minima and bigger bits for `staged`, whose first value has rank `start_rank`.
#[inline]
pub fn accumulate_minima(
    q: f32,
    epsilon: f32,
    staged: &[PackedCharge],
    start_rank: usize,
    bits: &mut NeighborBits,
) {
    #[cfg(feature = "simd")]
    {
        accumulate_minima_simd(q, epsilon, staged, start_rank, bits);
    }
    #[cfg(not(feature = "simd"))]
    {
        accumulate_minima_scalar(q, epsilon, staged, start_rank, bits);
    }
}

pub(crate) fn accumulate_minima_scalar(
    q: f32,
    epsilon: f32,
    staged: &[PackedCharge],
    start_rank: usize,
    bits: &mut NeighborBits,
) {
    for (i, other) in staged.iter().enumerate() {
        check_minimum(q, epsilon, other.unpack(), start_rank + i, bits);
    }
}

#[cfg(feature = "simd")]
pub(crate) fn accumulate_minima_simd(
    q: f32,
    epsilon: f32,
    staged: &[PackedCharge],
    start_rank: usize,
    bits: &mut NeighborBits,
) {
    use wide::f32x8;

    const LANES: usize = 8;

    let q_vec = f32x8::splat(q);
    let eps_vec = f32x8::splat(epsilon);
    let chunks = staged.chunks_exact(LANES);
    let tail = chunks.remainder();
    let tail_start = start_rank + staged.len() - tail.len();

    for (c, chunk) in chunks.enumerate() {
        let mut values = [0.0f32; LANES];
        for (value, packed) in values.iter_mut().zip(chunk) {
            *value = packed.unpack();
        }
        let others = f32x8::from(values);
        let minima = (q_vec - others).simd_gt(eps_vec).to_bitmask() as u64;
        let bigger = others.simd_gt(q_vec).to_bitmask() as u64;

        let shift = start_rank + c * LANES;
        assert!(shift + LANES <= NeighborMask::CAPACITY, "rank out of mask range");
        bits.minima |= NeighborMask::from_bits(minima << shift);
        bits.bigger |= NeighborMask::from_bits(bigger << shift);
    }

    accumulate_minima_scalar(q, epsilon, tail, tail_start, bits);
}

/// Peak bits for `staged`, whose first value has rank `start_rank`.
#[inline]
pub fn accumulate_peaks(staged: &[PeakStatus], start_rank: usize) -> NeighborMask {
    let mut peaks = NeighborMask::EMPTY;
    for (i, status) in staged.iter().enumerate() {
        peaks.set_if(start_rank + i, status.is_peak());
    }
    peaks
}

/// Keeps the pivot iff every competing neighbor has a minimum between it and the pivot.
pub fn keep_peak(minima: NeighborMask, competing: NeighborMask, tables: &NeighborhoodTables) -> bool {
    competing
        .iter()
        .all(|rank| !(minima & tables.minima_mask(rank)).is_empty())
}
