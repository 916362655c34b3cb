//! Cooperative neighborhood staging for batches of pivots.
//!
//! A batch of pivots is evaluated together. For each sub-range of neighbor
//! ranks, the values of every batch member are fetched once into a shared
//! scratch buffer laid out member-major (`member * width + i`), then every
//! member consumes its own slice. The scratch buffer is reused by the next
//! sub-range only after all members have consumed it; inside one batch worker
//! that ordering is plain program order.

use std::ops::Range;

use crate::grid::{Grid, GridPosition, PackedCharge, PeakStatus};
use crate::neighborhood::NeighborhoodTables;
use crate::util::{PeakSieveError, PeakSieveResult};

/// Partition of the neighbor ranks into staged sub-ranges.
///
/// The remainder comes first, then full chunks of `slots_per_lane` ranks:
/// 34 ranks staged 16 at a time give the sub-ranges `0..2`, `2..18`, `18..34`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagingPlan {
    slots_per_lane: usize,
    ranges: Vec<Range<usize>>,
}

impl StagingPlan {
    /// Builds a plan covering `0..neighbor_count`.
    pub fn new(neighbor_count: usize, slots_per_lane: usize) -> PeakSieveResult<Self> {
        if slots_per_lane == 0 {
            return Err(PeakSieveError::InvalidConfig {
                reason: "slots_per_lane must be positive",
            });
        }

        let mut ranges = Vec::with_capacity(neighbor_count.div_ceil(slots_per_lane));
        let head = neighbor_count % slots_per_lane;
        if head > 0 {
            ranges.push(0..head);
        }
        let mut start = head;
        while start < neighbor_count {
            ranges.push(start..start + slots_per_lane);
            start += slots_per_lane;
        }

        Ok(Self {
            slots_per_lane,
            ranges,
        })
    }

    /// Widest sub-range.
    pub fn slots_per_lane(&self) -> usize {
        self.slots_per_lane
    }

    /// Sub-ranges in staging order.
    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }
}

/// Per-batch scratch storage: broadcast pivots plus one staging buffer per value kind.
#[derive(Clone, Debug)]
pub struct BatchScratch {
    lanes: usize,
    pub(crate) positions: Vec<GridPosition>,
    pub(crate) charges: Vec<PackedCharge>,
    pub(crate) status: Vec<PeakStatus>,
}

impl BatchScratch {
    /// Allocates scratch for `batch_size` lanes of `slots_per_lane` values.
    pub fn new(batch_size: usize, slots_per_lane: usize) -> Self {
        let slots = batch_size * slots_per_lane;
        Self {
            lanes: batch_size,
            positions: Vec::with_capacity(batch_size),
            charges: vec![PackedCharge::default(); slots],
            status: vec![PeakStatus::default(); slots],
        }
    }

    /// Number of lanes.
    pub fn lanes(&self) -> usize {
        self.lanes
    }

    /// Broadcasts the batch pivots to every lane.
    ///
    /// Lanes past the end of `batch` repeat its last pivot so every lane
    /// stages a valid window; their results must be discarded. Returns the
    /// number of real lanes.
    pub fn broadcast(&mut self, batch: &[GridPosition]) -> usize {
        let lanes = self.lanes();
        self.positions.clear();
        let Some(&last) = batch.last() else {
            return 0;
        };
        let real = batch.len().min(lanes);
        self.positions.extend_from_slice(&batch[..real]);
        self.positions.resize(lanes, last);
        real
    }

    /// Pivots of the current batch, padding lanes included.
    pub fn positions(&self) -> &[GridPosition] {
        &self.positions
    }
}

/// Stages `range` of the neighbor table for every pivot into `out`.
///
/// `out` receives `range.len()` values per pivot, member-major. Every pivot
/// must already be validated against the grid padding.
pub fn stage<T: Copy + Default>(
    grid: &Grid<T>,
    positions: &[GridPosition],
    range: Range<usize>,
    tables: &NeighborhoodTables,
    out: &mut [T],
) {
    let offsets = &tables.offsets()[range];
    let width = offsets.len();
    for (member, &pos) in positions.iter().enumerate() {
        let lane = &mut out[member * width..(member + 1) * width];
        for (slot, &offset) in lane.iter_mut().zip(offsets) {
            *slot = grid.neighbor_in_window(pos, offset);
        }
    }
}

/// Returns the values staged for `member` when `width` values were staged per lane.
#[inline]
pub fn lane_slice<T>(staged: &[T], member: usize, width: usize) -> &[T] {
    &staged[member * width..(member + 1) * width]
}
