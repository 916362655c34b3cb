//! Suppression neighborhood: offset table and minima masks.
//!
//! The neighborhood is the `(2 * pad_radius + 1) x (2 * time_radius + 1)`
//! window around a pivot, pivot excluded, enumerated row-major (pad offset
//! outer, time offset inner). The position of an offset in that order is its
//! rank, and rank `n` owns bit `n` of every [`NeighborMask`].
//!
//! For each rank the tables also hold the set of ranks lying between that
//! neighbor and the pivot: the cells of the discretised straight line from
//! the pivot to the neighbor, endpoints excluded. With the default 2 x 3
//! radii those cells form the inner 3 x 5 ring; the outer ring never
//! separates anything.

mod mask;

pub use mask::{NeighborMask, Ranks};

use crate::util::math::{chebyshev_len, div_round_half_away};
use crate::util::{PeakSieveError, PeakSieveResult};

/// Relative offset of a neighbor from the pivot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NeighborOffset {
    /// Offset along the pad axis.
    pub dpad: i16,
    /// Offset along the time axis.
    pub dtime: i16,
}

impl NeighborOffset {
    pub const fn new(dpad: i16, dtime: i16) -> Self {
        Self { dpad, dtime }
    }
}

/// Radii of the suppression window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NeighborhoodGeometry {
    /// Half-width along the pad axis.
    pub pad_radius: u8,
    /// Half-width along the time axis.
    pub time_radius: u8,
}

impl Default for NeighborhoodGeometry {
    fn default() -> Self {
        Self {
            pad_radius: 2,
            time_radius: 3,
        }
    }
}

impl NeighborhoodGeometry {
    /// Number of neighbor ranks, pivot excluded.
    pub fn neighbor_count(&self) -> usize {
        let pads = 2 * self.pad_radius as usize + 1;
        let times = 2 * self.time_radius as usize + 1;
        pads * times - 1
    }

    fn validate(&self) -> PeakSieveResult<()> {
        if self.pad_radius == 0 || self.time_radius == 0 {
            return Err(PeakSieveError::InvalidGeometry {
                reason: "radii must be positive",
            });
        }
        if self.neighbor_count() > NeighborMask::CAPACITY {
            return Err(PeakSieveError::InvalidGeometry {
                reason: "neighborhood exceeds 64 ranks",
            });
        }
        Ok(())
    }

    /// Rank of `(dpad, dtime)`, or `None` for the pivot and cells outside the window.
    pub fn rank_of(&self, dpad: i32, dtime: i32) -> Option<usize> {
        let pr = self.pad_radius as i32;
        let tr = self.time_radius as i32;
        if dpad.abs() > pr || dtime.abs() > tr || (dpad == 0 && dtime == 0) {
            return None;
        }
        let width = 2 * tr + 1;
        let full = ((dpad + pr) * width + dtime + tr) as usize;
        let center = (pr * width + tr) as usize;
        Some(if full > center { full - 1 } else { full })
    }
}

/// Offset table and per-rank minima masks for one geometry.
#[derive(Clone, Debug)]
pub struct NeighborhoodTables {
    geometry: NeighborhoodGeometry,
    offsets: Vec<NeighborOffset>,
    minima: Vec<NeighborMask>,
}

impl NeighborhoodTables {
    /// Builds the tables for `geometry`.
    pub fn build(geometry: NeighborhoodGeometry) -> PeakSieveResult<Self> {
        geometry.validate()?;

        let pr = geometry.pad_radius as i32;
        let tr = geometry.time_radius as i32;
        let count = geometry.neighbor_count();

        let mut offsets = Vec::with_capacity(count);
        for dpad in -pr..=pr {
            for dtime in -tr..=tr {
                if dpad == 0 && dtime == 0 {
                    continue;
                }
                offsets.push(NeighborOffset::new(dpad as i16, dtime as i16));
            }
        }

        let minima = offsets
            .iter()
            .map(|offset| between_mask(&geometry, *offset))
            .collect();

        Ok(Self {
            geometry,
            offsets,
            minima,
        })
    }

    pub fn geometry(&self) -> NeighborhoodGeometry {
        self.geometry
    }

    /// Number of neighbor ranks.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Offsets in rank order.
    pub fn offsets(&self) -> &[NeighborOffset] {
        &self.offsets
    }

    /// Minima masks in rank order.
    pub fn minima_masks(&self) -> &[NeighborMask] {
        &self.minima
    }

    /// Ranks lying between neighbor `rank` and the pivot.
    pub fn minima_mask(&self, rank: usize) -> NeighborMask {
        self.minima[rank]
    }

    /// All ranks.
    pub fn full_mask(&self) -> NeighborMask {
        NeighborMask::from_ranks(0..self.len())
    }

    /// Ranks that separate at least one other neighbor from the pivot.
    pub fn separators(&self) -> NeighborMask {
        self.minima
            .iter()
            .fold(NeighborMask::EMPTY, |acc, mask| acc | *mask)
    }
}

fn between_mask(geometry: &NeighborhoodGeometry, offset: NeighborOffset) -> NeighborMask {
    let dpad = offset.dpad as i32;
    let dtime = offset.dtime as i32;
    let steps = chebyshev_len(dpad, dtime);

    let mut mask = NeighborMask::EMPTY;
    for k in 1..steps {
        let p = div_round_half_away(dpad * k, steps);
        let t = div_round_half_away(dtime * k, steps);
        if let Some(rank) = geometry.rank_of(p, t) {
            mask.insert(rank);
        }
    }
    mask
}
