//! Padded charge and status grids.
//!
//! A grid covers `rows` detector rows, each `pads` wide and `times` samples
//! deep. Every row carries a border of `pad_padding` cells on both sides of
//! the pad axis and `time_padding` cells on both sides of the time axis, so
//! neighborhood lookups around any valid position stay inside the buffer
//! without bounds checks in the hot loop. Padding cells never alias cells of
//! another row.

use crate::neighborhood::{NeighborOffset, NeighborhoodGeometry};
use crate::util::{PeakSieveError, PeakSieveResult};

mod charge;
mod status;

pub use charge::PackedCharge;
pub use status::PeakStatus;

/// Position of one detector cell in unpadded grid coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPosition {
    /// Detector row.
    pub row: u16,
    /// Pad within the row.
    pub pad: u16,
    /// Time bin.
    pub time: u16,
}

impl GridPosition {
    /// Creates a position.
    pub const fn new(row: u16, pad: u16, time: u16) -> Self {
        Self { row, pad, time }
    }
}

/// Logical size of a grid and its padding border.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridExtent {
    rows: usize,
    pads: usize,
    times: usize,
    pad_padding: usize,
    time_padding: usize,
}

impl GridExtent {
    /// Creates an extent; all logical dimensions must be non-zero.
    pub fn new(
        rows: usize,
        pads: usize,
        times: usize,
        pad_padding: usize,
        time_padding: usize,
    ) -> PeakSieveResult<Self> {
        let extent = Self {
            rows,
            pads,
            times,
            pad_padding,
            time_padding,
        };
        if rows == 0 || pads == 0 || times == 0 {
            return Err(extent.invalid());
        }
        if rows > u16::MAX as usize + 1 || pads > u16::MAX as usize + 1 || times > u16::MAX as usize + 1
        {
            return Err(extent.invalid());
        }
        extent.cell_count()?;
        Ok(extent)
    }

    /// Extent padded just enough for `geometry`.
    pub fn for_geometry(
        rows: usize,
        pads: usize,
        times: usize,
        geometry: NeighborhoodGeometry,
    ) -> PeakSieveResult<Self> {
        Self::new(
            rows,
            pads,
            times,
            geometry.pad_radius as usize,
            geometry.time_radius as usize,
        )
    }

    fn invalid(&self) -> PeakSieveError {
        PeakSieveError::InvalidDimensions {
            rows: self.rows,
            pads: self.pads,
            times: self.times,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn pads(&self) -> usize {
        self.pads
    }

    pub fn times(&self) -> usize {
        self.times
    }

    pub fn pad_padding(&self) -> usize {
        self.pad_padding
    }

    pub fn time_padding(&self) -> usize {
        self.time_padding
    }

    /// Pads per row including both borders.
    pub fn padded_pads(&self) -> usize {
        self.pads + 2 * self.pad_padding
    }

    /// Time bins per pad including both borders.
    pub fn padded_times(&self) -> usize {
        self.times + 2 * self.time_padding
    }

    /// Number of cells in the backing buffer.
    pub fn cell_count(&self) -> PeakSieveResult<usize> {
        self.rows
            .checked_mul(self.padded_pads())
            .and_then(|v| v.checked_mul(self.padded_times()))
            .ok_or_else(|| self.invalid())
    }

    /// Whether `pos` lies in the unpadded region.
    pub fn contains(&self, pos: GridPosition) -> bool {
        (pos.row as usize) < self.rows && (pos.pad as usize) < self.pads && (pos.time as usize) < self.times
    }

    /// Whether every offset of `geometry` around any contained position stays in the buffer.
    pub fn covers(&self, geometry: NeighborhoodGeometry) -> bool {
        geometry.pad_radius as usize <= self.pad_padding
            && geometry.time_radius as usize <= self.time_padding
    }

    #[inline]
    fn index(&self, pos: GridPosition) -> usize {
        let pad = pos.pad as usize + self.pad_padding;
        let time = pos.time as usize + self.time_padding;
        (pos.row as usize * self.padded_pads() + pad) * self.padded_times() + time
    }

    #[inline]
    fn offset_index(&self, pos: GridPosition, offset: NeighborOffset) -> Option<usize> {
        let pad = (pos.pad as usize + self.pad_padding).checked_add_signed(offset.dpad as isize)?;
        let time =
            (pos.time as usize + self.time_padding).checked_add_signed(offset.dtime as isize)?;
        if pos.row as usize >= self.rows || pad >= self.padded_pads() || time >= self.padded_times()
        {
            return None;
        }
        Some((pos.row as usize * self.padded_pads() + pad) * self.padded_times() + time)
    }
}

/// Owned padded grid of per-cell values.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    extent: GridExtent,
    data: Vec<T>,
}

/// Charge grid read by the suppression pass.
pub type ChargeMap = Grid<PackedCharge>;

/// Status grid read by the suppression pass and written by the commit pass.
pub type PeakStatusMap = Grid<PeakStatus>;

impl<T: Copy + Default> Grid<T> {
    /// Creates a grid filled with `T::default()`.
    pub fn new(extent: GridExtent) -> PeakSieveResult<Self> {
        let len = extent.cell_count()?;
        Ok(Self {
            extent,
            data: vec![T::default(); len],
        })
    }

    /// Wraps an existing padded buffer; extra trailing elements are dropped.
    pub fn from_vec(extent: GridExtent, mut data: Vec<T>) -> PeakSieveResult<Self> {
        let needed = extent.cell_count()?;
        if data.len() < needed {
            return Err(PeakSieveError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        data.truncate(needed);
        Ok(Self { extent, data })
    }

    /// Returns the grid extent.
    pub fn extent(&self) -> &GridExtent {
        &self.extent
    }

    /// Returns the padded backing buffer.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns the value at `pos` if it lies in the unpadded region.
    pub fn get(&self, pos: GridPosition) -> Option<T> {
        if !self.extent.contains(pos) {
            return None;
        }
        self.data.get(self.extent.index(pos)).copied()
    }

    /// Stores `value` at `pos`; returns `false` when `pos` is outside the grid.
    pub fn set(&mut self, pos: GridPosition, value: T) -> bool {
        if !self.extent.contains(pos) {
            return false;
        }
        let idx = self.extent.index(pos);
        self.data[idx] = value;
        true
    }

    /// Returns the value at `pos + offset`, padding included.
    pub fn neighbor(&self, pos: GridPosition, offset: NeighborOffset) -> Option<T> {
        let idx = self.extent.offset_index(pos, offset)?;
        self.data.get(idx).copied()
    }

    /// Hot-path lookup for positions already validated against the padding.
    ///
    /// Panics if the lookup leaves the buffer.
    #[inline]
    pub(crate) fn neighbor_in_window(&self, pos: GridPosition, offset: NeighborOffset) -> T {
        let base = self.extent.index(pos) as isize;
        let step = offset.dpad as isize * self.extent.padded_times() as isize + offset.dtime as isize;
        debug_assert!(self.extent.offset_index(pos, offset).is_some());
        self.data[(base + step) as usize]
    }

    /// Value stored at `pos`, which must already be validated.
    #[inline]
    pub(crate) fn at(&self, pos: GridPosition) -> T {
        self.data[self.extent.index(pos)]
    }
}

impl PeakStatusMap {
    /// Flags `pos` the way the peak finder does for a raw candidate.
    pub fn mark_candidate(&mut self, pos: GridPosition) -> bool {
        self.set(pos, PeakStatus::RAW_CANDIDATE)
    }
}

impl ChargeMap {
    /// Packs and stores a charge at `pos`.
    pub fn set_charge(&mut self, pos: GridPosition, charge: f32) -> bool {
        self.set(pos, PackedCharge::pack(charge))
    }

    /// Unpacked charge at `pos`.
    pub fn charge(&self, pos: GridPosition) -> Option<f32> {
        self.get(pos).map(PackedCharge::unpack)
    }
}
