//! Capacity-bounded list of candidate peak positions.

use crate::grid::GridPosition;
use crate::util::{PeakSieveError, PeakSieveResult};

/// Ordered candidate positions produced by the peak finder.
///
/// The list never holds more than `capacity` entries. Duplicates are kept
/// as given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateList {
    positions: Vec<GridPosition>,
    capacity: usize,
}

impl CandidateList {
    /// Wraps `positions`, failing fast when they exceed `capacity`.
    pub fn new(positions: Vec<GridPosition>, capacity: usize) -> PeakSieveResult<Self> {
        if positions.len() > capacity {
            return Err(PeakSieveError::CapacityExceeded {
                count: positions.len(),
                capacity,
            });
        }
        Ok(Self {
            positions,
            capacity,
        })
    }

    /// Number of real candidates.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn positions(&self) -> &[GridPosition] {
        &self.positions
    }

    pub fn get(&self, index: usize) -> Option<GridPosition> {
        self.positions.get(index).copied()
    }
}
