//! Error types for peaksieve.

use thiserror::Error;

/// Result alias for peaksieve operations.
pub type PeakSieveResult<T> = std::result::Result<T, PeakSieveError>;

/// Errors raised when a caller violates the contract of a suppression run.
///
/// The suppression algorithm itself has no recoverable failure modes; every
/// variant here is detected before a pass starts writing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PeakSieveError {
    /// Grid dimensions are zero or overflow `usize`.
    #[error("invalid grid dimensions: rows={rows}, pads={pads}, times={times}")]
    InvalidDimensions { rows: usize, pads: usize, times: usize },
    /// A backing buffer is shorter than the grid it should describe.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Neighborhood geometry cannot be represented.
    #[error("invalid neighborhood geometry: {reason}")]
    InvalidGeometry { reason: &'static str },
    /// A configuration value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: &'static str },
    /// A calibration value is out of range.
    #[error("invalid calibration: {reason}")]
    InvalidCalibration { reason: &'static str },
    /// More candidates than the configured capacity.
    #[error("candidate count {count} exceeds capacity {capacity}")]
    CapacityExceeded { count: usize, capacity: usize },
    /// A candidate lies outside the grid, or its neighborhood leaves the padding.
    #[error("candidate {index} at (row={row}, pad={pad}, time={time}) is out of bounds")]
    PositionOutOfBounds {
        index: usize,
        row: u16,
        pad: u16,
        time: u16,
    },
    /// The charge map and status map describe different grids.
    #[error("charge map and status map extents differ")]
    ExtentMismatch,
    /// A candidate does not satisfy what the peak finder guarantees.
    #[error("candidate {index} violates the peak finder contract: {reason}")]
    CandidateContract { index: usize, reason: &'static str },
    /// A real candidate has no decision to commit.
    #[error("no decision recorded for candidate {index}")]
    MissingDecision { index: usize },
}
