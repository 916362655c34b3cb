//! peaksieve removes noise-induced peaks from a padded charge grid.
//!
//! Candidate local maxima come from an upstream peak finder. For each one,
//! the suppression pass checks every stronger peak in a fixed neighborhood
//! and keeps the candidate only if a clear minimum separates the two. A
//! second pass writes the verdicts into the shared status grid. Batches of
//! candidates stage their neighborhoods through a shared scratch buffer and
//! may run in parallel via the `rayon` feature.

mod candidate;
pub mod grid;
pub mod lowlevel;
pub mod neighborhood;
pub mod sampler;
pub mod suppress;
mod trace;
pub mod util;

pub use candidate::decisions::Decisions;
pub use candidate::list::CandidateList;
pub use grid::{
    ChargeMap, Grid, GridExtent, GridPosition, PackedCharge, PeakStatus, PeakStatusMap,
};
pub use neighborhood::{NeighborMask, NeighborOffset, NeighborhoodGeometry, NeighborhoodTables};
pub use suppress::{
    commit_decisions, Calibration, CommitSummary, NoiseSuppressionStage, NoiseSuppressor,
    SuppressionConfig, SuppressionReport,
};
pub use util::{PeakSieveError, PeakSieveResult};
