//! Low-level building blocks for custom suppression pipelines.
//!
//! These expose the staging primitives and the per-pivot bit accumulation
//! used inside [`NoiseSuppressionStage`](crate::NoiseSuppressionStage). Most
//! users should prefer [`NoiseSuppressor`](crate::NoiseSuppressor).

pub use crate::sampler::{lane_slice, stage, BatchScratch, StagingPlan};
pub use crate::suppress::bits::{
    accumulate_minima, accumulate_peaks, check_minimum, keep_peak, NeighborBits,
    NeighborEvaluation,
};
