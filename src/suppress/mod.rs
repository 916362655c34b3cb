//! Two-pass noise suppression of candidate peaks.
//!
//! [`NoiseSuppressor::run`] first decides every candidate against a single
//! snapshot of the status grid, and only once all decisions exist writes
//! them back. Interleaving the passes would let a candidate observe the
//! already-updated status of a neighbor.

pub(crate) mod bits;
pub(crate) mod commit;
pub(crate) mod evaluate;

use crate::candidate::decisions::Decisions;
use crate::candidate::list::CandidateList;
use crate::grid::{ChargeMap, GridPosition, PeakStatusMap};
use crate::neighborhood::{NeighborhoodGeometry, NeighborhoodTables};
use crate::trace::{trace_event, trace_reject};
use crate::util::{PeakSieveError, PeakSieveResult};

pub use bits::{NeighborBits, NeighborEvaluation};
pub use commit::{commit_decisions, CommitSummary};
pub use evaluate::NoiseSuppressionStage;

use evaluate::{check_capacity, check_grid};

/// Execution settings for a suppression run.
#[derive(Clone, Debug, PartialEq)]
pub struct SuppressionConfig {
    /// Maximum number of candidates accepted per run.
    pub capacity: usize,
    /// Candidates evaluated together per batch.
    pub batch_size: usize,
    /// Neighbor values staged per lane in one sub-range.
    pub slots_per_lane: usize,
    /// Evaluate batches in parallel (requires the `rayon` feature).
    pub parallel: bool,
    /// Check the peak finder contract for every candidate before running.
    pub verify_candidates: bool,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            capacity: 1 << 16,
            batch_size: 64,
            slots_per_lane: 16,
            parallel: false,
            verify_candidates: true,
        }
    }
}

impl SuppressionConfig {
    /// Checks value ranges.
    pub fn validate(&self) -> PeakSieveResult<()> {
        if self.batch_size == 0 {
            return Err(PeakSieveError::InvalidConfig {
                reason: "batch_size must be positive",
            });
        }
        if self.slots_per_lane == 0 {
            return Err(PeakSieveError::InvalidConfig {
                reason: "slots_per_lane must be positive",
            });
        }
        Ok(())
    }
}

/// Calibration values sourced once per run.
#[derive(Clone, Debug, PartialEq)]
pub struct Calibration {
    /// Margin by which the pivot must exceed a neighbor for it to count as a minimum.
    pub noise_epsilon: f32,
    /// Charge every candidate exceeds, as guaranteed by the peak finder.
    pub peak_charge_threshold: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            noise_epsilon: 10.0,
            peak_charge_threshold: 3.0,
        }
    }
}

impl Calibration {
    /// Checks value ranges.
    pub fn validate(&self) -> PeakSieveResult<()> {
        if !self.noise_epsilon.is_finite() || self.noise_epsilon < 0.0 {
            return Err(PeakSieveError::InvalidCalibration {
                reason: "noise_epsilon must be finite and non-negative",
            });
        }
        if !self.peak_charge_threshold.is_finite() || self.peak_charge_threshold < 0.0 {
            return Err(PeakSieveError::InvalidCalibration {
                reason: "peak_charge_threshold must be finite and non-negative",
            });
        }
        Ok(())
    }
}

/// Decisions and write counts of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct SuppressionReport {
    pub decisions: Decisions,
    pub summary: CommitSummary,
}

impl SuppressionReport {
    /// Candidates that survived, in list order.
    pub fn kept_positions<'a>(
        &'a self,
        candidates: &'a CandidateList,
    ) -> impl Iterator<Item = GridPosition> + 'a {
        candidates
            .positions()
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.decisions.is_kept(*idx))
            .map(|(_, pos)| *pos)
    }
}

/// Noise suppression for one neighborhood geometry and calibration.
#[derive(Clone, Debug)]
pub struct NoiseSuppressor {
    tables: NeighborhoodTables,
    config: SuppressionConfig,
    calibration: Calibration,
}

impl NoiseSuppressor {
    /// Builds the neighborhood tables and validates the settings.
    pub fn new(
        geometry: NeighborhoodGeometry,
        config: SuppressionConfig,
        calibration: Calibration,
    ) -> PeakSieveResult<Self> {
        config.validate()?;
        calibration.validate()?;
        let tables = NeighborhoodTables::build(geometry)?;
        trace_event!("tables_built", neighbors = tables.len());
        Ok(Self {
            tables,
            config,
            calibration,
        })
    }

    pub fn tables(&self) -> &NeighborhoodTables {
        &self.tables
    }

    pub fn config(&self) -> &SuppressionConfig {
        &self.config
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// First pass only: decides every candidate without writing.
    pub fn evaluate(
        &self,
        charge_map: &ChargeMap,
        status_map: &PeakStatusMap,
        candidates: &CandidateList,
    ) -> PeakSieveResult<Decisions> {
        self.validate_inputs(charge_map, status_map, candidates)?;
        let stage = NoiseSuppressionStage::new(&self.tables, &self.config, &self.calibration)?;
        Ok(stage.evaluate_unchecked(charge_map, status_map, candidates))
    }

    /// Runs both passes: all decisions are computed before the first write.
    pub fn run(
        &self,
        charge_map: &ChargeMap,
        status_map: &mut PeakStatusMap,
        candidates: &CandidateList,
    ) -> PeakSieveResult<SuppressionReport> {
        let decisions = self.evaluate(charge_map, status_map, candidates)?;
        let summary = commit_decisions(candidates, &decisions, status_map)?;
        Ok(SuppressionReport { decisions, summary })
    }

    /// Checks every caller guarantee the passes rely on.
    pub fn validate_inputs(
        &self,
        charge_map: &ChargeMap,
        status_map: &PeakStatusMap,
        candidates: &CandidateList,
    ) -> PeakSieveResult<()> {
        self.check_inputs(charge_map, status_map, candidates)
            .map_err(|err| {
                trace_reject!(err);
                err
            })
    }

    fn check_inputs(
        &self,
        charge_map: &ChargeMap,
        status_map: &PeakStatusMap,
        candidates: &CandidateList,
    ) -> PeakSieveResult<()> {
        check_capacity(candidates, self.config.capacity)?;
        check_grid(&self.tables, charge_map, status_map, candidates.positions())?;

        if !self.config.verify_candidates {
            return Ok(());
        }
        for (index, &pos) in candidates.positions().iter().enumerate() {
            let status = status_map.at(pos);
            if !status.was_candidate() || !status.is_peak() {
                return Err(PeakSieveError::CandidateContract {
                    index,
                    reason: "status is not a raw candidate",
                });
            }
            if charge_map.at(pos).unpack() <= self.calibration.peak_charge_threshold {
                return Err(PeakSieveError::CandidateContract {
                    index,
                    reason: "charge does not exceed the peak threshold",
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridExtent;

    #[test]
    fn config_rejects_zero_batch() {
        let cfg = SuppressionConfig {
            batch_size: 0,
            ..SuppressionConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(PeakSieveError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn calibration_rejects_nan_epsilon() {
        let cal = Calibration {
            noise_epsilon: f32::NAN,
            ..Calibration::default()
        };
        assert!(matches!(
            cal.validate(),
            Err(PeakSieveError::InvalidCalibration { .. })
        ));
    }

    #[test]
    fn rejects_grid_without_enough_padding() {
        let suppressor = NoiseSuppressor::new(
            NeighborhoodGeometry::default(),
            SuppressionConfig::default(),
            Calibration::default(),
        )
        .unwrap();
        let extent = GridExtent::new(1, 8, 8, 1, 1).unwrap();
        let charge = ChargeMap::new(extent).unwrap();
        let status = PeakStatusMap::new(extent).unwrap();
        let list = CandidateList::new(Vec::new(), 4).unwrap();
        let err = suppressor
            .validate_inputs(&charge, &status, &list)
            .unwrap_err();
        assert!(matches!(err, PeakSieveError::InvalidGeometry { .. }));
    }
}
