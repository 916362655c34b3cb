//! First pass: decide for every candidate whether it survives.
//!
//! The pass only reads the charge and status maps. Candidates are cut into
//! batches of `batch_size` lanes; each batch broadcasts its pivots, then
//! stages the neighbor charges and afterwards the neighbor status bits one
//! sub-range at a time, accumulating the per-lane masks as it goes.

use crate::candidate::decisions::Decisions;
use crate::candidate::list::CandidateList;
use crate::grid::{ChargeMap, GridPosition, PeakStatusMap};
use crate::neighborhood::NeighborhoodTables;
use crate::sampler::{lane_slice, stage, BatchScratch, StagingPlan};
use crate::suppress::bits::{accumulate_minima, accumulate_peaks, check_minimum};
use crate::suppress::bits::{NeighborBits, NeighborEvaluation};
use crate::suppress::{Calibration, SuppressionConfig};
use crate::trace::{trace_event, trace_reject, trace_span};
use crate::util::{PeakSieveError, PeakSieveResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Scratch owned by one batch worker and reused across its batches.
struct BatchWorkspace {
    scratch: BatchScratch,
    pivots: Vec<f32>,
    bits: Vec<NeighborBits>,
}

impl BatchWorkspace {
    fn new(batch_size: usize, slots_per_lane: usize) -> Self {
        Self {
            scratch: BatchScratch::new(batch_size, slots_per_lane),
            pivots: vec![0.0; batch_size],
            bits: vec![NeighborBits::default(); batch_size],
        }
    }
}

/// Noise suppression pass over a candidate list.
pub struct NoiseSuppressionStage<'a> {
    tables: &'a NeighborhoodTables,
    plan: StagingPlan,
    capacity: usize,
    batch_size: usize,
    epsilon: f32,
    parallel: bool,
}

impl<'a> NoiseSuppressionStage<'a> {
    /// Prepares the pass; `config` and `calibration` are validated here.
    pub fn new(
        tables: &'a NeighborhoodTables,
        config: &SuppressionConfig,
        calibration: &Calibration,
    ) -> PeakSieveResult<Self> {
        config.validate()?;
        calibration.validate()?;
        Ok(Self {
            tables,
            plan: StagingPlan::new(tables.len(), config.slots_per_lane)?,
            capacity: config.capacity,
            batch_size: config.batch_size,
            epsilon: calibration.noise_epsilon,
            parallel: config.parallel,
        })
    }

    /// Staging plan used for every batch.
    pub fn plan(&self) -> &StagingPlan {
        &self.plan
    }

    /// Evaluates a single pivot without batching or staging.
    pub fn evaluate_one(
        &self,
        charge_map: &ChargeMap,
        status_map: &PeakStatusMap,
        pos: GridPosition,
    ) -> PeakSieveResult<NeighborEvaluation> {
        check_grid(self.tables, charge_map, status_map, &[pos]).map_err(|err| {
            trace_reject!(err);
            err
        })?;
        Ok(self.evaluate_one_unchecked(charge_map, status_map, pos))
    }

    pub(crate) fn evaluate_one_unchecked(
        &self,
        charge_map: &ChargeMap,
        status_map: &PeakStatusMap,
        pos: GridPosition,
    ) -> NeighborEvaluation {
        let q = charge_map.at(pos).unpack();
        let mut bits = NeighborBits::default();
        for (rank, &offset) in self.tables.offsets().iter().enumerate() {
            let other = charge_map.neighbor_in_window(pos, offset).unpack();
            check_minimum(q, self.epsilon, other, rank, &mut bits);
            bits.peaks
                .set_if(rank, status_map.neighbor_in_window(pos, offset).is_peak());
        }
        bits.evaluate(self.tables)
    }

    /// Decides every candidate of `candidates`.
    ///
    /// The returned decisions are sized to the candidate capacity; only the
    /// first `candidates.len()` slots are written. Fails before evaluating
    /// anything when the list exceeds the configured capacity, the maps
    /// disagree on their extent, or a candidate lies outside the grid.
    pub fn evaluate(
        &self,
        charge_map: &ChargeMap,
        status_map: &PeakStatusMap,
        candidates: &CandidateList,
    ) -> PeakSieveResult<Decisions> {
        check_capacity(candidates, self.capacity)
            .and_then(|()| check_grid(self.tables, charge_map, status_map, candidates.positions()))
            .map_err(|err| {
                trace_reject!(err);
                err
            })?;
        Ok(self.evaluate_unchecked(charge_map, status_map, candidates))
    }

    pub(crate) fn evaluate_unchecked(
        &self,
        charge_map: &ChargeMap,
        status_map: &PeakStatusMap,
        candidates: &CandidateList,
    ) -> Decisions {
        let count = candidates.len();
        let batches = count.div_ceil(self.batch_size);
        let _span = trace_span!(
            "noise_suppression",
            candidates = count,
            batches = batches,
            parallel = self.parallel
        )
        .entered();

        let mut decisions = Decisions::undecided(candidates.capacity());
        let slots = &mut decisions.slots_mut()[..count];
        let positions = candidates.positions();

        if self.parallel {
            self.evaluate_par(charge_map, status_map, positions, slots);
        } else {
            self.evaluate_seq(charge_map, status_map, positions, slots);
        }

        trace_event!(
            "suppression_decisions",
            kept = decisions.kept(),
            suppressed = count - decisions.kept()
        );
        decisions
    }

    #[cfg(feature = "rayon")]
    fn evaluate_par(
        &self,
        charge_map: &ChargeMap,
        status_map: &PeakStatusMap,
        positions: &[GridPosition],
        slots: &mut [Option<bool>],
    ) {
        positions
            .par_chunks(self.batch_size)
            .zip(slots.par_chunks_mut(self.batch_size))
            .for_each_init(
                || BatchWorkspace::new(self.batch_size, self.plan.slots_per_lane()),
                |workspace, (batch, out)| {
                    self.evaluate_batch(charge_map, status_map, batch, workspace, out)
                },
            );
    }

    #[cfg(not(feature = "rayon"))]
    fn evaluate_par(
        &self,
        charge_map: &ChargeMap,
        status_map: &PeakStatusMap,
        positions: &[GridPosition],
        slots: &mut [Option<bool>],
    ) {
        self.evaluate_seq(charge_map, status_map, positions, slots);
    }

    fn evaluate_seq(
        &self,
        charge_map: &ChargeMap,
        status_map: &PeakStatusMap,
        positions: &[GridPosition],
        slots: &mut [Option<bool>],
    ) {
        let mut workspace = BatchWorkspace::new(self.batch_size, self.plan.slots_per_lane());
        for (batch, out) in positions
            .chunks(self.batch_size)
            .zip(slots.chunks_mut(self.batch_size))
        {
            self.evaluate_batch(charge_map, status_map, batch, &mut workspace, out);
        }
    }

    fn evaluate_batch(
        &self,
        charge_map: &ChargeMap,
        status_map: &PeakStatusMap,
        batch: &[GridPosition],
        workspace: &mut BatchWorkspace,
        out: &mut [Option<bool>],
    ) {
        let BatchWorkspace {
            scratch,
            pivots,
            bits,
        } = workspace;

        let real = scratch.broadcast(batch);
        for ((pivot, lane_bits), &pos) in pivots
            .iter_mut()
            .zip(bits.iter_mut())
            .zip(&scratch.positions)
        {
            *pivot = charge_map.at(pos).unpack();
            *lane_bits = NeighborBits::default();
        }

        for range in self.plan.ranges() {
            let width = range.len();
            stage(
                charge_map,
                &scratch.positions,
                range.clone(),
                self.tables,
                &mut scratch.charges,
            );
            for (lane, (lane_bits, &q)) in bits.iter_mut().zip(pivots.iter()).enumerate() {
                let staged = lane_slice(&scratch.charges, lane, width);
                accumulate_minima(q, self.epsilon, staged, range.start, lane_bits);
            }
        }

        for range in self.plan.ranges() {
            let width = range.len();
            stage(
                status_map,
                &scratch.positions,
                range.clone(),
                self.tables,
                &mut scratch.status,
            );
            for (lane, lane_bits) in bits.iter_mut().enumerate() {
                let staged = lane_slice(&scratch.status, lane, width);
                lane_bits.peaks |= accumulate_peaks(staged, range.start);
            }
        }

        // Padding lanes stop here.
        for (slot, lane_bits) in out.iter_mut().zip(&bits[..real]) {
            *slot = Some(lane_bits.evaluate(self.tables).keep);
        }
    }
}

/// Rejects lists holding, or sized for, more candidates than `capacity`.
pub(crate) fn check_capacity(candidates: &CandidateList, capacity: usize) -> PeakSieveResult<()> {
    if candidates.len() > capacity {
        return Err(PeakSieveError::CapacityExceeded {
            count: candidates.len(),
            capacity,
        });
    }
    if candidates.capacity() > capacity {
        return Err(PeakSieveError::CapacityExceeded {
            count: candidates.capacity(),
            capacity,
        });
    }
    Ok(())
}

/// Checks that both maps share one extent padded for the neighborhood and
/// that every position lies inside it.
pub(crate) fn check_grid(
    tables: &NeighborhoodTables,
    charge_map: &ChargeMap,
    status_map: &PeakStatusMap,
    positions: &[GridPosition],
) -> PeakSieveResult<()> {
    let extent = charge_map.extent();
    if extent != status_map.extent() {
        return Err(PeakSieveError::ExtentMismatch);
    }
    if !extent.covers(tables.geometry()) {
        return Err(PeakSieveError::InvalidGeometry {
            reason: "neighborhood radius exceeds grid padding",
        });
    }
    match positions.iter().position(|&pos| !extent.contains(pos)) {
        Some(index) => {
            let pos = positions[index];
            Err(PeakSieveError::PositionOutOfBounds {
                index,
                row: pos.row,
                pad: pos.pad,
                time: pos.time,
            })
        }
        None => Ok(()),
    }
}
