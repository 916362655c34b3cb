//! Second pass: write the decisions into the status grid.

use crate::candidate::decisions::Decisions;
use crate::candidate::list::CandidateList;
use crate::grid::{PeakStatus, PeakStatusMap};
use crate::trace::{trace_event, trace_span};
use crate::util::{PeakSieveError, PeakSieveResult};

/// Counts of the statuses written by [`commit_decisions`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub confirmed: usize,
    pub suppressed: usize,
}

/// Rewrites the status of every real candidate from its decision.
///
/// Each candidate cell becomes `CANDIDATE`, plus `PEAK` when kept. The
/// candidate bit is written unconditionally: the peak finder only lists
/// cells it flagged, so it never has to be re-derived from the charge.
/// Every index is checked before the first write, so an error leaves the
/// grid untouched. Applying the same decisions twice is a no-op.
pub fn commit_decisions(
    candidates: &CandidateList,
    decisions: &Decisions,
    status_map: &mut PeakStatusMap,
) -> PeakSieveResult<CommitSummary> {
    let _span = trace_span!("commit_peaks", candidates = candidates.len()).entered();

    for (index, &pos) in candidates.positions().iter().enumerate() {
        if decisions.get(index).is_none() {
            return Err(PeakSieveError::MissingDecision { index });
        }
        if !status_map.extent().contains(pos) {
            return Err(PeakSieveError::PositionOutOfBounds {
                index,
                row: pos.row,
                pad: pos.pad,
                time: pos.time,
            });
        }
    }

    let mut summary = CommitSummary::default();
    for (index, &pos) in candidates.positions().iter().enumerate() {
        let keep = decisions.is_kept(index);
        status_map.set(pos, PeakStatus::resolved(keep));
        if keep {
            summary.confirmed += 1;
        } else {
            summary.suppressed += 1;
        }
    }

    trace_event!(
        "peaks_committed",
        confirmed = summary.confirmed,
        suppressed = summary.suppressed
    );
    Ok(summary)
}
