//! Candidate peaks and the per-candidate decisions of the suppression pass.

pub(crate) mod decisions;
pub(crate) mod list;
