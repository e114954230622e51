//! Majority-election mandate engine.
//!
//! Call order per recompute:
//! 1. `recalculate_primary_candidate_end_result_states` (computes the absolute majority)
//! 2. `recalculate_secondary_candidate_end_result_states`
//!
//! Lot decisions are recorded with `apply_lot_decisions` between recomputes.

mod absolute_majority;
mod ranking;
mod states;

pub use absolute_majority::{
    calculate_absolute_majority, candidate_votes_divided_by_double_mandates,
    valid_ballots_divided_by_two,
};
pub use ranking::{apply_lot_decisions, recalculate_ranks};
pub use states::{
    recalculate_primary_candidate_end_result_states,
    recalculate_secondary_candidate_end_result_states,
};

use am_core::ids::CandidateId;
use am_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MajorityError {
    #[error("number of mandates is zero; cannot divide candidate votes by twice the mandates")]
    ZeroMandates,
    #[error("absolute majority out of range")]
    Overflow,
    #[error("unknown candidate: {0}")]
    UnknownCandidate(CandidateId),
    #[error("candidate {0} has no lot decision enabled")]
    LotDecisionNotEnabled(CandidateId),
    #[error("rank {rank} lies outside the tie group of candidate {candidate_id}")]
    RankOutsideTieGroup { candidate_id: CandidateId, rank: u32 },
    #[error("rank {0} drawn twice in one tie group")]
    DuplicateLotDecisionRank(u32),
    #[error(transparent)]
    Core(#[from] CoreError),
}
