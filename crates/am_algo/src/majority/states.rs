//! Candidate state recompute for primary and secondary elections.
//!
//! States are always derived from scratch. The secondary pass reads the
//! primary states, so it has to run after the primary pass.

use am_core::entities::{
    CandidateEndResult, CandidateEndResultState as State, MajorityElectionEndResult,
};
use am_core::variables::{CantonSettings, MajorityElectionMandateAlgorithm};
use tracing::debug;

use super::absolute_majority::calculate_absolute_majority;
use super::ranking::{recalculate_ranks, recalculate_ranks_of};
use super::MajorityError;

/// Rank the primary candidates and derive their states.
///
/// Recomputes the absolute majority first (fails on zero mandates under the
/// candidate-votes formula).
pub fn recalculate_primary_candidate_end_result_states(
    end_result: &mut MajorityElectionEndResult,
    settings: &CantonSettings,
) -> Result<(), MajorityError> {
    calculate_absolute_majority(end_result, settings.majority_election_absolute_majority_calculation)?;

    let seats = end_result.number_of_mandates;
    let algorithm = end_result.mandate_algorithm;
    let absolute_majority = end_result.calculation.absolute_majority;
    let all_done = end_result.all_counting_circles_done();

    recalculate_ranks(&mut end_result.candidate_end_results, seats, absolute_majority);
    for c in &mut end_result.candidate_end_results {
        c.state = candidate_state(c, all_done, seats, algorithm, absolute_majority);
    }
    debug!(
        election = %end_result.election_id,
        elected = end_result.candidate_end_results.iter().filter(|c| c.state.is_elected()).count(),
        "primary states recalculated"
    );
    Ok(())
}

/// Derive the states of every secondary election from its own ranking and,
/// when the canton requires it, the primary states of referenced candidates.
///
/// Candidates whose primary counterpart is not elected are `NotEligibleInPrimary`
/// and take no rank; the remaining candidates are ranked among themselves.
/// While any referenced primary candidate is still pending, the whole
/// secondary election stays pending.
pub fn recalculate_secondary_candidate_end_result_states(
    end_result: &mut MajorityElectionEndResult,
    settings: &CantonSettings,
) -> Result<(), MajorityError> {
    let algorithm = end_result.mandate_algorithm;
    let all_done = end_result.all_counting_circles_done();
    let primary = &end_result.candidate_end_results;

    for secondary in &mut end_result.secondary_end_results {
        let mut eligible: Vec<usize> = Vec::with_capacity(secondary.candidate_end_results.len());
        let mut eligibility_pending = false;

        for (i, c) in secondary.candidate_end_results.iter_mut().enumerate() {
            let primary_state = match (&c.candidate_reference, settings.secondary_candidates_require_primary_election) {
                (Some(reference), true) => Some(
                    primary
                        .iter()
                        .find(|p| &p.candidate_id == reference)
                        .map(|p| p.state)
                        .ok_or_else(|| MajorityError::UnknownCandidate(reference.clone()))?,
                ),
                _ => None,
            };
            match primary_state {
                Some(s) if s == State::Pending => {
                    eligibility_pending = true;
                    eligible.push(i);
                }
                Some(s) if !s.is_elected() => {
                    c.rank = 0;
                    c.lot_decision = false;
                    c.lot_decision_enabled = false;
                    c.lot_decision_required = false;
                    c.state = State::NotEligibleInPrimary;
                }
                _ => eligible.push(i),
            }
        }

        let seats = secondary.number_of_mandates;
        let absolute_majority = secondary.calculation.absolute_majority;
        recalculate_ranks_of(&mut secondary.candidate_end_results, &eligible, seats, absolute_majority);
        for &i in &eligible {
            let c = &mut secondary.candidate_end_results[i];
            c.state = if eligibility_pending {
                State::Pending
            } else {
                candidate_state(c, all_done, seats, algorithm, absolute_majority)
            };
        }
        debug!(
            election = %secondary.election_id,
            eligible = eligible.len(),
            pending = eligibility_pending,
            "secondary states recalculated"
        );
    }
    Ok(())
}

fn candidate_state(
    c: &CandidateEndResult,
    all_done: bool,
    seats: u32,
    algorithm: MajorityElectionMandateAlgorithm,
    absolute_majority: Option<u64>,
) -> State {
    if !all_done || c.lot_decision_required {
        return State::Pending;
    }
    let rank_ok = c.rank >= 1 && c.rank <= seats;
    match (algorithm, absolute_majority) {
        (MajorityElectionMandateAlgorithm::AbsoluteMajority, Some(am)) => {
            match (rank_ok, c.vote_count >= am) {
                (true, true) => State::AbsoluteMajorityAndElected,
                (false, true) => State::AbsoluteMajorityAndNotElectedInsufficientNumberOfMandates,
                (true, false) => State::NoAbsoluteMajorityAndNotElectedButRankOk,
                (false, false) => State::NotElected,
            }
        }
        _ => {
            if rank_ok {
                State::Elected
            } else {
                State::NotElected
            }
        }
    }
}
