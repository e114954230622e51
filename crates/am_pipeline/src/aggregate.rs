//! AGGREGATE stage: fold counting-circle results into end results.
//!
//! Two ways to get there, which must agree:
//! - `adjust_*`: add or remove one counting circle's numbers (a result was
//!   just marked done, or its done state was revoked).
//! - `rebuild_*`: zero the tallies and sum every done result from scratch.
//!
//! Each call works on a copy and only replaces the end result on success, so
//! a rejected result leaves the tallies untouched.

use std::collections::BTreeSet;

use am_core::entities::{
    CandidateEndResult, CandidateResult, MajorityElectionEndResult, MajorityElectionResult,
    ProportionalElectionEndResult, ProportionalElectionResult,
};
use am_core::ids::{CountingCircleId, ElectionId};
use tracing::debug;

use crate::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentMode {
    Add,
    Remove,
}

impl AdjustmentMode {
    fn apply(self, total: &mut u64, delta: u64, what: &str) -> Result<(), PipelineError> {
        *total = match self {
            AdjustmentMode::Add => total.checked_add(delta),
            AdjustmentMode::Remove => total.checked_sub(delta),
        }
        .ok_or_else(|| PipelineError::Aggregate(format!("{what} out of range after {self:?} of {delta}")))?;
        Ok(())
    }

    fn apply_done(self, done: &mut u32, total: u32, election: &ElectionId) -> Result<(), PipelineError> {
        let next = match self {
            AdjustmentMode::Add => done.checked_add(1).filter(|&n| n <= total),
            AdjustmentMode::Remove => done.checked_sub(1),
        };
        *done = next.ok_or_else(|| {
            PipelineError::Aggregate(format!(
                "election {election}: done counting circles out of range ({done} of {total}, {self:?})"
            ))
        })?;
        Ok(())
    }
}

// ------------------------------- Majority -------------------------------

fn adjust_candidates(
    election: &ElectionId,
    candidates: &mut [CandidateEndResult],
    results: &[CandidateResult],
    mode: AdjustmentMode,
) -> Result<(), PipelineError> {
    for r in results {
        let c = candidates
            .iter_mut()
            .find(|c| c.candidate_id == r.candidate_id)
            .ok_or_else(|| {
                PipelineError::Aggregate(format!("election {election}: unknown candidate {}", r.candidate_id))
            })?;
        mode.apply(&mut c.vote_count, r.vote_count, "candidate vote count")?;
    }
    Ok(())
}

fn adjust_majority_in_place(
    end: &mut MajorityElectionEndResult,
    result: &MajorityElectionResult,
    mode: AdjustmentMode,
) -> Result<(), PipelineError> {
    let election = end.election_id.clone();
    mode.apply_done(&mut end.count_of_done_counting_circles, end.total_count_of_counting_circles, &election)?;
    mode.apply(&mut end.accounted_ballots, result.accounted_ballots, "accounted ballots")?;
    mode.apply(&mut end.individual_vote_count, result.individual_vote_count, "individual votes")?;
    mode.apply(&mut end.empty_vote_count, result.empty_vote_count, "empty votes")?;
    mode.apply(&mut end.invalid_vote_count, result.invalid_vote_count, "invalid votes")?;
    adjust_candidates(&election, &mut end.candidate_end_results, &result.candidate_results, mode)?;

    for sr in &result.secondary_results {
        let se = end
            .secondary_end_results
            .iter_mut()
            .find(|s| s.election_id == sr.election_id)
            .ok_or_else(|| PipelineError::Aggregate(format!("unknown secondary election {}", sr.election_id)))?;
        mode.apply(&mut se.individual_vote_count, sr.individual_vote_count, "individual votes")?;
        mode.apply(&mut se.empty_vote_count, sr.empty_vote_count, "empty votes")?;
        mode.apply(&mut se.invalid_vote_count, sr.invalid_vote_count, "invalid votes")?;
        adjust_candidates(&sr.election_id, &mut se.candidate_end_results, &sr.candidate_results, mode)?;
    }
    Ok(())
}

/// Add or remove one counting circle's result.
pub fn adjust_majority_end_result(
    end: &mut MajorityElectionEndResult,
    result: &MajorityElectionResult,
    mode: AdjustmentMode,
) -> Result<(), PipelineError> {
    let mut next = end.clone();
    adjust_majority_in_place(&mut next, result, mode)?;
    debug!(election = %end.election_id, counting_circle = %result.counting_circle_id, ?mode, "majority end result adjusted");
    *end = next;
    Ok(())
}

/// Zero every tally, then add each done result.
pub fn rebuild_majority_end_result(
    end: &mut MajorityElectionEndResult,
    results: &[MajorityElectionResult],
) -> Result<(), PipelineError> {
    unique_counting_circles(&end.election_id, results.iter().map(|r| &r.counting_circle_id))?;
    let mut next = end.clone();
    next.count_of_done_counting_circles = 0;
    next.accounted_ballots = 0;
    next.individual_vote_count = 0;
    next.empty_vote_count = 0;
    next.invalid_vote_count = 0;
    reset_candidates(&mut next.candidate_end_results);
    for s in &mut next.secondary_end_results {
        s.individual_vote_count = 0;
        s.empty_vote_count = 0;
        s.invalid_vote_count = 0;
        reset_candidates(&mut s.candidate_end_results);
    }
    for r in results.iter().filter(|r| r.done) {
        adjust_majority_in_place(&mut next, r, AdjustmentMode::Add)?;
    }
    debug!(election = %end.election_id, done = next.count_of_done_counting_circles, "majority end result rebuilt");
    *end = next;
    Ok(())
}

fn reset_candidates(candidates: &mut [CandidateEndResult]) {
    for c in candidates {
        c.vote_count = 0;
    }
}

// ------------------------------- Proportional -------------------------------

fn adjust_proportional_in_place(
    end: &mut ProportionalElectionEndResult,
    result: &ProportionalElectionResult,
    mode: AdjustmentMode,
) -> Result<(), PipelineError> {
    let election = end.election_id.clone();
    mode.apply_done(&mut end.count_of_done_counting_circles, end.total_count_of_counting_circles, &election)?;
    for lr in &result.list_results {
        let list = end.list_mut(&lr.list_id).ok_or_else(|| {
            PipelineError::Aggregate(format!("election {election}: unknown list {}", lr.list_id))
        })?;
        mode.apply(&mut list.vote_count, lr.vote_count, "list vote count")?;
    }
    Ok(())
}

pub fn adjust_proportional_end_result(
    end: &mut ProportionalElectionEndResult,
    result: &ProportionalElectionResult,
    mode: AdjustmentMode,
) -> Result<(), PipelineError> {
    let mut next = end.clone();
    adjust_proportional_in_place(&mut next, result, mode)?;
    debug!(election = %end.election_id, counting_circle = %result.counting_circle_id, ?mode, "proportional end result adjusted");
    *end = next;
    Ok(())
}

pub fn rebuild_proportional_end_result(
    end: &mut ProportionalElectionEndResult,
    results: &[ProportionalElectionResult],
) -> Result<(), PipelineError> {
    unique_counting_circles(&end.election_id, results.iter().map(|r| &r.counting_circle_id))?;
    let mut next = end.clone();
    next.count_of_done_counting_circles = 0;
    for l in &mut next.list_end_results {
        l.vote_count = 0;
    }
    for r in results.iter().filter(|r| r.done) {
        adjust_proportional_in_place(&mut next, r, AdjustmentMode::Add)?;
    }
    debug!(election = %end.election_id, done = next.count_of_done_counting_circles, "proportional end result rebuilt");
    *end = next;
    Ok(())
}

fn unique_counting_circles<'a>(
    election: &ElectionId,
    ids: impl Iterator<Item = &'a CountingCircleId>,
) -> Result<(), PipelineError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(PipelineError::Aggregate(format!(
                "election {election}: counting circle {id} reported twice"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use am_core::entities::{ElectionKind, ListResult, ProportionalElectionListEndResult};

    fn proportional_end() -> ProportionalElectionEndResult {
        ProportionalElectionEndResult {
            election_id: "NR".parse().unwrap(),
            number_of_mandates: 3,
            count_of_done_counting_circles: 0,
            total_count_of_counting_circles: 2,
            list_end_results: ["L1", "L2"]
                .iter()
                .map(|id| ProportionalElectionListEndResult {
                    list_id: id.parse().unwrap(),
                    list_union: None,
                    sub_list_union: None,
                    vote_count: 0,
                    number_of_mandates: 0,
                })
                .collect(),
            mandate_distribution_triggered: false,
        }
    }

    fn cc(id: &str, done: bool, votes: [u64; 2]) -> ProportionalElectionResult {
        ProportionalElectionResult {
            counting_circle_id: id.parse().unwrap(),
            done,
            list_results: vec![
                ListResult { list_id: "L1".parse().unwrap(), vote_count: votes[0] },
                ListResult { list_id: "L2".parse().unwrap(), vote_count: votes[1] },
            ],
        }
    }

    #[test]
    fn rebuild_counts_done_results_only() {
        let mut end = proportional_end();
        rebuild_proportional_end_result(&mut end, &[cc("A", true, [10, 5]), cc("B", false, [7, 7])]).unwrap();
        assert_eq!(end.count_of_done_counting_circles, 1);
        assert_eq!(end.total_vote_count(), 15);
    }

    #[test]
    fn add_then_remove_restores() {
        let mut end = proportional_end();
        let before = end.clone();
        adjust_proportional_end_result(&mut end, &cc("A", true, [10, 5]), AdjustmentMode::Add).unwrap();
        adjust_proportional_end_result(&mut end, &cc("A", true, [10, 5]), AdjustmentMode::Remove).unwrap();
        assert_eq!(end, before);
    }

    #[test]
    fn failed_adjustment_leaves_tallies_untouched() {
        let mut end = proportional_end();
        adjust_proportional_end_result(&mut end, &cc("A", true, [10, 5]), AdjustmentMode::Add).unwrap();
        let before = end.clone();
        let err = adjust_proportional_end_result(&mut end, &cc("B", true, [11, 0]), AdjustmentMode::Remove);
        assert!(matches!(err, Err(PipelineError::Aggregate(_))));
        assert_eq!(end, before);
    }

    #[test]
    fn done_count_is_bounded_by_total() {
        let mut end = proportional_end();
        for id in ["A", "B"] {
            adjust_proportional_end_result(&mut end, &cc(id, true, [1, 1]), AdjustmentMode::Add).unwrap();
        }
        assert!(end.all_counting_circles_done());
        let third = adjust_proportional_end_result(&mut end, &cc("C", true, [1, 1]), AdjustmentMode::Add);
        assert!(matches!(third, Err(PipelineError::Aggregate(_))));
        let dup = rebuild_proportional_end_result(&mut end, &[cc("A", true, [1, 1]), cc("A", true, [1, 1])]);
        assert!(matches!(dup, Err(PipelineError::Aggregate(_))));
    }

    #[test]
    fn majority_unknown_candidate_is_rejected() {
        let mut end = MajorityElectionEndResult {
            election_id: "SR".parse().unwrap(),
            number_of_mandates: 1,
            mandate_algorithm: am_core::variables::MajorityElectionMandateAlgorithm::AbsoluteMajority,
            count_of_done_counting_circles: 0,
            total_count_of_counting_circles: 1,
            accounted_ballots: 0,
            individual_vote_count: 0,
            empty_vote_count: 0,
            invalid_vote_count: 0,
            candidate_end_results: vec![CandidateEndResult::new("A".parse().unwrap(), ElectionKind::Primary, 0)],
            secondary_end_results: vec![],
            calculation: Default::default(),
        };
        let result = MajorityElectionResult {
            counting_circle_id: "C1".parse().unwrap(),
            done: true,
            accounted_ballots: 10,
            individual_vote_count: 0,
            empty_vote_count: 0,
            invalid_vote_count: 0,
            candidate_results: vec![CandidateResult { candidate_id: "Z".parse().unwrap(), vote_count: 3 }],
            secondary_results: vec![],
        };
        let err = adjust_majority_end_result(&mut end, &result, AdjustmentMode::Add);
        assert!(matches!(err, Err(PipelineError::Aggregate(_))));
        assert_eq!(end.accounted_ballots, 0);
    }
}
