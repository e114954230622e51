//! Hagenbach-Bischoff recompute of one proportional election, with seats
//! written back onto the list end results.

use am_algo::hagenbach_bischoff::{
    apportion, lot_decision_scenarios, HagenbachBischoffList, HagenbachBischoffLotDecision,
    HagenbachBischoffResult,
};
use am_algo::double_proportional::{DoubleProportionalLotDecision, DoubleProportionalResult};
use am_core::entities::ProportionalElectionEndResult;
use serde::Serialize;
use tracing::{info, warn};

use crate::PipelineError;

/// End result plus the engine's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProportionalOutcome {
    pub end_result: ProportionalElectionEndResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hagenbach_bischoff: Option<HagenbachBischoffResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub double_proportional: Option<DoubleProportionalResult>,
    pub lot_decision_required: bool,
    /// Admissible joint outcomes of the open Hagenbach-Bischoff ties.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hagenbach_bischoff_lot_decision_scenarios: Vec<Vec<HagenbachBischoffLotDecision>>,
    /// Admissible outcomes of an open super-apportionment tie.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub double_proportional_lot_decision_scenarios: Vec<DoubleProportionalLotDecision>,
}

impl ProportionalOutcome {
    /// Counting is not complete: seats stay reset and no engine ran.
    pub(crate) fn pending(end_result: ProportionalElectionEndResult) -> Self {
        Self {
            end_result,
            hagenbach_bischoff: None,
            double_proportional: None,
            lot_decision_required: false,
            hagenbach_bischoff_lot_decision_scenarios: Vec::new(),
            double_proportional_lot_decision_scenarios: Vec::new(),
        }
    }
}

pub(crate) fn reset_mandates(end: &mut ProportionalElectionEndResult) {
    end.mandate_distribution_triggered = false;
    for l in &mut end.list_end_results {
        l.number_of_mandates = 0;
    }
}

fn lists_of(end: &ProportionalElectionEndResult) -> Vec<HagenbachBischoffList> {
    end.list_end_results
        .iter()
        .map(|l| HagenbachBischoffList {
            list_id: l.list_id.clone(),
            vote_count: l.vote_count,
            list_union: l.list_union.clone(),
            sub_list_union: l.sub_list_union.clone(),
        })
        .collect()
}

/// Apportion the election's seats over its lists and write them back.
///
/// Returns `None` while counting circles are outstanding; list seats are
/// reset in every case. With open ties the lists outside the tie keep their
/// seats and `mandate_distribution_triggered` stays false.
pub fn recalculate_number_of_mandates_for_lists(
    end: &mut ProportionalElectionEndResult,
    lot_decisions: &[HagenbachBischoffLotDecision],
) -> Result<Option<HagenbachBischoffResult>, PipelineError> {
    reset_mandates(end);
    if !end.all_counting_circles_done() {
        info!(
            election = %end.election_id,
            done = end.count_of_done_counting_circles,
            total = end.total_count_of_counting_circles,
            "counting incomplete; mandate distribution skipped"
        );
        return Ok(None);
    }

    let result = apportion(&lists_of(end), end.number_of_mandates, lot_decisions)?;
    for (list_id, seats) in result.list_mandates() {
        let list = end
            .list_mut(&list_id)
            .ok_or_else(|| PipelineError::Invariant(format!("apportioned unknown list {list_id}")))?;
        list.number_of_mandates = seats;
    }
    end.mandate_distribution_triggered = !result.lot_decision_required();
    if result.lot_decision_required() {
        warn!(election = %end.election_id, ties = result.open_ties.len(), "hagenbach-bischoff lot decision required");
    }
    Ok(Some(result))
}

/// Full recompute of one Hagenbach-Bischoff election.
pub fn recalculate(
    mut end: ProportionalElectionEndResult,
    lot_decisions: &[HagenbachBischoffLotDecision],
) -> Result<ProportionalOutcome, PipelineError> {
    let Some(result) = recalculate_number_of_mandates_for_lists(&mut end, lot_decisions)? else {
        return Ok(ProportionalOutcome::pending(end));
    };
    let scenarios = lot_decision_scenarios(&result);
    Ok(ProportionalOutcome {
        end_result: end,
        lot_decision_required: result.lot_decision_required(),
        hagenbach_bischoff: Some(result),
        double_proportional: None,
        hagenbach_bischoff_lot_decision_scenarios: scenarios,
        double_proportional_lot_decision_scenarios: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use am_core::entities::ProportionalElectionListEndResult;

    fn end(votes: &[(&str, u64, Option<&str>)], seats: u32, done: u32) -> ProportionalElectionEndResult {
        ProportionalElectionEndResult {
            election_id: "NR".parse().unwrap(),
            number_of_mandates: seats,
            count_of_done_counting_circles: done,
            total_count_of_counting_circles: 1,
            list_end_results: votes
                .iter()
                .map(|(id, v, u)| ProportionalElectionListEndResult {
                    list_id: id.parse().unwrap(),
                    list_union: u.map(|u| u.parse().unwrap()),
                    sub_list_union: None,
                    vote_count: *v,
                    number_of_mandates: 7,
                })
                .collect(),
            mandate_distribution_triggered: true,
        }
    }

    fn seats(e: &ProportionalElectionEndResult) -> Vec<u32> {
        e.list_end_results.iter().map(|l| l.number_of_mandates).collect()
    }

    #[test]
    fn seats_are_written_back() {
        let mut e = end(&[("a", 6000, None), ("b", 3000, None), ("c", 1000, None)], 4, 1);
        let r = recalculate_number_of_mandates_for_lists(&mut e, &[]).unwrap().unwrap();
        assert_eq!(seats(&e), vec![3, 1, 0]);
        assert_eq!(r.distributed(), 4);
        assert!(e.mandate_distribution_triggered);
    }

    #[test]
    fn incomplete_counting_resets_seats() {
        let mut e = end(&[("a", 6000, None)], 4, 0);
        assert!(recalculate_number_of_mandates_for_lists(&mut e, &[]).unwrap().is_none());
        assert_eq!(seats(&e), vec![0]);
        assert!(!e.mandate_distribution_triggered);
    }

    #[test]
    fn open_tie_is_reported_with_scenarios() {
        let out = recalculate(end(&[("a", 500, Some("U")), ("b", 500, Some("U"))], 1, 1), &[]).unwrap();
        assert!(out.lot_decision_required);
        assert!(!out.end_result.mandate_distribution_triggered);
        assert_eq!(out.hagenbach_bischoff_lot_decision_scenarios.len(), 2);

        let decided = recalculate(
            end(&[("a", 500, Some("U")), ("b", 500, Some("U"))], 1, 1),
            &out.hagenbach_bischoff_lot_decision_scenarios[1],
        )
        .unwrap();
        assert!(!decided.lot_decision_required);
        assert_eq!(decided.end_result.distributed_number_of_mandates(), 1);
    }
}
