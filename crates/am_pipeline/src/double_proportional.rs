//! Double-proportional recompute: single elections (lists as columns) and
//! election unions (union lists as columns), with cell seats written back
//! onto the lists of each election.

use am_algo::double_proportional::{
    apportion, lot_decision_scenarios, ColumnKey, DoubleProportionalColumnInput,
    DoubleProportionalInput, DoubleProportionalLotDecision, DoubleProportionalResult,
    DoubleProportionalRowInput,
};
use am_core::entities::{ProportionalElectionEndResult, ProportionalElectionUnionEndResult};
use am_core::ids::ListId;
use am_core::variables::ProportionalElectionMandateAlgorithm;
use serde::Serialize;
use tracing::{info, warn};

use crate::proportional::{reset_mandates, ProportionalOutcome};
use crate::PipelineError;

/// Union end result plus the seat matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoubleProportionalOutcome {
    pub union: ProportionalElectionUnionEndResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub double_proportional: Option<DoubleProportionalResult>,
    pub lot_decision_required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lot_decision_scenarios: Vec<DoubleProportionalLotDecision>,
}

// ------------------------------- Single election -------------------------------

/// One row; every list is a column.
pub fn build_single_input(end: &ProportionalElectionEndResult) -> DoubleProportionalInput {
    DoubleProportionalInput {
        rows: vec![DoubleProportionalRowInput {
            election_id: end.election_id.clone(),
            number_of_mandates: end.number_of_mandates,
        }],
        columns: end
            .list_end_results
            .iter()
            .map(|l| DoubleProportionalColumnInput {
                key: ColumnKey::List(l.list_id.clone()),
                vote_counts: vec![l.vote_count],
            })
            .collect(),
    }
}

pub fn recalculate_single(
    mut end: ProportionalElectionEndResult,
    algorithm: ProportionalElectionMandateAlgorithm,
    lot_decision: Option<&DoubleProportionalLotDecision>,
) -> Result<ProportionalOutcome, PipelineError> {
    if algorithm.is_union() {
        return Err(PipelineError::Configuration(format!(
            "{algorithm:?} distributes over a union of elections, not a single election"
        )));
    }
    reset_mandates(&mut end);
    if !end.all_counting_circles_done() {
        info!(election = %end.election_id, "counting incomplete; double-proportional distribution skipped");
        return Ok(ProportionalOutcome::pending(end));
    }

    let result = apportion(&build_single_input(&end), algorithm.quorum(), lot_decision)?;
    for cell in result.rows.iter().flat_map(|r| &r.cells) {
        if let ColumnKey::List(list_id) = &cell.column {
            let list = end
                .list_mut(list_id)
                .ok_or_else(|| PipelineError::Invariant(format!("apportioned unknown list {list_id}")))?;
            list.number_of_mandates = cell.number_of_mandates;
        }
    }
    end.mandate_distribution_triggered = result.is_complete();

    let scenarios = lot_decision_scenarios(&result, lot_decision);
    Ok(ProportionalOutcome {
        end_result: end,
        hagenbach_bischoff: None,
        lot_decision_required: result.lot_decision_required(),
        double_proportional: Some(result),
        hagenbach_bischoff_lot_decision_scenarios: Vec::new(),
        double_proportional_lot_decision_scenarios: scenarios,
    })
}

// ------------------------------- Union -------------------------------

/// Rows are the elections, columns the union lists. A cell sums the votes
/// of the election's lists in that union list.
pub fn build_union_input(union: &ProportionalElectionUnionEndResult) -> Result<DoubleProportionalInput, PipelineError> {
    for e in &union.elections {
        for l in &e.list_end_results {
            let owners = union.union_lists.iter().filter(|ul| ul.list_ids.contains(&l.list_id)).count();
            if owners != 1 {
                return Err(PipelineError::Validation(format!(
                    "list {} of election {} must belong to exactly one union list (found {owners})",
                    l.list_id, e.election_id
                )));
            }
        }
        for ul in &union.union_lists {
            if members_in(e, &ul.list_ids).count() > 1 {
                return Err(PipelineError::Validation(format!(
                    "union list {} has several lists in election {}",
                    ul.union_list_id, e.election_id
                )));
            }
        }
    }

    Ok(DoubleProportionalInput {
        rows: union
            .elections
            .iter()
            .map(|e| DoubleProportionalRowInput {
                election_id: e.election_id.clone(),
                number_of_mandates: e.number_of_mandates,
            })
            .collect(),
        columns: union
            .union_lists
            .iter()
            .map(|ul| DoubleProportionalColumnInput {
                key: ColumnKey::UnionList(ul.union_list_id.clone()),
                vote_counts: union
                    .elections
                    .iter()
                    .map(|e| members_in(e, &ul.list_ids).map(|l| l.vote_count).sum::<u64>())
                    .collect(),
            })
            .collect(),
    })
}

fn members_in<'a>(
    e: &'a ProportionalElectionEndResult,
    list_ids: &'a [ListId],
) -> impl Iterator<Item = &'a am_core::entities::ProportionalElectionListEndResult> {
    e.list_end_results.iter().filter(move |l| list_ids.contains(&l.list_id))
}

pub fn recalculate_union(
    mut union: ProportionalElectionUnionEndResult,
    algorithm: ProportionalElectionMandateAlgorithm,
    lot_decision: Option<&DoubleProportionalLotDecision>,
) -> Result<DoubleProportionalOutcome, PipelineError> {
    if !algorithm.is_union() {
        return Err(PipelineError::Configuration(format!("{algorithm:?} does not distribute over a union")));
    }
    for e in &mut union.elections {
        reset_mandates(e);
    }
    let input = build_union_input(&union)?;
    if !union.all_counting_circles_done() {
        info!(elections = union.elections.len(), "counting incomplete; union distribution skipped");
        return Ok(DoubleProportionalOutcome {
            union,
            double_proportional: None,
            lot_decision_required: false,
            lot_decision_scenarios: Vec::new(),
        });
    }

    let result = apportion(&input, algorithm.quorum(), lot_decision)?;
    write_back_union(&mut union, &result)?;
    if result.lot_decision_required() {
        warn!(elections = union.elections.len(), "union lot decision required");
    }
    info!(
        elections = union.elections.len(),
        union_lists = union.union_lists.len(),
        complete = result.is_complete(),
        "union end result recalculated"
    );
    Ok(DoubleProportionalOutcome {
        lot_decision_required: result.lot_decision_required(),
        lot_decision_scenarios: lot_decision_scenarios(&result, lot_decision),
        union,
        double_proportional: Some(result),
    })
}

fn write_back_union(
    union: &mut ProportionalElectionUnionEndResult,
    result: &DoubleProportionalResult,
) -> Result<(), PipelineError> {
    let complete = result.is_complete();
    let union_lists = union.union_lists.clone();
    for (e, row) in union.elections.iter_mut().zip(&result.rows) {
        for cell in &row.cells {
            let ColumnKey::UnionList(ul_id) = &cell.column else { continue };
            let Some(ul) = union_lists.iter().find(|ul| &ul.union_list_id == ul_id) else { continue };
            match e.list_end_results.iter_mut().find(|l| ul.list_ids.contains(&l.list_id)) {
                Some(list) => list.number_of_mandates = cell.number_of_mandates,
                None if cell.number_of_mandates == 0 => {}
                None => {
                    return Err(PipelineError::Invariant(format!(
                        "election {} got {} seats for union list {ul_id} without a list",
                        e.election_id, cell.number_of_mandates
                    )))
                }
            }
        }
        e.mandate_distribution_triggered = complete;
    }
    Ok(())
}
