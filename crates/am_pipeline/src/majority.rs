//! Majority-election recompute: primary pass, lot decisions, secondary pass.

use std::collections::BTreeMap;

use am_algo::majority::{
    apply_lot_decisions, recalculate_primary_candidate_end_result_states,
    recalculate_secondary_candidate_end_result_states,
};
use am_core::entities::{CandidateLotDecision, MajorityElectionEndResult};
use am_core::ids::ElectionId;
use am_core::variables::CantonSettings;
use tracing::{info, warn};

use crate::PipelineError;

/// Recompute ranks and states of the primary and every secondary election.
///
/// Lot decisions are keyed by election id and recorded after the first
/// ranking of their election, which is then ranked again.
pub fn recalculate_majority_end_result(
    end: &mut MajorityElectionEndResult,
    settings: &CantonSettings,
    lot_decisions: &BTreeMap<ElectionId, Vec<CandidateLotDecision>>,
) -> Result<(), PipelineError> {
    if let Some(unknown) = lot_decisions.keys().find(|id| {
        **id != end.election_id && !end.secondary_end_results.iter().any(|s| &s.election_id == *id)
    }) {
        return Err(PipelineError::Validation(format!("lot decisions for unknown election {unknown}")));
    }

    recalculate_primary_candidate_end_result_states(end, settings)?;
    if let Some(decisions) = lot_decisions.get(&end.election_id) {
        apply_lot_decisions(&mut end.candidate_end_results, decisions)?;
        recalculate_primary_candidate_end_result_states(end, settings)?;
    }

    recalculate_secondary_candidate_end_result_states(end, settings)?;
    let mut secondary_decided = false;
    for s in &mut end.secondary_end_results {
        if let Some(decisions) = lot_decisions.get(&s.election_id) {
            apply_lot_decisions(&mut s.candidate_end_results, decisions)?;
            secondary_decided = true;
        }
    }
    if secondary_decided {
        recalculate_secondary_candidate_end_result_states(end, settings)?;
    }

    let open = end
        .candidate_end_results
        .iter()
        .chain(end.secondary_end_results.iter().flat_map(|s| &s.candidate_end_results))
        .filter(|c| c.lot_decision_required)
        .count();
    if open > 0 {
        warn!(election = %end.election_id, candidates = open, "lot decision required");
    }
    info!(
        election = %end.election_id,
        absolute_majority = ?end.calculation.absolute_majority,
        elected = end.candidate_end_results.iter().filter(|c| c.state.is_elected()).count(),
        secondaries = end.secondary_end_results.len(),
        "majority end result recalculated"
    );
    Ok(())
}
