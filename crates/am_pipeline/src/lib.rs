//! am_pipeline — recompute orchestration (aggregate → rank/apportion → write back).
//! This crate stays I/O-free: requests arrive typed from `am_io`, the math
//! lives in `am_algo`, and the populated end result goes back to the caller.

#![forbid(unsafe_code)]

use am_algo::{DoubleProportionalError, HagenbachBischoffError, MajorityError};
use am_io::loader::{CalculationRequest, ElectionRequest};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

pub mod aggregate;
pub mod batch;
pub mod double_proportional;
pub mod majority;
pub mod proportional;

pub use aggregate::AdjustmentMode;
pub use batch::{recalculate_all, Parallel};
pub use double_proportional::DoubleProportionalOutcome;
pub use proportional::ProportionalOutcome;

use am_core::entities::MajorityElectionEndResult;

/// Single error surface for the orchestration, bucketed by cause.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Request data the engines cannot accept (unknown ids, bad lot decisions).
    #[error("validation: {0}")]
    Validation(String),
    /// Canton settings that do not fit the election.
    #[error("configuration: {0}")]
    Configuration(String),
    /// An engine invariant failed; indicates a caller or engine bug.
    #[error("invariant: {0}")]
    Invariant(String),
    #[error("io: {0}")]
    Io(String),
    /// Counting-circle results do not add up.
    #[error("aggregate: {0}")]
    Aggregate(String),
}

impl From<am_io::IoError> for PipelineError {
    fn from(e: am_io::IoError) -> Self {
        use am_io::IoError;
        match e {
            IoError::Json { pointer, msg } => PipelineError::Validation(format!("json {pointer}: {msg}")),
            IoError::Invalid(m) => PipelineError::Validation(m),
            IoError::Path(m) => PipelineError::Io(format!("path: {m}")),
            IoError::Hash(m) => PipelineError::Io(format!("hash: {m}")),
        }
    }
}

impl From<MajorityError> for PipelineError {
    fn from(e: MajorityError) -> Self {
        match e {
            MajorityError::ZeroMandates => PipelineError::Configuration(e.to_string()),
            MajorityError::Overflow | MajorityError::Core(_) => PipelineError::Invariant(e.to_string()),
            MajorityError::UnknownCandidate(_)
            | MajorityError::LotDecisionNotEnabled(_)
            | MajorityError::RankOutsideTieGroup { .. }
            | MajorityError::DuplicateLotDecisionRank(_) => PipelineError::Validation(e.to_string()),
        }
    }
}

impl From<HagenbachBischoffError> for PipelineError {
    fn from(e: HagenbachBischoffError) -> Self {
        match e {
            HagenbachBischoffError::DuplicateList(_)
            | HagenbachBischoffError::SubListUnionWithoutUnion(_)
            | HagenbachBischoffError::SubListUnionInMultipleUnions(_)
            | HagenbachBischoffError::MisplacedGroup(_) => PipelineError::Validation(e.to_string()),
            HagenbachBischoffError::SeatsNotConserved { .. }
            | HagenbachBischoffError::Overflow
            | HagenbachBischoffError::Core(_) => PipelineError::Invariant(e.to_string()),
        }
    }
}

impl From<DoubleProportionalError> for PipelineError {
    fn from(e: DoubleProportionalError) -> Self {
        match e {
            DoubleProportionalError::ColumnLengthMismatch { .. }
            | DoubleProportionalError::DuplicateColumn(_)
            | DoubleProportionalError::DuplicateElection(_)
            | DoubleProportionalError::Infeasible(_)
            | DoubleProportionalError::InfeasibleColumn(_) => PipelineError::Validation(e.to_string()),
            DoubleProportionalError::NoConvergence(_)
            | DoubleProportionalError::UnresolvedCycle(_)
            | DoubleProportionalError::Overflow => PipelineError::Invariant(e.to_string()),
        }
    }
}

/// Populated end result of one recompute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndResult {
    Majority(MajorityElectionEndResult),
    Proportional(ProportionalOutcome),
    ProportionalUnion(DoubleProportionalOutcome),
}

impl EndResult {
    /// A human lot decision is owed before the result can be published.
    pub fn lot_decision_required(&self) -> bool {
        match self {
            EndResult::Majority(e) => {
                e.candidate_end_results.iter().any(|c| c.lot_decision_required)
                    || e.secondary_end_results
                        .iter()
                        .flat_map(|s| &s.candidate_end_results)
                        .any(|c| c.lot_decision_required)
            }
            EndResult::Proportional(p) => p.lot_decision_required,
            EndResult::ProportionalUnion(u) => u.lot_decision_required,
        }
    }
}

/// Recompute one request end to end.
///
/// Counting-circle results, when present, replace the tallies of the end
/// result before the configured engine runs.
pub fn recalculate(request: CalculationRequest) -> Result<EndResult, PipelineError> {
    let CalculationRequest { settings, election } = request;
    let out = match election {
        ElectionRequest::Majority(mut m) => {
            if !m.counting_circle_results.is_empty() {
                aggregate::rebuild_majority_end_result(&mut m.end_result, &m.counting_circle_results)?;
            }
            majority::recalculate_majority_end_result(&mut m.end_result, &settings, &m.lot_decisions)?;
            EndResult::Majority(m.end_result)
        }
        ElectionRequest::Proportional(mut p) => {
            if !p.counting_circle_results.is_empty() {
                aggregate::rebuild_proportional_end_result(&mut p.end_result, &p.counting_circle_results)?;
            }
            let algorithm = settings.proportional_election_mandate_algorithm;
            if algorithm.is_double_proportional() {
                EndResult::Proportional(double_proportional::recalculate_single(
                    p.end_result,
                    algorithm,
                    p.double_proportional_lot_decision.as_ref(),
                )?)
            } else {
                EndResult::Proportional(proportional::recalculate(p.end_result, &p.lot_decisions)?)
            }
        }
        ElectionRequest::ProportionalUnion(u) => EndResult::ProportionalUnion(double_proportional::recalculate_union(
            u.union,
            settings.proportional_election_mandate_algorithm,
            u.lot_decision.as_ref(),
        )?),
    };
    info!(canton = %settings.canton.as_str(), lot_decision_required = out.lot_decision_required(), "recompute done");
    Ok(out)
}
