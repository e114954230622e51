// crates/am_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Mandate engines. Pure, synchronous and I/O-free: every call builds its own
//! tree or matrix from the inputs and returns a fresh result, so independent
//! elections can be recomputed on parallel threads without coordination.

// Core IDs and settings used across the engines
pub use am_core::{
    entities::{CandidateEndResult, CandidateLotDecision, MajorityElectionEndResult},
    variables::{CantonSettings, DoubleProportionalQuorum},
};

// ----------------------------- Tie enumeration --------------------------------------

pub mod combinatorics;

pub use combinatorics::{combinations, seat_outcomes, unique_permutations};

// ----------------------------- Majority elections -----------------------------------

pub mod majority;

pub use majority::{
    apply_lot_decisions, calculate_absolute_majority,
    recalculate_primary_candidate_end_result_states,
    recalculate_secondary_candidate_end_result_states, MajorityError,
};

// ----------------------------- Proportional elections -------------------------------

pub mod hagenbach_bischoff;
pub mod double_proportional;

// Tight, explicit re-exports (avoid wildcard export drift).
pub use hagenbach_bischoff::{
    lot_decision_scenarios, HagenbachBischoffError, HagenbachBischoffList,
    HagenbachBischoffLotDecision, HagenbachBischoffResult,
};
pub use double_proportional::{
    CellKey, ColumnKey, DoubleProportionalError,
    DoubleProportionalInput, DoubleProportionalLotDecision, DoubleProportionalResult,
};
