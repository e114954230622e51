//! End-result entities of majority and proportional elections, and the
//! per-counting-circle results they are aggregated from.
//!
//! These records are handed to the mandate engines fully hydrated and come back
//! fully populated; the engines never load or persist anything themselves.

use serde::{Deserialize, Serialize};

use crate::ids::{CandidateId, CountingCircleId, ElectionId, ListId, ListUnionId, UnionListId};
use crate::rounding::{Decimal, Ratio};
use crate::variables::MajorityElectionMandateAlgorithm;

/// Primary election or secondary (linked) election.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionKind {
    Primary,
    Secondary,
}

/// Derived candidate state, recomputed from scratch on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateEndResultState {
    /// Not all counting circles are done, or a lot decision is outstanding.
    #[default]
    Pending,
    Elected,
    NotElected,
    AbsoluteMajorityAndElected,
    AbsoluteMajorityAndNotElectedInsufficientNumberOfMandates,
    NoAbsoluteMajorityAndNotElectedButRankOk,
    /// Secondary candidate whose referenced primary candidate was not elected.
    NotEligibleInPrimary,
}

impl CandidateEndResultState {
    #[inline]
    pub fn is_elected(self) -> bool {
        matches!(self, Self::Elected | Self::AbsoluteMajorityAndElected)
    }
}

/// One candidate's end result; primary and secondary share this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEndResult {
    pub candidate_id: CandidateId,
    pub kind: ElectionKind,
    /// Secondary candidates may reference the same person in the primary election.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_reference: Option<CandidateId>,
    pub vote_count: u64,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub lot_decision: bool,
    #[serde(default)]
    pub lot_decision_enabled: bool,
    #[serde(default)]
    pub lot_decision_required: bool,
    #[serde(default)]
    pub state: CandidateEndResultState,
}

impl CandidateEndResult {
    pub fn new(candidate_id: CandidateId, kind: ElectionKind, vote_count: u64) -> Self {
        Self {
            candidate_id,
            kind,
            candidate_reference: None,
            vote_count,
            rank: 0,
            lot_decision: false,
            lot_decision_enabled: false,
            lot_decision_required: false,
            state: CandidateEndResultState::Pending,
        }
    }

    pub fn with_reference(mut self, primary: CandidateId) -> Self {
        self.candidate_reference = Some(primary);
        self
    }
}

/// Externally recorded lot decision: the rank a tied candidate was drawn to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLotDecision {
    pub candidate_id: CandidateId,
    pub rank: u32,
}

/// Absolute-majority calculation of one election.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MajorityElectionEndResultCalculation {
    /// Accounted ballots or candidate votes, depending on the formula.
    pub decisive_vote_count: u64,
    pub absolute_majority: Option<u64>,
    pub absolute_majority_threshold: Option<Ratio>,
    /// Threshold rounded to one decimal, half away from zero.
    pub absolute_majority_threshold_rounded: Option<Decimal>,
}

/// Secondary (linked) election inside a majority end result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryMajorityElectionEndResult {
    pub election_id: ElectionId,
    pub number_of_mandates: u32,
    #[serde(default)]
    pub individual_vote_count: u64,
    #[serde(default)]
    pub empty_vote_count: u64,
    #[serde(default)]
    pub invalid_vote_count: u64,
    pub candidate_end_results: Vec<CandidateEndResult>,
    #[serde(skip_deserializing)]
    pub calculation: MajorityElectionEndResultCalculation,
}

impl SecondaryMajorityElectionEndResult {
    pub fn total_candidate_vote_count_incl_individual(&self) -> u64 {
        total_votes(&self.candidate_end_results) + self.individual_vote_count
    }
}

/// Primary election end result with its secondary elections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityElectionEndResult {
    pub election_id: ElectionId,
    pub number_of_mandates: u32,
    pub mandate_algorithm: MajorityElectionMandateAlgorithm,
    pub count_of_done_counting_circles: u32,
    pub total_count_of_counting_circles: u32,
    pub accounted_ballots: u64,
    #[serde(default)]
    pub individual_vote_count: u64,
    #[serde(default)]
    pub empty_vote_count: u64,
    #[serde(default)]
    pub invalid_vote_count: u64,
    pub candidate_end_results: Vec<CandidateEndResult>,
    #[serde(default)]
    pub secondary_end_results: Vec<SecondaryMajorityElectionEndResult>,
    #[serde(skip_deserializing)]
    pub calculation: MajorityElectionEndResultCalculation,
}

impl MajorityElectionEndResult {
    #[inline]
    pub fn all_counting_circles_done(&self) -> bool {
        self.count_of_done_counting_circles == self.total_count_of_counting_circles
    }

    pub fn total_candidate_vote_count_incl_individual(&self) -> u64 {
        total_votes(&self.candidate_end_results) + self.individual_vote_count
    }
}

fn total_votes(candidates: &[CandidateEndResult]) -> u64 {
    candidates.iter().map(|c| c.vote_count).sum()
}

/* ------------------------- Proportional elections ------------------------- */

/// One list of a proportional election, with its union memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionalElectionListEndResult {
    pub list_id: ListId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_union: Option<ListUnionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_list_union: Option<ListUnionId>,
    #[serde(default)]
    pub vote_count: u64,
    /// Written back by the apportionment.
    #[serde(default)]
    pub number_of_mandates: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionalElectionEndResult {
    pub election_id: ElectionId,
    pub number_of_mandates: u32,
    #[serde(default)]
    pub count_of_done_counting_circles: u32,
    pub total_count_of_counting_circles: u32,
    pub list_end_results: Vec<ProportionalElectionListEndResult>,
    /// Set once seats were written back from a complete apportionment.
    #[serde(default)]
    pub mandate_distribution_triggered: bool,
}

impl ProportionalElectionEndResult {
    #[inline]
    pub fn all_counting_circles_done(&self) -> bool {
        self.count_of_done_counting_circles == self.total_count_of_counting_circles
    }

    pub fn total_vote_count(&self) -> u64 {
        self.list_end_results.iter().map(|l| l.vote_count).sum()
    }

    pub fn distributed_number_of_mandates(&self) -> u32 {
        self.list_end_results.iter().map(|l| l.number_of_mandates).sum()
    }

    pub fn list_mut(&mut self, list_id: &ListId) -> Option<&mut ProportionalElectionListEndResult> {
        self.list_end_results.iter_mut().find(|l| &l.list_id == list_id)
    }
}

/// Union-wide list: the lists of several elections that run under one name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionList {
    pub union_list_id: UnionListId,
    pub list_ids: Vec<ListId>,
}

/// Elections apportioned together by the double-proportional method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionalElectionUnionEndResult {
    pub elections: Vec<ProportionalElectionEndResult>,
    pub union_lists: Vec<UnionList>,
}

impl ProportionalElectionUnionEndResult {
    pub fn all_counting_circles_done(&self) -> bool {
        self.elections.iter().all(ProportionalElectionEndResult::all_counting_circles_done)
    }
}

/* -------------------------- Counting-circle results ------------------------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub candidate_id: CandidateId,
    pub vote_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryMajorityElectionResult {
    pub election_id: ElectionId,
    #[serde(default)]
    pub individual_vote_count: u64,
    #[serde(default)]
    pub empty_vote_count: u64,
    #[serde(default)]
    pub invalid_vote_count: u64,
    pub candidate_results: Vec<CandidateResult>,
}

/// Majority-election result submitted by one counting circle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityElectionResult {
    pub counting_circle_id: CountingCircleId,
    /// Only done results contribute to the end result.
    pub done: bool,
    pub accounted_ballots: u64,
    #[serde(default)]
    pub individual_vote_count: u64,
    #[serde(default)]
    pub empty_vote_count: u64,
    #[serde(default)]
    pub invalid_vote_count: u64,
    pub candidate_results: Vec<CandidateResult>,
    #[serde(default)]
    pub secondary_results: Vec<SecondaryMajorityElectionResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResult {
    pub list_id: ListId,
    pub vote_count: u64,
}

/// Proportional-election result submitted by one counting circle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionalElectionResult {
    pub counting_circle_id: CountingCircleId,
    pub done: bool,
    pub list_results: Vec<ListResult>,
}
