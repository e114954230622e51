//! Hagenbach-Bischoff apportionment with list unions and sub-list unions.
//!
//! Entry point: `apportion(lists, seats, lot_decisions)`. The result carries
//! the full group tree with quotients, distribution numbers and every
//! calculation round, plus ties still waiting for a lot decision.

mod distribute;
mod tree;

pub use distribute::{HagenbachBischoffLotDecision, OpenTie, UndistributedMandates};
pub use tree::{
    CalculationRound, Group, GroupId, GroupKey, GroupTree, GroupValues, HagenbachBischoffList,
    WinnerReason,
};

use am_core::ids::{ListId, ListUnionId};
use am_core::CoreError;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::combinatorics::{combinations, seat_outcomes};

#[derive(Debug, Error)]
pub enum HagenbachBischoffError {
    #[error("list {0} appears more than once")]
    DuplicateList(ListId),
    #[error("list {0} has a sub-list union but no list union")]
    SubListUnionWithoutUnion(ListId),
    #[error("sub-list union {0} belongs to more than one list union")]
    SubListUnionInMultipleUnions(ListUnionId),
    #[error("group {0:?} attached to two parents")]
    MisplacedGroup(GroupKey),
    #[error("seats not conserved: expected {expected}, distributed {actual}")]
    SeatsNotConserved { expected: u32, actual: u32 },
    #[error("seat or quotient out of range")]
    Overflow,
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Outcome of one apportionment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HagenbachBischoffResult {
    pub number_of_mandates: u32,
    pub tree: GroupTree,
    /// Empty once every tie is decided.
    pub open_ties: Vec<OpenTie>,
    /// Seats left over where only zero-vote groups competed.
    pub undistributed: Vec<UndistributedMandates>,
}

impl HagenbachBischoffResult {
    /// Seats per list in input order.
    pub fn list_mandates(&self) -> Vec<(ListId, u32)> {
        self.tree
            .lists()
            .filter_map(|g| match &g.key {
                GroupKey::List(id) => Some((id.clone(), g.number_of_mandates)),
                _ => None,
            })
            .collect()
    }

    #[inline]
    pub fn lot_decision_required(&self) -> bool {
        !self.open_ties.is_empty()
    }

    pub fn distributed(&self) -> u32 {
        self.tree.lists().map(|g| g.number_of_mandates).sum()
    }
}

/// Distribute `number_of_mandates` seats over `lists`.
///
/// Zero votes everywhere yields zero seats everywhere. A tie larger than the
/// seats left at its level is resolved only by a matching entry in
/// `lot_decisions`; otherwise it is reported in `open_ties` and the seats of
/// that level stay unassigned.
pub fn apportion(
    lists: &[HagenbachBischoffList],
    number_of_mandates: u32,
    lot_decisions: &[HagenbachBischoffLotDecision],
) -> Result<HagenbachBischoffResult, HagenbachBischoffError> {
    let mut tree = GroupTree::build(lists)?;
    let mut open_ties = Vec::new();
    let mut undistributed = Vec::new();
    distribute::distribute(
        &mut tree,
        GroupTree::ROOT,
        number_of_mandates,
        lot_decisions,
        &mut open_ties,
        &mut undistributed,
    )?;

    let result = HagenbachBischoffResult { number_of_mandates, tree, open_ties, undistributed };
    let distributed = result.distributed();
    if result.open_ties.is_empty() && result.undistributed.is_empty() && distributed != number_of_mandates {
        return Err(HagenbachBischoffError::SeatsNotConserved {
            expected: number_of_mandates,
            actual: distributed,
        });
    }
    info!(
        lists = lists.len(),
        seats = number_of_mandates,
        distributed,
        open_ties = result.open_ties.len(),
        "hagenbach-bischoff apportionment done"
    );
    Ok(result)
}

/// Every joint outcome of the currently open ties, one decision per tie.
///
/// Resolving a tie can expose further ties deeper in the tree; rerun with
/// the chosen decisions to enumerate those.
pub fn lot_decision_scenarios(result: &HagenbachBischoffResult) -> Vec<Vec<HagenbachBischoffLotDecision>> {
    let per_tie: Vec<Vec<HagenbachBischoffLotDecision>> = result
        .open_ties
        .iter()
        .map(|tie| {
            seat_outcomes(tie.candidates.len(), tie.number_of_mandates as usize)
                .map(|pick| HagenbachBischoffLotDecision {
                    group: tie.group.clone(),
                    winners: tie
                        .candidates
                        .iter()
                        .zip(&pick)
                        .filter(|(_, won)| **won == 1)
                        .map(|(k, _)| k.clone())
                        .collect(),
                })
                .collect()
        })
        .collect();
    if per_tie.is_empty() {
        return Vec::new();
    }
    combinations(&per_tie).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(id: &str, votes: u64, union: Option<&str>, sub: Option<&str>) -> HagenbachBischoffList {
        HagenbachBischoffList {
            list_id: id.parse().unwrap(),
            vote_count: votes,
            list_union: union.map(|u| u.parse().unwrap()),
            sub_list_union: sub.map(|s| s.parse().unwrap()),
        }
    }

    fn seats(r: &HagenbachBischoffResult) -> Vec<u32> {
        r.list_mandates().into_iter().map(|(_, s)| s).collect()
    }

    fn media_fixture() -> Vec<HagenbachBischoffList> {
        vec![
            list("L1", 13000, Some("A"), Some("A1")),
            list("L2", 7000, Some("A"), Some("A1")),
            list("L3", 5000, Some("A"), Some("A2")),
            list("L4", 3000, Some("A"), Some("A2")),
            list("L5", 12000, Some("B"), None),
            list("L6", 5000, Some("B"), None),
            list("L7", 10000, Some("C"), None),
            list("L8", 3000, Some("C"), None),
            list("L9", 2000, Some("C"), None),
        ]
    }

    #[test]
    fn list_union_recursion_example() {
        let r = apportion(&media_fixture(), 5, &[]).unwrap();
        assert_eq!(seats(&r), vec![1, 1, 1, 0, 1, 0, 1, 0, 0]);
        let root = r.tree.root();
        assert_eq!(root.quotient.to_string(), "10000");
        assert_eq!(root.distribution_number, 10001);
        assert_eq!(root.calculation_rounds.len(), 1);
        let round = &root.calculation_rounds[0];
        assert_eq!(round.winner, GroupKey::ListUnion("A".parse().unwrap()));
        assert_eq!(round.winner_reason, WinnerReason::Quotient);
        let a = r.tree.by_key(&GroupKey::ListUnion("A".parse().unwrap())).unwrap();
        assert_eq!((a.initial_number_of_mandates, a.number_of_mandates), (2, 3));
        assert!(!r.lot_decision_required());
    }

    #[test]
    fn flat_lists_follow_largest_quotients() {
        let r = apportion(
            &[list("a", 6000, None, None), list("b", 3000, None, None), list("c", 1000, None, None)],
            4,
            &[],
        )
        .unwrap();
        // quotient 2000, dn 2001: initial 2/1/0, round → a (6000/3=2000 > 1500 > 1000)
        assert_eq!(seats(&r), vec![3, 1, 0]);
        assert_eq!(r.distributed(), 4);
    }

    #[test]
    fn zero_votes_yield_zero_seats() {
        let r = apportion(&[list("a", 0, None, None), list("b", 0, Some("U"), None)], 3, &[]).unwrap();
        assert_eq!(seats(&r), vec![0, 0]);
        assert!(r.open_ties.is_empty());
        assert_eq!(r.undistributed.len(), 1);
        assert_eq!(r.undistributed[0].number_of_mandates, 3);
    }

    #[test]
    fn zero_seats_is_a_no_op() {
        let r = apportion(&[list("a", 10, None, None)], 0, &[]).unwrap();
        assert_eq!(seats(&r), vec![0]);
        assert!(r.tree.root().calculation_rounds.is_empty());
    }

    #[test]
    fn previous_quotient_chains_from_next() {
        let r = apportion(
            &[
                list("a", 10, None, None),
                list("b", 9, None, None),
                list("c", 8, None, None),
                list("d", 7, None, None),
            ],
            2,
            &[],
        )
        .unwrap();
        let rounds = &r.tree.root().calculation_rounds;
        assert_eq!(rounds.len(), 2);
        for w in rounds.windows(2) {
            for (prev, next) in w[0].group_values.iter().zip(&w[1].group_values) {
                assert_eq!(prev.group, next.group);
                assert_eq!(prev.next_quotient, next.previous_quotient);
                assert_eq!(prev.number_of_mandates, next.previous_number_of_mandates);
            }
        }
    }

    #[test]
    fn tie_requires_lot_decision_and_applies_it() {
        let lists = [list("a", 500, None, None), list("b", 500, None, None)];
        let open = apportion(&lists, 1, &[]).unwrap();
        assert!(open.lot_decision_required());
        assert_eq!(seats(&open), vec![0, 0]);
        assert_eq!(open.open_ties[0].number_of_mandates, 1);

        let scenarios = lot_decision_scenarios(&open);
        assert_eq!(scenarios.len(), 2);
        for scenario in &scenarios {
            let decided = apportion(&lists, 1, scenario).unwrap();
            assert!(!decided.lot_decision_required());
            assert_eq!(decided.distributed(), 1);
            let round = &decided.tree.root().calculation_rounds[0];
            assert_eq!(round.winner_reason, WinnerReason::LotDecision);
            assert_eq!(round.winner, scenario[0].winners[0]);
        }
    }

    #[test]
    fn tie_within_remaining_seats_needs_no_decision() {
        let r = apportion(&[list("a", 500, None, None), list("b", 500, None, None)], 2, &[]).unwrap();
        assert_eq!(seats(&r), vec![1, 1]);
        assert!(!r.lot_decision_required());
    }

    #[test]
    fn scenarios_combine_independent_ties() {
        let lists = [
            list("a", 100, Some("U"), None),
            list("b", 100, Some("U"), None),
            list("c", 100, Some("V"), None),
            list("d", 100, Some("V"), None),
        ];
        let r = apportion(&lists, 2, &[]).unwrap();
        assert_eq!(r.open_ties.len(), 2);
        let scenarios = lot_decision_scenarios(&r);
        assert_eq!(scenarios.len(), 4);
        let decided = apportion(&lists, 2, &scenarios[3]).unwrap();
        assert!(!decided.lot_decision_required());
        assert_eq!(decided.distributed(), 2);
    }

    #[test]
    fn rerun_is_identical() {
        let a = apportion(&media_fixture(), 5, &[]).unwrap();
        let b = apportion(&media_fixture(), 5, &[]).unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }
}
