//! Property tests for the apportionment engines and tie enumeration.

use std::collections::BTreeSet;

use am_algo::combinatorics::unique_permutations;
use am_algo::double_proportional::{
    self, lot_decision_scenarios, ColumnKey, DoubleProportionalColumnInput, DoubleProportionalError,
    DoubleProportionalInput, DoubleProportionalResult, DoubleProportionalRowInput,
};
use am_algo::hagenbach_bischoff::{self, HagenbachBischoffList};
use am_core::variables::DoubleProportionalQuorum;
use proptest::prelude::*;

fn lists_from(votes: &[u64], unions: u8) -> Vec<HagenbachBischoffList> {
    votes
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let union = (unions > 0 && i % 3 != 0).then(|| format!("U{}", i as u8 % unions));
            let sub = union.as_ref().filter(|_| i % 2 == 0).map(|u| format!("{u}-S"));
            HagenbachBischoffList {
                list_id: format!("L{i}").parse().unwrap(),
                vote_count: v,
                list_union: union.map(|u| u.parse().unwrap()),
                sub_list_union: sub.map(|s| s.parse().unwrap()),
            }
        })
        .collect()
}

/// `votes[j][i]`: votes of column `j` in row `i`.
fn matrix_input(row_seats: &[u32], votes: &[Vec<u64>]) -> DoubleProportionalInput {
    DoubleProportionalInput {
        rows: row_seats
            .iter()
            .enumerate()
            .map(|(i, &s)| DoubleProportionalRowInput { election_id: format!("E{i}").parse().unwrap(), number_of_mandates: s })
            .collect(),
        columns: votes
            .iter()
            .enumerate()
            .map(|(j, v)| DoubleProportionalColumnInput {
                key: ColumnKey::UnionList(format!("U{j}").parse().unwrap()),
                vote_counts: v.clone(),
            })
            .collect(),
    }
}

/// Row and column sums of the cells match the election seats and the
/// super-apportionment.
fn marginals_hold(r: &DoubleProportionalResult) -> bool {
    r.rows
        .iter()
        .all(|row| row.cells.iter().map(|c| c.number_of_mandates).sum::<u32>() == row.number_of_mandates)
        && r.columns.iter().enumerate().all(|(j, c)| {
            r.rows.iter().map(|row| row.cells[j].number_of_mandates).sum::<u32>()
                == c.super_apportionment_number_of_mandates
        })
}

/// Small vote values repeat often, so exact ties and empty cells show up.
fn cell_votes() -> impl Strategy<Value = u64> {
    prop_oneof![Just(0u64), Just(100), Just(200), Just(300), 1u64..2_000]
}

fn matrices() -> impl Strategy<Value = (Vec<u32>, Vec<Vec<u64>>)> {
    (2usize..=6, 2usize..=7).prop_flat_map(|(rows, cols)| {
        (
            prop::collection::vec(0u32..6, rows),
            prop::collection::vec(prop::collection::vec(cell_votes(), rows), cols),
        )
    })
}

fn factorial(n: usize) -> usize {
    (1..=n).product()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn hagenbach_bischoff_conserves_seats(
        votes in prop::collection::vec(0u64..20_000, 1..10),
        seats in 0u32..25,
        unions in 0u8..3,
    ) {
        let lists = lists_from(&votes, unions);
        let r = hagenbach_bischoff::apportion(&lists, seats, &[]).unwrap();
        let total: u64 = votes.iter().sum();
        if total > 0 && !r.lot_decision_required() {
            prop_assert_eq!(r.distributed(), seats);
        } else {
            prop_assert!(r.distributed() <= seats);
        }
        for g in r.tree.groups() {
            let initial: u32 = g.children.iter().map(|&c| r.tree.get(c).initial_number_of_mandates).sum();
            prop_assert!(initial <= g.number_of_mandates);
            if g.vote_count == 0 {
                prop_assert_eq!(g.number_of_mandates, 0);
            }
        }
    }

    #[test]
    fn hagenbach_bischoff_zero_votes_give_zero_seats(n in 1usize..8, seats in 0u32..20, unions in 0u8..3) {
        let lists = lists_from(&vec![0; n], unions);
        let r = hagenbach_bischoff::apportion(&lists, seats, &[]).unwrap();
        prop_assert!(r.list_mandates().iter().all(|(_, s)| *s == 0));
        prop_assert!(!r.lot_decision_required());
    }

    #[test]
    fn hagenbach_bischoff_is_idempotent_with_chained_quotients(
        votes in prop::collection::vec(1u64..5_000, 2..8),
        seats in 1u32..15,
    ) {
        let lists = lists_from(&votes, 2);
        let a = hagenbach_bischoff::apportion(&lists, seats, &[]).unwrap();
        let b = hagenbach_bischoff::apportion(&lists, seats, &[]).unwrap();
        prop_assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
        for g in a.tree.groups() {
            for w in g.calculation_rounds.windows(2) {
                for (prev, next) in w[0].group_values.iter().zip(&w[1].group_values) {
                    prop_assert_eq!(prev.next_quotient, next.previous_quotient);
                }
            }
        }
    }

    #[test]
    fn double_proportional_single_election_conserves_seats(
        votes in prop::collection::vec(1u64..5_000, 1..6),
        seats in 1u32..15,
    ) {
        let input = DoubleProportionalInput {
            rows: vec![DoubleProportionalRowInput { election_id: "E".parse().unwrap(), number_of_mandates: seats }],
            columns: votes
                .iter()
                .enumerate()
                .map(|(j, &v)| DoubleProportionalColumnInput {
                    key: ColumnKey::List(format!("L{j}").parse().unwrap()),
                    vote_counts: vec![v],
                })
                .collect(),
        };
        let r = double_proportional::apportion(&input, DoubleProportionalQuorum::default(), None).unwrap();
        if !r.lot_decision_required() {
            prop_assert_eq!(r.rows[0].sub_apportionment_number_of_mandates, seats);
            for c in &r.columns {
                prop_assert_eq!(c.sub_apportionment_number_of_mandates, c.super_apportionment_number_of_mandates);
            }
        } else {
            prop_assert_eq!(r.sub_apportionment_number_of_mandates, 0);
        }
    }

    #[test]
    fn double_proportional_matrix_keeps_both_marginals((row_seats, votes) in matrices()) {
        let input = matrix_input(&row_seats, &votes);
        match double_proportional::apportion(&input, DoubleProportionalQuorum::default(), None) {
            Ok(r) if r.sub_apportionment_open_tie.is_some() => {
                prop_assert_eq!(r.sub_apportionment_number_of_mandates, 0);
                // Any listed resolution settles the matrix.
                let decision = lot_decision_scenarios(&r, None).into_iter().next();
                prop_assert!(decision.is_some());
                let decided =
                    double_proportional::apportion(&input, DoubleProportionalQuorum::default(), decision.as_ref())
                        .unwrap();
                prop_assert!(!decided.lot_decision_required());
                prop_assert!(decided.is_complete());
                prop_assert!(marginals_hold(&decided));
            }
            Ok(r) if r.lot_decision_required() => {
                prop_assert_eq!(r.sub_apportionment_number_of_mandates, 0);
            }
            Ok(r) if r.super_apportionment_number_of_mandates < r.number_of_mandates => {
                // Nothing to compete for: no votes in an election with seats.
                prop_assert!(votes.iter().all(|col| col.iter().zip(&row_seats).all(|(&v, &s)| v == 0 || s == 0)));
                prop_assert_eq!(r.sub_apportionment_number_of_mandates, 0);
            }
            Ok(r) => {
                prop_assert!(r.is_complete());
                prop_assert!(marginals_hold(&r));
            }
            Err(DoubleProportionalError::Infeasible(_) | DoubleProportionalError::InfeasibleColumn(_)) => {}
            Err(e) => prop_assert!(false, "unexpected error: {}", e),
        }
    }

    #[test]
    fn permutations_are_unique_and_complete(items in prop::collection::vec(0u8..3, 0..7)) {
        let all: Vec<Vec<u8>> = unique_permutations(&items).collect();
        let distinct: BTreeSet<Vec<u8>> = all.iter().cloned().collect();
        prop_assert_eq!(distinct.len(), all.len());

        let mut expected = factorial(items.len());
        for value in 0u8..3 {
            expected /= factorial(items.iter().filter(|&&x| x == value).count());
        }
        prop_assert_eq!(all.len(), expected);
    }
}
