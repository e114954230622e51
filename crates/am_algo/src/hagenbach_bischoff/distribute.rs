//! Seat distribution over the group tree.
//!
//! At every group holding `S` seats:
//! 1. quotient = votes / (S + 1), distribution number = ⌊quotient⌋ + 1;
//! 2. each child gets ⌊child votes / distribution number⌋ seats;
//! 3. remaining seats go one per round to the child with the highest
//!    `votes / (seats + 1)`; a tie larger than the remaining seats needs a
//!    recorded lot decision for this group;
//! 4. recurse into every child with its final seat count.
//!
//! Quotients are exact ratios; comparisons never round.

use am_core::rounding::Ratio;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::tree::{CalculationRound, GroupId, GroupKey, GroupTree, GroupValues, WinnerReason};
use super::HagenbachBischoffError;

/// Externally drawn winners of a tie among the children of `group`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HagenbachBischoffLotDecision {
    pub group: GroupKey,
    pub winners: Vec<GroupKey>,
}

/// Tie that could not be resolved: `candidates` compete for `number_of_mandates` seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenTie {
    pub group: GroupKey,
    pub candidates: Vec<GroupKey>,
    pub number_of_mandates: u32,
}

/// Seats a group could not hand out because every child has zero votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndistributedMandates {
    pub group: GroupKey,
    pub number_of_mandates: u32,
}

#[inline]
fn quotient(votes: u64, seats: u32) -> Result<Ratio, HagenbachBischoffError> {
    Ok(Ratio::of(votes, u64::from(seats) + 1)?)
}

/// Distribute `seats` at `id` and below.
pub(crate) fn distribute(
    tree: &mut GroupTree,
    id: GroupId,
    seats: u32,
    lot_decisions: &[HagenbachBischoffLotDecision],
    open_ties: &mut Vec<OpenTie>,
    undistributed: &mut Vec<UndistributedMandates>,
) -> Result<(), HagenbachBischoffError> {
    let (votes, children) = {
        let g = tree.get_mut(id);
        g.number_of_mandates = seats;
        g.quotient = quotient(g.vote_count, seats)?;
        g.distribution_number = u64::try_from(g.quotient.floor())
            .map_err(|_| HagenbachBischoffError::Overflow)?
            + 1;
        g.calculation_rounds.clear();
        (g.vote_count, g.children.clone())
    };
    if children.is_empty() {
        return Ok(());
    }

    // Initial distribution.
    let dn = tree.get(id).distribution_number;
    let mut assigned: u32 = 0;
    for &c in &children {
        let child = tree.get_mut(c);
        let initial = u32::try_from(child.vote_count / dn).map_err(|_| HagenbachBischoffError::Overflow)?;
        child.initial_number_of_mandates = initial;
        child.number_of_mandates = initial;
        assigned += initial;
    }
    debug!(group = ?tree.get(id).key, votes, seats, initial = assigned, "initial distribution");

    let mut remaining = seats.checked_sub(assigned).ok_or(HagenbachBischoffError::SeatsNotConserved {
        expected: seats,
        actual: assigned,
    })?;

    let mut rounds: Vec<CalculationRound> = Vec::new();
    while remaining > 0 {
        let mut best = Ratio::ZERO;
        let mut tied: Vec<GroupId> = Vec::new();
        for &c in &children {
            let g = tree.get(c);
            let q = quotient(g.vote_count, g.number_of_mandates)?;
            match q.cmp(&best) {
                std::cmp::Ordering::Greater => {
                    best = q;
                    tied.clear();
                    tied.push(c);
                }
                std::cmp::Ordering::Equal if !q.is_zero() => tied.push(c),
                _ => {}
            }
        }

        if tied.is_empty() {
            // Every child is at zero votes; rest mandates stay undistributed.
            let key = tree.get(id).key.clone();
            warn!(group = ?key, remaining, "rest mandates not distributed: no votes left to compete");
            undistributed.push(UndistributedMandates { group: key, number_of_mandates: remaining });
            break;
        }

        let (winners, reason) = if tied.len() as u32 <= remaining {
            (vec![tied[0]], WinnerReason::Quotient)
        } else {
            match find_lot_decision(tree, id, &tied, remaining, lot_decisions) {
                Some(ws) => (ws, WinnerReason::LotDecision),
                None => {
                    let tie = OpenTie {
                        group: tree.get(id).key.clone(),
                        candidates: tied.iter().map(|&t| tree.get(t).key.clone()).collect(),
                        number_of_mandates: remaining,
                    };
                    warn!(group = ?tie.group, tied = tie.candidates.len(), seats = remaining, "lot decision required");
                    open_ties.push(tie);
                    break;
                }
            }
        };

        for winner in winners {
            let round = award(tree, &children, winner, reason, rounds.len() as u32 + 1)?;
            debug!(group = ?tree.get(id).key, round = round.index, winner = ?round.winner, "seat awarded");
            rounds.push(round);
            remaining -= 1;
        }
    }
    tree.get_mut(id).calculation_rounds = rounds;

    for c in children {
        let child_seats = tree.get(c).number_of_mandates;
        distribute(tree, c, child_seats, lot_decisions, open_ties, undistributed)?;
    }
    Ok(())
}

/// A decision applies when its winners are exactly `seats` distinct members of `tied`.
fn find_lot_decision(
    tree: &GroupTree,
    parent: GroupId,
    tied: &[GroupId],
    seats: u32,
    lot_decisions: &[HagenbachBischoffLotDecision],
) -> Option<Vec<GroupId>> {
    let parent_key = &tree.get(parent).key;
    let decision = lot_decisions.iter().find(|d| &d.group == parent_key)?;
    let mut winners: Vec<GroupId> = Vec::with_capacity(decision.winners.len());
    for w in &decision.winners {
        let id = tied.iter().copied().find(|&t| &tree.get(t).key == w)?;
        if !winners.contains(&id) {
            winners.push(id);
        }
    }
    if winners.len() as u32 == seats {
        // Award in sibling order, not in the order the decision lists them.
        winners.sort_by_key(|w| tied.iter().position(|t| t == w));
        Some(winners)
    } else {
        warn!(group = ?parent_key, "lot decision does not match the current tie; ignored");
        None
    }
}

fn award(
    tree: &mut GroupTree,
    siblings: &[GroupId],
    winner: GroupId,
    reason: WinnerReason,
    index: u32,
) -> Result<CalculationRound, HagenbachBischoffError> {
    let mut group_values = Vec::with_capacity(siblings.len());
    for &s in siblings {
        let g = tree.get(s);
        let previous = g.number_of_mandates;
        let next = if s == winner { previous + 1 } else { previous };
        group_values.push(GroupValues {
            group: g.key.clone(),
            previous_quotient: quotient(g.vote_count, previous)?,
            next_quotient: quotient(g.vote_count, next)?,
            previous_number_of_mandates: previous,
            number_of_mandates: next,
            is_winner: s == winner,
        });
    }
    tree.get_mut(winner).number_of_mandates += 1;
    Ok(CalculationRound {
        index,
        winner: tree.get(winner).key.clone(),
        winner_reason: reason,
        group_values,
    })
}
