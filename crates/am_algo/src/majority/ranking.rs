//! Candidate ranking with lot-decision bookkeeping.
//!
//! Competition ranking by vote count. A tie group needs a lot decision only
//! when it straddles the seat boundary (`start ≤ seats < end`) and, under the
//! absolute majority, when its members reach the absolute majority at all.
//! Recorded lot decisions survive a recompute while they still describe a
//! valid drawing inside their group; stale ones are cleared.

use std::collections::BTreeSet;

use am_core::entities::{CandidateEndResult, CandidateLotDecision};
use am_core::ordering::{rank_by_vote_count, TieGroup};

use super::MajorityError;

/// Re-rank every candidate of one election.
pub fn recalculate_ranks(
    candidates: &mut [CandidateEndResult],
    number_of_mandates: u32,
    absolute_majority: Option<u64>,
) {
    let all: Vec<usize> = (0..candidates.len()).collect();
    recalculate_ranks_of(candidates, &all, number_of_mandates, absolute_majority);
}

/// Re-rank the candidates at `subset` among themselves; others are untouched.
pub(crate) fn recalculate_ranks_of(
    candidates: &mut [CandidateEndResult],
    subset: &[usize],
    number_of_mandates: u32,
    absolute_majority: Option<u64>,
) {
    let votes: Vec<u64> = subset.iter().map(|&i| candidates[i].vote_count).collect();
    for group in rank_by_vote_count(&votes) {
        let members: Vec<usize> = group.members.iter().map(|&m| subset[m]).collect();
        let relevant = lot_decision_relevant(&group, number_of_mandates, absolute_majority);

        if !relevant {
            for &i in &members {
                let c = &mut candidates[i];
                c.rank = group.start_rank;
                c.lot_decision = false;
                c.lot_decision_enabled = false;
                c.lot_decision_required = false;
            }
            continue;
        }

        let keep = decisions_consistent(candidates, &members, &group);
        for &i in &members {
            let c = &mut candidates[i];
            c.lot_decision_enabled = true;
            if !(keep && c.lot_decision) {
                c.lot_decision = false;
                c.rank = group.start_rank;
            }
            c.lot_decision_required = !c.lot_decision;
        }
    }
}

fn lot_decision_relevant(group: &TieGroup, seats: u32, absolute_majority: Option<u64>) -> bool {
    group.is_tie()
        && group.start_rank <= seats
        && seats < group.end_rank()
        && absolute_majority.map_or(true, |am| group.vote_count >= am)
}

/// Decided members hold distinct ranks inside the group.
fn decisions_consistent(candidates: &[CandidateEndResult], members: &[usize], group: &TieGroup) -> bool {
    let mut seen = BTreeSet::new();
    members
        .iter()
        .map(|&i| &candidates[i])
        .filter(|c| c.lot_decision)
        .all(|c| group.contains_rank(c.rank) && seen.insert(c.rank))
}

/* ---------------------------------------------------------------------------- */

/// Record drawn ranks for tied candidates.
///
/// Every decided candidate must have an enabled lot decision and the rank must
/// lie inside its tie group. Earlier decisions holding a rank that is now
/// handed to someone else are withdrawn. When a single member of a group is
/// left undecided it takes the one remaining rank.
pub fn apply_lot_decisions(
    candidates: &mut [CandidateEndResult],
    decisions: &[CandidateLotDecision],
) -> Result<(), MajorityError> {
    // Validate the whole batch before touching anything.
    let mut resolved: Vec<(usize, u32)> = Vec::with_capacity(decisions.len());
    for d in decisions {
        let idx = candidates
            .iter()
            .position(|c| c.candidate_id == d.candidate_id)
            .ok_or_else(|| MajorityError::UnknownCandidate(d.candidate_id.clone()))?;
        let c = &candidates[idx];
        if !c.lot_decision_enabled {
            return Err(MajorityError::LotDecisionNotEnabled(d.candidate_id.clone()));
        }
        let group = tie_group_of(candidates, idx);
        if !group.contains_rank(d.rank) {
            return Err(MajorityError::RankOutsideTieGroup {
                candidate_id: d.candidate_id.clone(),
                rank: d.rank,
            });
        }
        if resolved
            .iter()
            .any(|&(j, r)| r == d.rank && candidates[j].vote_count == c.vote_count)
        {
            return Err(MajorityError::DuplicateLotDecisionRank(d.rank));
        }
        resolved.push((idx, d.rank));
    }

    for &(idx, rank) in &resolved {
        let votes = candidates[idx].vote_count;
        for (j, other) in candidates.iter_mut().enumerate() {
            let in_batch = resolved.iter().any(|&(k, _)| k == j);
            if j != idx
                && !in_batch
                && other.lot_decision_enabled
                && other.vote_count == votes
                && other.lot_decision
                && other.rank == rank
            {
                other.lot_decision = false;
                other.lot_decision_required = true;
            }
        }
        let c = &mut candidates[idx];
        c.rank = rank;
        c.lot_decision = true;
        c.lot_decision_required = false;
    }

    let touched: BTreeSet<u64> = resolved.iter().map(|&(i, _)| candidates[i].vote_count).collect();
    for votes in touched {
        decide_last_member(candidates, votes);
    }
    Ok(())
}

/// Enabled members sharing `idx`'s vote count, starting at their lowest rank.
fn tie_group_of(candidates: &[CandidateEndResult], idx: usize) -> TieGroup {
    let votes = candidates[idx].vote_count;
    let members: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.lot_decision_enabled && c.vote_count == votes)
        .map(|(i, _)| i)
        .collect();
    let start_rank = members.iter().map(|&i| candidates[i].rank).min().unwrap_or(0);
    TieGroup { start_rank, vote_count: votes, members }
}

fn decide_last_member(candidates: &mut [CandidateEndResult], votes: u64) {
    let Some(first) = candidates
        .iter()
        .position(|c| c.lot_decision_enabled && c.vote_count == votes)
    else {
        return;
    };
    let group = tie_group_of(candidates, first);
    let undecided: Vec<usize> =
        group.members.iter().copied().filter(|&i| !candidates[i].lot_decision).collect();
    if undecided.len() != 1 {
        return;
    }
    let taken: BTreeSet<u32> = group
        .members
        .iter()
        .filter(|&&i| candidates[i].lot_decision)
        .map(|&i| candidates[i].rank)
        .collect();
    let free: Vec<u32> = (group.start_rank..=group.end_rank()).filter(|r| !taken.contains(r)).collect();
    if let [rank] = free.as_slice() {
        let c = &mut candidates[undecided[0]];
        c.rank = *rank;
        c.lot_decision = true;
        c.lot_decision_required = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use am_core::entities::ElectionKind;

    fn cand(id: &str, votes: u64) -> CandidateEndResult {
        CandidateEndResult::new(id.parse().unwrap(), ElectionKind::Primary, votes)
    }

    fn ranks(cs: &[CandidateEndResult]) -> Vec<u32> {
        cs.iter().map(|c| c.rank).collect()
    }

    #[test]
    fn tie_across_boundary_enables_lot_decision() {
        let mut cs = vec![cand("a", 2000), cand("b", 1500), cand("c", 1500), cand("d", 100)];
        recalculate_ranks(&mut cs, 2, None);
        assert_eq!(ranks(&cs), vec![1, 2, 2, 4]);
        assert!(cs[1].lot_decision_enabled && cs[2].lot_decision_enabled);
        assert!(cs[1].lot_decision_required && cs[2].lot_decision_required);
        assert!(!cs[0].lot_decision_enabled && !cs[3].lot_decision_enabled);
    }

    #[test]
    fn tie_inside_seats_is_not_relevant() {
        let mut cs = vec![cand("a", 1500), cand("b", 1500), cand("c", 100)];
        recalculate_ranks(&mut cs, 2, None);
        assert_eq!(ranks(&cs), vec![1, 1, 3]);
        assert!(cs.iter().all(|c| !c.lot_decision_enabled));
    }

    #[test]
    fn tie_below_absolute_majority_is_not_relevant() {
        let mut cs = vec![cand("a", 2000), cand("b", 400), cand("c", 400)];
        recalculate_ranks(&mut cs, 2, Some(486));
        assert!(cs.iter().all(|c| !c.lot_decision_enabled));
    }

    #[test]
    fn applying_one_decision_decides_the_pair() {
        let mut cs = vec![cand("a", 2000), cand("b", 1500), cand("c", 1500)];
        recalculate_ranks(&mut cs, 2, None);
        let d = CandidateLotDecision { candidate_id: "c".parse().unwrap(), rank: 2 };
        apply_lot_decisions(&mut cs, &[d]).unwrap();
        assert_eq!(ranks(&cs), vec![1, 3, 2]);
        assert!(cs[1].lot_decision && cs[2].lot_decision);
        assert!(!cs[1].lot_decision_required && !cs[2].lot_decision_required);

        // survives a recompute
        recalculate_ranks(&mut cs, 2, None);
        assert_eq!(ranks(&cs), vec![1, 3, 2]);
    }

    #[test]
    fn stale_decision_is_cleared() {
        let mut cs = vec![cand("a", 2000), cand("b", 1500), cand("c", 1500)];
        recalculate_ranks(&mut cs, 2, None);
        let d = CandidateLotDecision { candidate_id: "b".parse().unwrap(), rank: 2 };
        apply_lot_decisions(&mut cs, &[d]).unwrap();
        cs[2].vote_count = 1600;
        recalculate_ranks(&mut cs, 2, None);
        assert_eq!(ranks(&cs), vec![1, 3, 2]);
        assert!(cs.iter().all(|c| !c.lot_decision && !c.lot_decision_enabled));
    }

    #[test]
    fn three_way_tie_keeps_partial_decision() {
        let mut cs = vec![cand("a", 900), cand("b", 900), cand("c", 900)];
        recalculate_ranks(&mut cs, 1, None);
        let d = CandidateLotDecision { candidate_id: "b".parse().unwrap(), rank: 1 };
        apply_lot_decisions(&mut cs, &[d]).unwrap();
        assert_eq!(ranks(&cs), vec![1, 1, 1]);
        assert!(cs[1].lot_decision);
        assert!(cs[0].lot_decision_required && cs[2].lot_decision_required);

        recalculate_ranks(&mut cs, 1, None);
        assert!(cs[1].lot_decision && !cs[1].lot_decision_required);
    }

    #[test]
    fn invalid_decisions_are_rejected() {
        let mut cs = vec![cand("a", 2000), cand("b", 1500), cand("c", 1500)];
        recalculate_ranks(&mut cs, 2, None);
        let not_enabled = CandidateLotDecision { candidate_id: "a".parse().unwrap(), rank: 1 };
        assert!(matches!(
            apply_lot_decisions(&mut cs, &[not_enabled]),
            Err(MajorityError::LotDecisionNotEnabled(_))
        ));
        let outside = CandidateLotDecision { candidate_id: "b".parse().unwrap(), rank: 4 };
        assert!(matches!(
            apply_lot_decisions(&mut cs, &[outside]),
            Err(MajorityError::RankOutsideTieGroup { rank: 4, .. })
        ));
        let unknown = CandidateLotDecision { candidate_id: "zz".parse().unwrap(), rank: 2 };
        assert!(matches!(
            apply_lot_decisions(&mut cs, &[unknown]),
            Err(MajorityError::UnknownCandidate(_))
        ));
        let twice = [
            CandidateLotDecision { candidate_id: "b".parse().unwrap(), rank: 2 },
            CandidateLotDecision { candidate_id: "c".parse().unwrap(), rank: 2 },
        ];
        assert!(matches!(
            apply_lot_decisions(&mut cs, &twice),
            Err(MajorityError::DuplicateLotDecisionRank(2))
        ));
        assert!(cs.iter().all(|c| !c.lot_decision));
    }
}
