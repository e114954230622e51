//! Deterministic ordering helpers: competition ranking over vote counts.
//!
//! This module is **I/O-free**. Ranking never depends on hash or allocation
//! order: equal vote counts keep their input order inside a tie group.

use core::cmp::Ordering;

/* -------------------------------------------------------------------------- */
/*                               Tie groups                                   */
/* -------------------------------------------------------------------------- */

/// Members (input indices) sharing one vote count and therefore one rank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TieGroup {
    /// 1-based competition rank shared by every member.
    pub start_rank: u32,
    pub vote_count: u64,
    pub members: Vec<usize>,
}

impl TieGroup {
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[inline]
    pub fn is_tie(&self) -> bool {
        self.members.len() > 1
    }

    /// Last rank a member of this group can be drawn to.
    #[inline]
    pub fn end_rank(&self) -> u32 {
        self.start_rank + self.members.len().saturating_sub(1) as u32
    }

    #[inline]
    pub fn contains_rank(&self, rank: u32) -> bool {
        rank >= self.start_rank && rank <= self.end_rank()
    }
}

/// Order by vote count descending; stable on input index.
#[inline]
pub fn cmp_votes_desc(a: (usize, u64), b: (usize, u64)) -> Ordering {
    match b.1.cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        o => o,
    }
}

/// Competition ranking ("1224"): equal counts share a rank, the next distinct
/// count skips ahead by the size of the group.
pub fn rank_by_vote_count(votes: &[u64]) -> Vec<TieGroup> {
    let mut order: Vec<(usize, u64)> = votes.iter().copied().enumerate().collect();
    order.sort_by(|a, b| cmp_votes_desc(*a, *b));

    let mut groups: Vec<TieGroup> = Vec::new();
    let mut position: u32 = 0;
    for (idx, v) in order {
        position += 1;
        match groups.last_mut() {
            Some(g) if g.vote_count == v => g.members.push(idx),
            _ => groups.push(TieGroup { start_rank: position, vote_count: v, members: vec![idx] }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn competition_ranking_skips_after_ties() {
        let groups = rank_by_vote_count(&[1000, 1500, 1500, 200]);
        let ranks: Vec<(u32, Vec<usize>)> =
            groups.iter().map(|g| (g.start_rank, g.members.clone())).collect();
        assert_eq!(ranks, vec![(1, vec![1, 2]), (3, vec![0]), (4, vec![3])]);
        assert!(groups[0].is_tie());
        assert_eq!(groups[0].end_rank(), 2);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(rank_by_vote_count(&[]).is_empty());
    }

    #[test]
    fn all_zero_is_one_group() {
        let g = rank_by_vote_count(&[0, 0, 0]);
        assert_eq!(g.len(), 1);
        assert_eq!(g[0].members, vec![0, 1, 2]);
        assert!(g[0].contains_rank(3));
        assert!(!g[0].contains_rank(4));
    }
}
