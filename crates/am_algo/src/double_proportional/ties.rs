//! Sub-apportionment ties.
//!
//! Under fixed row and column divisors a cell quotient of exactly `n + ½`
//! may round either way. When the alternating steps cannot settle such
//! cells, every admissible choice meeting both marginals is listed.

use num::bigint::BigInt;
use num::rational::BigRational;
use num::traits::{One, ToPrimitive, Zero};

use super::divisor::ratio_of;
use super::DoubleProportionalError;

/// Stop enumerating after this many resolutions.
pub const MAX_SUB_APPORTIONMENT_TIE_RESOLUTIONS: usize = 256;

/// Search nodes visited before giving up on further resolutions.
const SEARCH_BUDGET: u32 = 200_000;

/// Cell seats under one pair of divisors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CellRounding {
    /// Seats every cell holds at least.
    pub floor: Vec<Vec<u32>>,
    /// Cells on the boundary, in row-major order; each may take one more seat.
    pub tied: Vec<(usize, usize)>,
}

impl CellRounding {
    /// Seats with the picked tied cells (indices into `tied`) rounded up.
    pub fn with(&self, pick: &[usize]) -> Vec<Vec<u32>> {
        let mut seats = self.floor.clone();
        for &k in pick {
            let (i, j) = self.tied[k];
            seats[i][j] += 1;
        }
        seats
    }

    /// Seats the tied cells still have to take.
    pub fn open_seats(&self, row_seats: &[u32]) -> u32 {
        let floor: u32 = self.floor.iter().flatten().sum();
        row_seats.iter().sum::<u32>().saturating_sub(floor)
    }
}

/// Round `votes / (row divisor · column divisor)` half up, remembering the
/// cells that sit exactly on `n + ½`. Missing or zero divisors give zero.
pub(crate) fn round_cells(
    votes: &[Vec<u64>],
    row_divisors: &[Option<BigRational>],
    column_divisors: &[Option<BigRational>],
) -> Result<CellRounding, DoubleProportionalError> {
    let half = BigRational::new(BigInt::one(), BigInt::from(2));
    let mut floor = vec![vec![0u32; column_divisors.len()]; votes.len()];
    let mut tied = Vec::new();

    for (i, row) in votes.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            let (Some(r), Some(c)) = (&row_divisors[i], &column_divisors[j]) else { continue };
            if v == 0 || r.is_zero() || c.is_zero() {
                continue;
            }
            let q = ratio_of(v, 1) / (r * c);
            let whole = q.floor();
            let frac = &q - &whole;
            let mut seats = whole.to_integer().to_u32().ok_or(DoubleProportionalError::Overflow)?;
            if frac == half {
                tied.push((i, j));
            } else if frac > half {
                seats += 1;
            }
            floor[i][j] = seats;
        }
    }
    Ok(CellRounding { floor, tied })
}

/// Whether rounding up exactly `pick` meets both marginals.
pub(crate) fn resolves(rounding: &CellRounding, pick: &[usize], row_seats: &[u32], column_seats: &[u32]) -> bool {
    let mut distinct = pick.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() != pick.len() || pick.iter().any(|&k| k >= rounding.tied.len()) {
        return false;
    }
    let seats = rounding.with(pick);
    seats.iter().zip(row_seats).all(|(row, &want)| row.iter().sum::<u32>() == want)
        && column_seats
            .iter()
            .enumerate()
            .all(|(j, &want)| seats.iter().map(|row| row[j]).sum::<u32>() == want)
}

/// Admissible choices of tied cells to round up, at most `limit`, in
/// lexicographic order of the picked indices.
pub(crate) fn resolutions(
    rounding: &CellRounding,
    row_seats: &[u32],
    column_seats: &[u32],
    limit: usize,
) -> Vec<Vec<usize>> {
    let mut need_row = Vec::with_capacity(row_seats.len());
    for (row, &want) in rounding.floor.iter().zip(row_seats) {
        match want.checked_sub(row.iter().sum()) {
            Some(n) => need_row.push(n),
            None => return Vec::new(),
        }
    }
    let mut need_col = Vec::with_capacity(column_seats.len());
    for (j, &want) in column_seats.iter().enumerate() {
        match want.checked_sub(rounding.floor.iter().map(|row| row[j]).sum()) {
            Some(n) => need_col.push(n),
            None => return Vec::new(),
        }
    }

    let mut left_row = vec![0u32; row_seats.len()];
    let mut left_col = vec![0u32; column_seats.len()];
    for &(i, j) in &rounding.tied {
        left_row[i] += 1;
        left_col[j] += 1;
    }
    if need_row.iter().zip(&left_row).any(|(n, l)| n > l) || need_col.iter().zip(&left_col).any(|(n, l)| n > l) {
        return Vec::new();
    }

    let mut search = Search {
        tied: &rounding.tied,
        need_row,
        need_col,
        left_row,
        left_col,
        pick: Vec::new(),
        found: Vec::new(),
        limit,
        budget: SEARCH_BUDGET,
    };
    search.walk(0);
    search.found
}

struct Search<'a> {
    tied: &'a [(usize, usize)],
    need_row: Vec<u32>,
    need_col: Vec<u32>,
    /// Undecided tied cells per row / column.
    left_row: Vec<u32>,
    left_col: Vec<u32>,
    pick: Vec<usize>,
    found: Vec<Vec<usize>>,
    limit: usize,
    budget: u32,
}

impl Search<'_> {
    fn walk(&mut self, k: usize) {
        if self.found.len() >= self.limit || self.budget == 0 {
            return;
        }
        self.budget -= 1;
        if k == self.tied.len() {
            if self.need_row.iter().all(|&n| n == 0) && self.need_col.iter().all(|&n| n == 0) {
                self.found.push(self.pick.clone());
            }
            return;
        }

        let (i, j) = self.tied[k];
        self.left_row[i] -= 1;
        self.left_col[j] -= 1;
        if self.need_row[i] > 0 && self.need_col[j] > 0 {
            self.need_row[i] -= 1;
            self.need_col[j] -= 1;
            self.pick.push(k);
            self.walk(k + 1);
            self.pick.pop();
            self.need_row[i] += 1;
            self.need_col[j] += 1;
        }
        if self.left_row[i] >= self.need_row[i] && self.left_col[j] >= self.need_col[j] {
            self.walk(k + 1);
        }
        self.left_row[i] += 1;
        self.left_col[j] += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[u64]) -> Vec<Option<BigRational>> {
        values.iter().map(|&v| Some(ratio_of(v, 1))).collect()
    }

    #[test]
    fn quotients_on_the_half_are_tied() {
        let votes = vec![vec![100, 250], vec![100, 260]];
        let r = round_cells(&votes, &some(&[200, 200]), &some(&[1, 1])).unwrap();
        // 0.5 | 1.25 / 0.5 | 1.3
        assert_eq!(r.floor, vec![vec![0, 1], vec![0, 1]]);
        assert_eq!(r.tied, vec![(0, 0), (1, 0)]);
    }

    #[test]
    fn missing_divisors_hold_no_seats() {
        let votes = vec![vec![100, 100]];
        let r = round_cells(&votes, &some(&[10]), &[Some(ratio_of(1, 1)), None]).unwrap();
        assert_eq!(r.floor, vec![vec![10, 0]]);
        assert!(r.tied.is_empty());
    }

    #[test]
    fn symmetric_square_has_two_resolutions() {
        let rounding = CellRounding { floor: vec![vec![0, 0], vec![0, 0]], tied: vec![(0, 0), (0, 1), (1, 0), (1, 1)] };
        let found = resolutions(&rounding, &[1, 1], &[1, 1], 10);
        assert_eq!(found, vec![vec![0, 3], vec![1, 2]]);
        assert!(found.iter().all(|p| resolves(&rounding, p, &[1, 1], &[1, 1])));
        assert!(!resolves(&rounding, &[0, 1], &[1, 1], &[1, 1]));
        assert!(!resolves(&rounding, &[0, 0], &[1, 1], &[1, 1]));
        assert_eq!(rounding.open_seats(&[1, 1]), 2);
    }

    #[test]
    fn enumeration_stops_at_the_limit() {
        let tied: Vec<(usize, usize)> = (0..3).flat_map(|i| (0..3).map(move |j| (i, j))).collect();
        let rounding = CellRounding { floor: vec![vec![0; 3]; 3], tied };
        // 3×3 permutation matrices
        assert_eq!(resolutions(&rounding, &[1, 1, 1], &[1, 1, 1], 100).len(), 6);
        assert_eq!(resolutions(&rounding, &[1, 1, 1], &[1, 1, 1], 4).len(), 4);
    }

    #[test]
    fn unreachable_marginals_give_nothing() {
        let rounding = CellRounding { floor: vec![vec![1, 0], vec![0, 0]], tied: vec![(1, 1)] };
        assert!(resolutions(&rounding, &[1, 1], &[2, 0], 10).is_empty());
    }
}
