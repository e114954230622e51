//! Double-proportional ("Doppelproporz") apportionment.
//!
//! Rows are elections with fixed seat counts, columns are lists (one
//! election) or union lists (a union of elections).
//!
//! 1. Voter numbers: `votes / election seats` per cell, summed per column.
//! 2. Quorum: a column takes part if any configured alternative is met.
//! 3. Super-apportionment: the union's seats go to the participating columns
//!    by standard rounding on voter numbers with one union divisor.
//! 4. Sub-apportionment: row and column divisors are adjusted alternately
//!    until every row and every column holds its seat count. A matrix that
//!    cannot carry both marginals is rejected up front. When the steps cycle
//!    on cells sitting exactly on a rounding boundary, the admissible
//!    resolutions are reported as a lot decision.
//!
//! All arithmetic is on `BigRational`; published divisors and voter numbers
//! are rounded `Decimal`s.

mod divisor;
mod feasibility;
mod quorum;
mod ties;

use std::collections::BTreeSet;
use std::fmt;

use am_core::ids::{ElectionId, ListId, UnionListId};
use am_core::rounding::Decimal;
use am_core::variables::DoubleProportionalQuorum;
use num::rational::BigRational;
use num::traits::{One, Zero};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::combinatorics::seat_outcomes;
use divisor::{apportion_vector, ratio_of, to_decimal, TieResolution};
use feasibility::Shortfall;
use ties::CellRounding;

pub use ties::MAX_SUB_APPORTIONMENT_TIE_RESOLUTIONS;

/// Upper bound on alternating row/column steps.
pub const MAX_SUB_APPORTIONMENT_ITERATIONS: u32 = 1000;

const DISPLAY_SCALE: u32 = 4;

#[derive(Debug, Error)]
pub enum DoubleProportionalError {
    #[error("column {column} has {actual} vote counts for {expected} elections")]
    ColumnLengthMismatch { column: ColumnKey, expected: usize, actual: usize },
    #[error("column {0} appears more than once")]
    DuplicateColumn(ColumnKey),
    #[error("election {0} appears more than once")]
    DuplicateElection(ElectionId),
    #[error("election {0} has seats but no votes for any participating column")]
    Infeasible(ElectionId),
    #[error("column {0} has seats but no votes in any election with seats")]
    InfeasibleColumn(ColumnKey),
    #[error("sub-apportionment did not converge within {0} iterations")]
    NoConvergence(u32),
    #[error("sub-apportionment cycles after {0} iterations without an admissible tie resolution")]
    UnresolvedCycle(u32),
    #[error("value out of range")]
    Overflow,
}

/// Column identity: a list of a single election or a union-wide list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ColumnKey {
    List(ListId),
    UnionList(UnionListId),
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKey::List(id) => write!(f, "list:{id}"),
            ColumnKey::UnionList(id) => write!(f, "union_list:{id}"),
        }
    }
}

/* ------------------------------- Input ------------------------------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleProportionalRowInput {
    pub election_id: ElectionId,
    pub number_of_mandates: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleProportionalColumnInput {
    pub key: ColumnKey,
    /// One entry per row, in row order; zero where the list does not run.
    pub vote_counts: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleProportionalInput {
    pub rows: Vec<DoubleProportionalRowInput>,
    pub columns: Vec<DoubleProportionalColumnInput>,
}

/// One cell of the matrix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub election_id: ElectionId,
    pub column: ColumnKey,
}

/// Drawn winners of a super-apportionment tie and, once that is settled, of
/// a sub-apportionment tie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleProportionalLotDecision {
    #[serde(default)]
    pub winners: Vec<ColumnKey>,
    /// Tied cells rounded up.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cell_winners: Vec<CellKey>,
}

/* ------------------------------- Output ------------------------------ */

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoubleProportionalCell {
    pub column: ColumnKey,
    pub vote_count: u64,
    pub voter_number: Decimal,
    /// Election quorum reached in this row.
    pub quorum_reached: bool,
    pub number_of_mandates: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoubleProportionalRow {
    pub election_id: ElectionId,
    pub number_of_mandates: u32,
    pub vote_count: u64,
    pub divisor: Option<Decimal>,
    pub sub_apportionment_number_of_mandates: u32,
    pub cells: Vec<DoubleProportionalCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoubleProportionalColumn {
    pub key: ColumnKey,
    pub vote_count: u64,
    pub voter_number: Decimal,
    pub cantonal_quorum_reached: bool,
    pub any_required_quorum_reached: bool,
    pub super_apportionment_number_of_mandates: u32,
    pub sub_apportionment_number_of_mandates: u32,
    pub divisor: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuperApportionmentOpenTie {
    pub candidates: Vec<ColumnKey>,
    pub number_of_mandates: u32,
}

/// Cells on a rounding boundary the alternating steps could not settle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubApportionmentOpenTie {
    pub candidates: Vec<CellKey>,
    /// Seats the candidates share.
    pub number_of_mandates: u32,
    /// Candidate sets that, rounded up, give every row and column its seats.
    pub resolutions: Vec<Vec<CellKey>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoubleProportionalResult {
    pub number_of_mandates: u32,
    pub vote_count: u64,
    pub voter_number: Decimal,
    pub quorum: DoubleProportionalQuorum,
    pub super_apportionment_divisor: Option<Decimal>,
    /// The divisor came out of a decided tie and sits on its rounding boundary.
    pub super_apportionment_tie_boundary: bool,
    pub super_apportionment_number_of_mandates: u32,
    pub super_apportionment_open_tie: Option<SuperApportionmentOpenTie>,
    pub sub_apportionment_number_of_mandates: u32,
    pub sub_apportionment_iterations: u32,
    pub sub_apportionment_open_tie: Option<SubApportionmentOpenTie>,
    pub rows: Vec<DoubleProportionalRow>,
    pub columns: Vec<DoubleProportionalColumn>,
}

impl DoubleProportionalResult {
    #[inline]
    pub fn lot_decision_required(&self) -> bool {
        self.super_apportionment_open_tie.is_some() || self.sub_apportionment_open_tie.is_some()
    }

    /// Every seat of the union sits in a cell.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.sub_apportionment_number_of_mandates == self.number_of_mandates
    }

    pub fn cell(&self, election_id: &ElectionId, column: &ColumnKey) -> Option<&DoubleProportionalCell> {
        self.rows
            .iter()
            .find(|r| &r.election_id == election_id)
            .and_then(|r| r.cells.iter().find(|c| &c.column == column))
    }
}

/* ----------------------------- Entry point --------------------------- */

/// Apportion the union's seats over the matrix.
///
/// A super-apportionment tie larger than the seats left stops the run with
/// `super_apportionment_open_tie` set unless `lot_decision` resolves it;
/// the sub-apportionment is then skipped. A sub-apportionment tie sets
/// `sub_apportionment_open_tie` and leaves every cell at zero unless
/// `lot_decision.cell_winners` names one of its resolutions.
pub fn apportion(
    input: &DoubleProportionalInput,
    quorum: DoubleProportionalQuorum,
    lot_decision: Option<&DoubleProportionalLotDecision>,
) -> Result<DoubleProportionalResult, DoubleProportionalError> {
    validate(input)?;
    let n_rows = input.rows.len();
    let votes: Vec<Vec<u64>> = (0..n_rows)
        .map(|i| input.columns.iter().map(|c| c.vote_counts[i]).collect())
        .collect();
    let row_seats: Vec<u32> = input.rows.iter().map(|r| r.number_of_mandates).collect();
    let row_votes: Vec<u64> = votes.iter().map(|r| r.iter().sum()).collect();
    let number_of_mandates: u32 = row_seats.iter().sum();

    // Voter numbers.
    let cell_voter_numbers: Vec<Vec<BigRational>> = votes
        .iter()
        .zip(&row_seats)
        .map(|(row, &h)| row.iter().map(|&v| ratio_of(v, u64::from(h))).collect())
        .collect();
    let column_voter_numbers: Vec<BigRational> = (0..input.columns.len())
        .map(|j| cell_voter_numbers.iter().fold(BigRational::zero(), |acc, row| acc + &row[j]))
        .collect();
    let total_voter_number = column_voter_numbers.iter().fold(BigRational::zero(), |acc, w| acc + w);

    // Quorum.
    let cell_quorum: Vec<Vec<bool>> = votes
        .iter()
        .zip(&row_votes)
        .map(|(row, &total)| row.iter().map(|&v| quorum::cell_quorum_reached(&quorum, v, total)).collect())
        .collect();
    let cantonal: Vec<bool> = column_voter_numbers
        .iter()
        .map(|w| quorum::cantonal_quorum_reached(&quorum, w, &total_voter_number))
        .collect();
    let participating: Vec<bool> = (0..input.columns.len())
        .map(|j| {
            let any_cell = cell_quorum.iter().any(|row| row[j]);
            quorum::any_required_quorum_reached(&quorum, any_cell, cantonal[j])
        })
        .collect();
    for (col, _) in input.columns.iter().zip(&participating).filter(|(_, p)| !**p) {
        warn!(column = %col.key, "quorum not reached; column excluded from apportionment");
    }

    // Super-apportionment over participating columns.
    let weights: Vec<BigRational> = column_voter_numbers
        .iter()
        .zip(&participating)
        .map(|(w, &p)| if p { w.clone() } else { BigRational::zero() })
        .collect();
    let decided: Option<Vec<usize>> = lot_decision.map(|d| {
        d.winners
            .iter()
            .filter_map(|k| input.columns.iter().position(|c| &c.key == k))
            .collect()
    });
    let sup = apportion_vector(&weights, number_of_mandates, decided.as_deref(), TieResolution::Report);
    let super_total: u32 = sup.seats.iter().sum();
    let open_tie = sup.open_tie.as_ref().map(|(tied, seats)| SuperApportionmentOpenTie {
        candidates: tied.iter().map(|&j| input.columns[j].key.clone()).collect(),
        number_of_mandates: *seats,
    });
    if let Some(tie) = &open_tie {
        warn!(tied = tie.candidates.len(), seats = tie.number_of_mandates, "super-apportionment lot decision required");
    }
    if sup.undistributed > 0 {
        warn!(seats = sup.undistributed, "super-apportionment: no votes left to compete for the remaining seats");
    }
    debug!(seats = super_total, divisor = ?sup.divisor, "super-apportionment done");

    // Sub-apportionment.
    let cell_winners = lot_decision.map_or(&[][..], |d| d.cell_winners.as_slice());
    let mut sub = if open_tie.is_none() && super_total == number_of_mandates && number_of_mandates > 0 {
        let matrix = Matrix { input, votes: &votes, row_seats: &row_seats, column_seats: &sup.seats };
        Some(sub_apportion(&matrix, cell_winners)?)
    } else {
        if number_of_mandates > 0 {
            warn!("sub-apportionment skipped: super-apportionment incomplete");
        }
        None
    };
    let sub_open_tie = sub.as_mut().and_then(|s| s.open_tie.take());
    if let Some(tie) = &sub_open_tie {
        warn!(
            tied = tie.candidates.len(),
            seats = tie.number_of_mandates,
            resolutions = tie.resolutions.len(),
            "sub-apportionment lot decision required"
        );
    }

    // Assemble.
    let mut rows = Vec::with_capacity(n_rows);
    for (i, row) in input.rows.iter().enumerate() {
        let mut cells = Vec::with_capacity(input.columns.len());
        for (j, col) in input.columns.iter().enumerate() {
            cells.push(DoubleProportionalCell {
                column: col.key.clone(),
                vote_count: votes[i][j],
                voter_number: to_decimal(&cell_voter_numbers[i][j], DISPLAY_SCALE)?.normalize(),
                quorum_reached: cell_quorum[i][j],
                number_of_mandates: sub.as_ref().map_or(0, |s| s.seats[i][j]),
            });
        }
        rows.push(DoubleProportionalRow {
            election_id: row.election_id.clone(),
            number_of_mandates: row.number_of_mandates,
            vote_count: row_votes[i],
            divisor: sub
                .as_ref()
                .and_then(|s| s.row_divisors[i].as_ref())
                .map(|d| to_decimal(d, DISPLAY_SCALE).map(Decimal::normalize))
                .transpose()?,
            sub_apportionment_number_of_mandates: cells.iter().map(|c| c.number_of_mandates).sum(),
            cells,
        });
    }

    let mut columns = Vec::with_capacity(input.columns.len());
    for (j, col) in input.columns.iter().enumerate() {
        columns.push(DoubleProportionalColumn {
            key: col.key.clone(),
            vote_count: col.vote_counts.iter().sum(),
            voter_number: to_decimal(&column_voter_numbers[j], DISPLAY_SCALE)?.normalize(),
            cantonal_quorum_reached: cantonal[j],
            any_required_quorum_reached: participating[j],
            super_apportionment_number_of_mandates: sup.seats[j],
            sub_apportionment_number_of_mandates: rows.iter().map(|r| r.cells[j].number_of_mandates).sum(),
            divisor: sub
                .as_ref()
                .and_then(|s| s.column_divisors[j].as_ref())
                .map(|d| to_decimal(d, DISPLAY_SCALE).map(Decimal::normalize))
                .transpose()?,
        });
    }

    let result = DoubleProportionalResult {
        number_of_mandates,
        vote_count: row_votes.iter().sum(),
        voter_number: to_decimal(&total_voter_number, DISPLAY_SCALE)?.normalize(),
        quorum,
        super_apportionment_divisor: sup
            .divisor
            .as_ref()
            .map(|d| to_decimal(d, DISPLAY_SCALE).map(Decimal::normalize))
            .transpose()?,
        super_apportionment_tie_boundary: sup.boundary_tie,
        super_apportionment_number_of_mandates: super_total,
        super_apportionment_open_tie: open_tie,
        sub_apportionment_number_of_mandates: rows.iter().map(|r| r.sub_apportionment_number_of_mandates).sum(),
        sub_apportionment_iterations: sub.as_ref().map_or(0, |s| s.iterations),
        sub_apportionment_open_tie: sub_open_tie,
        rows,
        columns,
    };
    info!(
        elections = n_rows,
        columns = result.columns.len(),
        seats = number_of_mandates,
        distributed = result.sub_apportionment_number_of_mandates,
        iterations = result.sub_apportionment_iterations,
        "double-proportional apportionment done"
    );
    Ok(result)
}

fn validate(input: &DoubleProportionalInput) -> Result<(), DoubleProportionalError> {
    let mut elections = BTreeSet::new();
    for r in &input.rows {
        if !elections.insert(&r.election_id) {
            return Err(DoubleProportionalError::DuplicateElection(r.election_id.clone()));
        }
    }
    let mut keys = BTreeSet::new();
    for c in &input.columns {
        if !keys.insert(&c.key) {
            return Err(DoubleProportionalError::DuplicateColumn(c.key.clone()));
        }
        if c.vote_counts.len() != input.rows.len() {
            return Err(DoubleProportionalError::ColumnLengthMismatch {
                column: c.key.clone(),
                expected: input.rows.len(),
                actual: c.vote_counts.len(),
            });
        }
    }
    Ok(())
}

/* --------------------------- Sub-apportionment ------------------------ */

type Divisors = Vec<Option<BigRational>>;

/// Votes and both marginals of the sub-apportionment.
struct Matrix<'a> {
    input: &'a DoubleProportionalInput,
    votes: &'a [Vec<u64>],
    row_seats: &'a [u32],
    column_seats: &'a [u32],
}

impl Matrix<'_> {
    fn cell_key(&self, i: usize, j: usize) -> CellKey {
        CellKey { election_id: self.input.rows[i].election_id.clone(), column: self.input.columns[j].key.clone() }
    }

    fn rows_met(&self, seats: &[Vec<u32>]) -> bool {
        seats.iter().zip(self.row_seats).all(|(row, &want)| row.iter().sum::<u32>() == want)
    }

    fn columns_met(&self, seats: &[Vec<u32>]) -> bool {
        self.column_seats.iter().enumerate().all(|(j, &want)| column_sum(seats, j) == want)
    }
}

struct SubApportionment {
    seats: Vec<Vec<u32>>,
    row_divisors: Divisors,
    column_divisors: Divisors,
    iterations: u32,
    open_tie: Option<SubApportionmentOpenTie>,
}

fn sub_apportion(m: &Matrix<'_>, cell_winners: &[CellKey]) -> Result<SubApportionment, DoubleProportionalError> {
    let Matrix { input, votes, row_seats, column_seats } = *m;
    let n_rows = row_seats.len();
    let n_cols = column_seats.len();
    let active_row = |i: usize| row_seats[i] > 0;
    let active_col = |j: usize| column_seats[j] > 0;

    let open: Vec<Vec<bool>> = (0..n_rows)
        .map(|i| (0..n_cols).map(|j| active_row(i) && active_col(j) && votes[i][j] > 0).collect())
        .collect();
    feasibility::check(&open, row_seats, column_seats).map_err(|shortfall| match shortfall {
        Shortfall::Row(i) => DoubleProportionalError::Infeasible(input.rows[i].election_id.clone()),
        Shortfall::Column(j) => DoubleProportionalError::InfeasibleColumn(input.columns[j].key.clone()),
    })?;

    let mut seats = vec![vec![0u32; n_cols]; n_rows];
    let mut row_div: Divisors = vec![None; n_rows];
    let mut col_div: Divisors = (0..n_cols).map(|j| active_col(j).then(BigRational::one)).collect();
    let mut boundary = false;
    // Column divisors before each row step; a repeat means the steps cycle.
    let mut visited: Vec<Divisors> = Vec::new();
    // Divisor pair after each step.
    let mut trail: Vec<(Divisors, Divisors)> = Vec::new();

    let cell_weight = |v: u64, d: &Option<BigRational>| -> BigRational {
        match d {
            Some(d) if !d.is_zero() => ratio_of(v, 1) / d,
            _ => BigRational::zero(),
        }
    };

    for iteration in 1..=MAX_SUB_APPORTIONMENT_ITERATIONS {
        if let Some(start) = visited.iter().position(|d| *d == col_div) {
            warn!(iteration, "sub-apportionment cycles between row and column steps");
            return settle(m, &trail[2 * start..], cell_winners, iteration - 1);
        }
        visited.push(col_div.clone());

        // Row step: each election gets exactly its seats.
        for i in (0..n_rows).filter(|&i| active_row(i)) {
            let weights: Vec<BigRational> = (0..n_cols).map(|j| cell_weight(votes[i][j], &col_div[j])).collect();
            let a = apportion_vector(&weights, row_seats[i], None, TieResolution::InputOrder);
            if a.undistributed > 0 {
                return Err(DoubleProportionalError::Infeasible(input.rows[i].election_id.clone()));
            }
            boundary |= a.boundary_tie;
            seats[i] = a.seats;
            row_div[i] = a.divisor;
        }
        trail.push((row_div.clone(), col_div.clone()));
        if m.columns_met(&seats) {
            debug!(iteration, "sub-apportionment converged after row step");
            return finish(m, seats, &trail, boundary, cell_winners, iteration);
        }

        // Column step: each column gets exactly its super-apportioned seats.
        for j in (0..n_cols).filter(|&j| active_col(j)) {
            let weights: Vec<BigRational> = (0..n_rows).map(|i| cell_weight(votes[i][j], &row_div[i])).collect();
            let a = apportion_vector(&weights, column_seats[j], None, TieResolution::InputOrder);
            if a.undistributed > 0 {
                return Err(DoubleProportionalError::InfeasibleColumn(input.columns[j].key.clone()));
            }
            boundary |= a.boundary_tie;
            for (i, s) in a.seats.into_iter().enumerate() {
                seats[i][j] = s;
            }
            col_div[j] = a.divisor;
        }
        trail.push((row_div.clone(), col_div.clone()));
        if m.rows_met(&seats) {
            debug!(iteration, "sub-apportionment converged after column step");
            return finish(m, seats, &trail, boundary, cell_winners, iteration);
        }
    }
    Err(DoubleProportionalError::NoConvergence(MAX_SUB_APPORTIONMENT_ITERATIONS))
}

/// Converged. An input-order tie on the way may hide another admissible
/// outcome under the final divisors; that is settled like a cycle.
fn finish(
    m: &Matrix<'_>,
    seats: Vec<Vec<u32>>,
    trail: &[(Divisors, Divisors)],
    boundary: bool,
    cell_winners: &[CellKey],
    iterations: u32,
) -> Result<SubApportionment, DoubleProportionalError> {
    match trail.last() {
        Some(last) if boundary => settle(m, std::slice::from_ref(last), cell_winners, iterations),
        Some((row_divisors, column_divisors)) => Ok(SubApportionment {
            seats,
            row_divisors: row_divisors.clone(),
            column_divisors: column_divisors.clone(),
            iterations,
            open_tie: None,
        }),
        None => Err(DoubleProportionalError::UnresolvedCycle(iterations)),
    }
}

/// Round the cells under the first divisor pair of `pairs` that admits a
/// resolution. One resolution, or a decided one, is taken; several are
/// reported as an open tie.
fn settle(
    m: &Matrix<'_>,
    pairs: &[(Divisors, Divisors)],
    cell_winners: &[CellKey],
    iterations: u32,
) -> Result<SubApportionment, DoubleProportionalError> {
    for (row_divisors, column_divisors) in pairs {
        let rounding = ties::round_cells(m.votes, row_divisors, column_divisors)?;
        let found = ties::resolutions(&rounding, m.row_seats, m.column_seats, MAX_SUB_APPORTIONMENT_TIE_RESOLUTIONS);
        if found.is_empty() {
            continue;
        }
        let candidates: Vec<CellKey> = rounding.tied.iter().map(|&(i, j)| m.cell_key(i, j)).collect();
        let decided = decided_pick(&candidates, cell_winners)
            .filter(|pick| ties::resolves(&rounding, pick, m.row_seats, m.column_seats));
        if decided.is_none() && !cell_winners.is_empty() {
            warn!(winners = cell_winners.len(), "cell lot decision does not resolve the sub-apportionment tie");
        }

        let pick = match (decided, found.as_slice()) {
            (Some(pick), _) => pick,
            (None, [only]) => only.clone(),
            (None, _) => {
                return Ok(SubApportionment {
                    seats: vec![vec![0; m.column_seats.len()]; m.row_seats.len()],
                    row_divisors: vec![None; m.row_seats.len()],
                    column_divisors: vec![None; m.column_seats.len()],
                    iterations,
                    open_tie: Some(open_tie(&rounding, &candidates, &found, m.row_seats)),
                });
            }
        };
        return Ok(SubApportionment {
            seats: rounding.with(&pick),
            row_divisors: row_divisors.clone(),
            column_divisors: column_divisors.clone(),
            iterations,
            open_tie: None,
        });
    }
    Err(DoubleProportionalError::UnresolvedCycle(iterations))
}

/// Indices of the decided cells among the candidates; `None` when the
/// decision is empty or names a cell that is not tied.
fn decided_pick(candidates: &[CellKey], cell_winners: &[CellKey]) -> Option<Vec<usize>> {
    if cell_winners.is_empty() {
        return None;
    }
    cell_winners.iter().map(|w| candidates.iter().position(|c| c == w)).collect()
}

fn open_tie(
    rounding: &CellRounding,
    candidates: &[CellKey],
    found: &[Vec<usize>],
    row_seats: &[u32],
) -> SubApportionmentOpenTie {
    SubApportionmentOpenTie {
        candidates: candidates.to_vec(),
        number_of_mandates: rounding.open_seats(row_seats),
        resolutions: found
            .iter()
            .map(|pick| pick.iter().map(|&k| candidates[k].clone()).collect())
            .collect(),
    }
}

#[inline]
fn column_sum(seats: &[Vec<u32>], j: usize) -> u32 {
    seats.iter().map(|row| row[j]).sum()
}

/// Every admissible outcome of the open tie.
///
/// A super-apportionment tie lists column winners. A sub-apportionment tie
/// lists cell winners and repeats the column winners of `applied`, the
/// decision the result was computed with.
pub fn lot_decision_scenarios(
    result: &DoubleProportionalResult,
    applied: Option<&DoubleProportionalLotDecision>,
) -> Vec<DoubleProportionalLotDecision> {
    if let Some(tie) = &result.super_apportionment_open_tie {
        return seat_outcomes(tie.candidates.len(), tie.number_of_mandates as usize)
            .map(|pick| DoubleProportionalLotDecision {
                winners: tie
                    .candidates
                    .iter()
                    .zip(&pick)
                    .filter(|(_, won)| **won == 1)
                    .map(|(k, _)| k.clone())
                    .collect(),
                cell_winners: Vec::new(),
            })
            .collect();
    }
    let Some(tie) = &result.sub_apportionment_open_tie else {
        return Vec::new();
    };
    let winners = applied.map(|d| d.winners.clone()).unwrap_or_default();
    tie.resolutions
        .iter()
        .map(|cells| DoubleProportionalLotDecision { winners: winners.clone(), cell_winners: cells.clone() })
        .collect()
}
