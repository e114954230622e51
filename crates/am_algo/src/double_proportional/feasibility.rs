//! Can the seat matrix carry both marginals at all?
//!
//! Seats may only sit in cells with votes. Rows hand their seats to columns
//! along those cells; the matrix is feasible when a maximum flow moves every
//! seat. Cells have no upper bound.

use std::collections::VecDeque;

/// Where the matrix first falls short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shortfall {
    Row(usize),
    Column(usize),
}

/// `open[i][j]`: cell `(i, j)` may hold seats. Both marginals must add up
/// to the same total.
pub(crate) fn check(open: &[Vec<bool>], row_seats: &[u32], column_seats: &[u32]) -> Result<(), Shortfall> {
    let n_cols = column_seats.len();

    for (i, &seats) in row_seats.iter().enumerate() {
        if seats > 0 && !open[i].iter().any(|&o| o) {
            return Err(Shortfall::Row(i));
        }
    }
    for (j, &seats) in column_seats.iter().enumerate() {
        let reachable: u64 = (0..row_seats.len()).filter(|&i| open[i][j]).map(|i| u64::from(row_seats[i])).sum();
        if u64::from(seats) > reachable {
            return Err(Shortfall::Column(j));
        }
    }
    for (i, &seats) in row_seats.iter().enumerate() {
        let reachable: u64 = (0..n_cols).filter(|&j| open[i][j]).map(|j| u64::from(column_seats[j])).sum();
        if u64::from(seats) > reachable {
            return Err(Shortfall::Row(i));
        }
    }

    let received = max_flow(open, row_seats, column_seats);
    match received.iter().zip(column_seats).position(|(got, want)| got < want) {
        Some(j) => Err(Shortfall::Column(j)),
        None => Ok(()),
    }
}

/// Seats each column receives under a maximum flow (augmenting paths, BFS).
fn max_flow(open: &[Vec<bool>], row_seats: &[u32], column_seats: &[u32]) -> Vec<u32> {
    let (n_rows, n_cols) = (row_seats.len(), column_seats.len());
    let mut flow = vec![vec![0u32; n_cols]; n_rows];
    let mut sent = vec![0u32; n_rows];
    let mut received = vec![0u32; n_cols];

    loop {
        // Rows are entered from the source (`None`) or backwards over a
        // column's existing flow; columns forwards from a row.
        let mut row_seen = vec![false; n_rows];
        let mut row_from: Vec<Option<usize>> = vec![None; n_rows];
        let mut col_from: Vec<Option<usize>> = vec![None; n_cols];
        let mut queue = VecDeque::new();
        for i in (0..n_rows).filter(|&i| sent[i] < row_seats[i]) {
            row_seen[i] = true;
            queue.push_back(i);
        }

        let mut sink = None;
        'search: while let Some(i) = queue.pop_front() {
            for j in 0..n_cols {
                if !open[i][j] || col_from[j].is_some() {
                    continue;
                }
                col_from[j] = Some(i);
                if received[j] < column_seats[j] {
                    sink = Some(j);
                    break 'search;
                }
                for k in 0..n_rows {
                    if !row_seen[k] && flow[k][j] > 0 {
                        row_seen[k] = true;
                        row_from[k] = Some(j);
                        queue.push_back(k);
                    }
                }
            }
        }
        let Some(end) = sink else {
            return received;
        };

        let mut forward = Vec::new();
        let mut backward = Vec::new();
        let mut col = end;
        let start = loop {
            let Some(i) = col_from[col] else {
                return received;
            };
            forward.push((i, col));
            match row_from[i] {
                Some(prev) => {
                    backward.push((i, prev));
                    col = prev;
                }
                None => break i,
            }
        };

        let amount = backward
            .iter()
            .map(|&(i, j)| flow[i][j])
            .fold((row_seats[start] - sent[start]).min(column_seats[end] - received[end]), u32::min);
        for &(i, j) in &forward {
            flow[i][j] += amount;
        }
        for &(i, j) in &backward {
            flow[i][j] -= amount;
        }
        sent[start] += amount;
        received[end] += amount;
    }
}
