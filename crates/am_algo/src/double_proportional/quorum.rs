//! Quorum evaluation for the double-proportional matrix.

use am_core::variables::{DoubleProportionalQuorum, Pct};
use num::bigint::BigInt;
use num::rational::BigRational;

/// `part / whole >= pct` on exact rationals (`100 · part >= pct · whole`).
pub(crate) fn reached_rational(pct: Pct, part: &BigRational, whole: &BigRational) -> bool {
    part * BigRational::from_integer(BigInt::from(100u32))
        >= whole * BigRational::from_integer(BigInt::from(pct.as_u8()))
}

/// Per-cell election quorum: share of all votes cast in that election.
pub(crate) fn cell_quorum_reached(quorum: &DoubleProportionalQuorum, votes: u64, row_votes: u64) -> bool {
    match quorum.election_quorum {
        Some(pct) => votes > 0 && pct.reached_by(u128::from(votes), u128::from(row_votes)),
        None => false,
    }
}

/// Column cantonal quorum: share of the union's voter number.
pub(crate) fn cantonal_quorum_reached(
    quorum: &DoubleProportionalQuorum,
    column_voter_number: &BigRational,
    total_voter_number: &BigRational,
) -> bool {
    match quorum.cantonal_quorum {
        Some(pct) => reached_rational(pct, column_voter_number, total_voter_number),
        None => false,
    }
}

/// A column takes part when no quorum is configured or any alternative is met.
pub(crate) fn any_required_quorum_reached(
    quorum: &DoubleProportionalQuorum,
    any_cell_reached: bool,
    cantonal_reached: bool,
) -> bool {
    !quorum.is_required() || any_cell_reached || cantonal_reached
}
