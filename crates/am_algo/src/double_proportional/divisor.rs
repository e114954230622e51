//! Standard-rounding divisor apportionment of one vector, and divisor selection.
//!
//! Seats are handed out one by one to the highest `w / (x + ½)` (Sainte-Laguë),
//! which is the same as rounding `w / D` half up for a suitable divisor `D`.
//! Any `D` in `(max w/(x+½), min_{x>0} w/(x−½)]` reproduces the seats; the
//! "nicest" one (fewest significant digits) is published.

use am_core::rounding::Decimal;
use num::bigint::BigInt;
use num::rational::BigRational;
use num::traits::{One, Signed, ToPrimitive, Zero};

use super::DoubleProportionalError;

/// Smallest power of ten tried when looking for a round divisor.
const MIN_DIVISOR_EXPONENT: i32 = -12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TieResolution {
    /// Stop and report the tie.
    Report,
    /// Award in input order; the other dimension corrects it.
    InputOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VectorApportionment {
    pub seats: Vec<u32>,
    pub divisor: Option<BigRational>,
    /// Tied entries and the seats they compete for, when reported.
    pub open_tie: Option<(Vec<usize>, u32)>,
    /// Seats nobody could take (all remaining weights zero).
    pub undistributed: u32,
    /// A decided or input-order tie left no open divisor interval; the
    /// published divisor sits on the rounding boundary of the tied entries.
    pub boundary_tie: bool,
}

#[inline]
fn half() -> BigRational {
    BigRational::new(BigInt::one(), BigInt::from(2))
}

#[inline]
pub(crate) fn ratio_of(num: u64, den: u64) -> BigRational {
    if den == 0 {
        return BigRational::zero();
    }
    BigRational::new(BigInt::from(num), BigInt::from(den))
}

fn quotient(weight: &BigRational, seats: u32) -> BigRational {
    weight / (BigRational::from_integer(BigInt::from(seats)) + half())
}

/// Distribute `seats` over `weights`.
///
/// `decision` lists the entries that win a tie larger than the seats left;
/// it applies only when it names exactly that many tied entries.
pub(crate) fn apportion_vector(
    weights: &[BigRational],
    seats: u32,
    decision: Option<&[usize]>,
    ties: TieResolution,
) -> VectorApportionment {
    let mut x = vec![0u32; weights.len()];
    let mut remaining = seats;
    let mut open_tie = None;
    let mut undistributed = 0;

    while remaining > 0 {
        let mut best = BigRational::zero();
        let mut tied: Vec<usize> = Vec::new();
        for (k, w) in weights.iter().enumerate() {
            let q = quotient(w, x[k]);
            if q.is_zero() {
                continue;
            }
            if q > best {
                best = q;
                tied.clear();
                tied.push(k);
            } else if q == best {
                tied.push(k);
            }
        }

        if tied.is_empty() {
            undistributed = remaining;
            break;
        }
        if tied.len() as u32 <= remaining {
            x[tied[0]] += 1;
            remaining -= 1;
            continue;
        }

        let decided = decision.filter(|d| {
            let mut d = d.to_vec();
            d.sort_unstable();
            d.dedup();
            d.len() as u32 == remaining && d.iter().all(|k| tied.contains(k))
        });
        match (decided, ties) {
            (Some(d), _) => {
                for &k in d {
                    x[k] += 1;
                }
                remaining = 0;
            }
            (None, TieResolution::InputOrder) => {
                for &k in tied.iter().take(remaining as usize) {
                    x[k] += 1;
                }
                remaining = 0;
            }
            (None, TieResolution::Report) => {
                open_tie = Some((tied, remaining));
                break;
            }
        }
    }

    let (divisor, boundary_tie) = if open_tie.is_none() && undistributed == 0 && seats > 0 {
        let lower = divisor_interval_lower(weights, &x);
        let upper = divisor_interval_upper(weights, &x);
        let boundary = upper.as_ref() == Some(&lower);
        (Some(select_divisor(&lower, upper)), boundary)
    } else {
        (None, false)
    };
    VectorApportionment { seats: x, divisor, open_tie, undistributed, boundary_tie }
}

fn divisor_interval_lower(weights: &[BigRational], x: &[u32]) -> BigRational {
    weights
        .iter()
        .zip(x)
        .map(|(w, &s)| quotient(w, s))
        .max()
        .unwrap_or_else(BigRational::zero)
}

fn divisor_interval_upper(weights: &[BigRational], x: &[u32]) -> Option<BigRational> {
    weights
        .iter()
        .zip(x)
        .filter(|(_, s)| **s > 0)
        .map(|(w, &s)| w / (BigRational::from_integer(BigInt::from(s)) - half()))
        .min()
}

fn pow10(exp: i32) -> BigRational {
    let p = BigInt::from(10u32).pow(exp.unsigned_abs());
    if exp >= 0 {
        BigRational::from_integer(p)
    } else {
        BigRational::new(BigInt::one(), p)
    }
}

/// Roundest divisor above `lower` and not above `upper`.
///
/// Tries steps of `10^e` from the magnitude of `upper` downwards; falls back to
/// `upper` itself.
///
/// When a tie was decided (by lot or input order) `lower == upper` and no
/// divisor reproduces the seats under round-half-up: the boundary value is
/// returned, at which every tied entry sits on exactly `x + ½`. Callers see
/// this as `VectorApportionment::boundary_tie`.
pub(crate) fn select_divisor(lower: &BigRational, upper: Option<BigRational>) -> BigRational {
    let Some(upper) = upper else {
        // Nobody holds a seat: any divisor above `lower` works.
        let magnitude = digits(lower);
        let step = pow10(magnitude);
        return ((lower / &step).floor() + BigRational::one()) * step;
    };

    let mut e = digits(&upper) - 1;
    while e >= MIN_DIVISOR_EXPONENT {
        let step = pow10(e);
        let candidate = ((lower / &step).floor() + BigRational::one()) * step;
        if candidate <= upper {
            return candidate;
        }
        e -= 1;
    }
    upper
}

/// Decimal digits of the integer part; `0` for values below one.
fn digits(x: &BigRational) -> i32 {
    let int = x.abs().to_integer();
    if int.is_zero() {
        0
    } else {
        int.to_string().len() as i32
    }
}

/// Round to `scale` fractional digits, half away from zero.
pub(crate) fn to_decimal(x: &BigRational, scale: u32) -> Result<Decimal, DoubleProportionalError> {
    let scaled = x * pow10(scale as i32);
    let rounded = scaled.round();
    let mantissa = rounded.to_integer().to_i128().ok_or(DoubleProportionalError::Overflow)?;
    Ok(Decimal::new(mantissa, scale))
}
