//! Integer-first ratio type and fixed-scale decimal for display.
//!
//! All seat-relevant comparisons run on exact `Ratio`s. `Decimal` exists only
//! to present a value (thresholds, quotients, divisors) with a fixed number of
//! fractional digits, rounded half away from zero.

use core::cmp::Ordering;
use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::CoreError;

/// Exact ratio with normalized sign and positive denominator.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct Ratio {
    pub num: i128,
    pub den: i128,
}

#[inline]
fn abs_i128(x: i128) -> i128 {
    if x < 0 {
        -x
    } else {
        x
    }
}

fn gcd_i128(mut a: i128, mut b: i128) -> i128 {
    a = abs_i128(a);
    b = abs_i128(b);
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    if a == 0 {
        1
    } else {
        a
    }
}

/// Construct a ratio, ensuring `den > 0` and reducing by GCD.
pub fn new_ratio_checked(num: i128, den: i128) -> Result<Ratio, CoreError> {
    if den == 0 {
        return Err(CoreError::InvalidRatio);
    }
    let (mut n, mut d) = (num, den);
    if d < 0 {
        n = -n;
        d = -d;
    }
    let g = gcd_i128(n, d);
    Ok(Ratio { num: n / g, den: d / g })
}

impl Ratio {
    pub const ZERO: Ratio = Ratio { num: 0, den: 1 };

    #[inline]
    pub fn from_int(n: i128) -> Self {
        Ratio { num: n, den: 1 }
    }

    /// `num / den` for unsigned counts; `den` must be non-zero.
    pub fn of(num: u64, den: u64) -> Result<Self, CoreError> {
        new_ratio_checked(i128::from(num), i128::from(den))
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    /// Largest integer `<= self`.
    #[inline]
    pub fn floor(&self) -> i128 {
        self.num.div_euclid(self.den)
    }

    /// Round to `scale` fractional digits, half away from zero.
    pub fn to_decimal(&self, scale: u32) -> Decimal {
        Decimal::from_fraction_half_away_from_zero(self.num, self.den, scale)
    }
}

/// Compare two ratios exactly (cross-multiply) with a tie returning `Equal`.
///
/// NOTE: Uses checked multiplication; in the unlikely event of overflow,
/// falls back to `f64` comparison (deterministic but lossy).
pub fn compare_ratio(a: &Ratio, b: &Ratio) -> Ordering {
    let g1 = gcd_i128(a.num, b.num);
    let g2 = gcd_i128(a.den, b.den);
    let an = a.num / g1;
    let bn = b.num / g1;
    let ad = a.den / g2;
    let bd = b.den / g2;

    if let (Some(l), Some(r)) = (an.checked_mul(bd), bn.checked_mul(ad)) {
        l.cmp(&r)
    } else {
        let af = (a.num as f64) / (a.den as f64);
        let bf = (b.num as f64) / (b.den as f64);
        af.partial_cmp(&bf).unwrap_or(Ordering::Equal)
    }
}

impl Ord for Ratio {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_ratio(self, other)
    }
}

impl PartialOrd for Ratio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'de> Deserialize<'de> for Ratio {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            num: i128,
            den: i128,
        }
        let raw = Raw::deserialize(d)?;
        new_ratio_checked(raw.num, raw.den).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

#[inline]
pub fn pow10(exp: u32) -> i128 {
    10i128.pow(exp)
}

/// Fixed-scale decimal: `mantissa × 10^-scale`. Serialized as its display string.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

impl Decimal {
    #[inline]
    pub fn new(mantissa: i128, scale: u32) -> Self {
        Decimal { mantissa, scale }
    }

    #[inline]
    pub fn from_int(n: i128) -> Self {
        Decimal { mantissa: n, scale: 0 }
    }

    /// Round `num / den` to `scale` fractional digits, half away from zero.
    /// A zero denominator yields zero.
    pub fn from_fraction_half_away_from_zero(num: i128, den: i128, scale: u32) -> Self {
        if den == 0 {
            return Decimal { mantissa: 0, scale };
        }
        let negative = (num < 0) != (den < 0);
        let n = abs_i128(num).saturating_mul(pow10(scale));
        let d = abs_i128(den);
        let mut q = n / d;
        let r = n % d;
        if r.saturating_mul(2) >= d {
            q += 1;
        }
        Decimal { mantissa: if negative { -q } else { q }, scale }
    }

    #[inline]
    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    #[inline]
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Drop trailing fractional zeros (`12.500` → `12.5`, `10.00` → `10`).
    pub fn normalize(self) -> Self {
        let mut m = self.mantissa;
        let mut s = self.scale;
        while s > 0 && m % 10 == 0 {
            m /= 10;
            s -= 1;
        }
        Decimal { mantissa: m, scale: s }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let abs = abs_i128(self.mantissa);
        if self.scale == 0 {
            return write!(f, "{sign}{abs}");
        }
        let p = pow10(self.scale);
        write!(
            f,
            "{sign}{}.{:0width$}",
            abs / p,
            abs % p,
            width = self.scale as usize
        )
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}
