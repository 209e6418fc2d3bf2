//! Numeric coefficients
//!
//! Rationals are exact and always reduced, so deciding whether a rewritten
//! equation is `0` never depends on rounding. Arithmetic that would overflow
//! `i64` falls back to `Float`; integral float results are folded back into
//! rationals where they fit.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Works on magnitudes so `i64::MIN` cannot overflow
fn gcd(a: i64, b: i64) -> u64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

fn isqrt_exact(n: i64) -> Option<i64> {
    let guess = (n as f64).sqrt().round() as i64;
    (guess.saturating_sub(1)..=guess.saturating_add(1))
        .find(|r| *r >= 0 && r.checked_mul(*r) == Some(n))
}

/// Exact `num/den` when both parts were computed without overflow,
/// otherwise the float approximation
fn exact_or_float(num: Option<i64>, den: Option<i64>, approx: impl FnOnce() -> f64) -> Coefficient {
    match (num, den) {
        (Some(n), Some(d)) => Coefficient::rational(n, d),
        _ => Coefficient::from_f64_exact(approx()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Coefficient {
    /// Invariant: denominator > 0, gcd(num, den) == 1
    Rational(i64, i64),
    Float(f64),
}

impl Coefficient {
    pub fn int(n: i64) -> Self {
        Coefficient::Rational(n, 1)
    }

    /// Reduced `num/den`. A zero denominator yields a signed infinity.
    pub fn rational(num: i64, den: i64) -> Self {
        if den == 0 {
            return Coefficient::Float(if num >= 0 {
                f64::INFINITY
            } else {
                f64::NEG_INFINITY
            });
        }

        let (num, den) = if den < 0 {
            match (num.checked_neg(), den.checked_neg()) {
                (Some(n), Some(d)) => (n, d),
                _ => return Coefficient::Float(num as f64 / den as f64),
            }
        } else {
            (num, den)
        };
        // den > 0 bounds the divisor, so it fits back into i64
        let g = gcd(num, den) as i64;
        Coefficient::Rational(num / g, den / g)
    }

    /// Integral finite floats become rationals; everything else stays float
    pub fn from_f64_exact(f: f64) -> Self {
        if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
            Coefficient::int(f as i64)
        } else {
            Coefficient::Float(f)
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Coefficient::Rational(n, _) => *n == 0,
            Coefficient::Float(f) => *f == 0.0,
        }
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Coefficient::Rational(1, 1))
    }

    pub fn is_neg_one(&self) -> bool {
        matches!(self, Coefficient::Rational(-1, 1))
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Coefficient::Rational(n, _) => *n < 0,
            Coefficient::Float(f) => *f < 0.0,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.as_integer().is_some()
    }

    /// The value as an integer, if it is one exactly
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Coefficient::Rational(n, 1) => Some(*n),
            _ => None,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Coefficient::Rational(n, d) => *n as f64 / *d as f64,
            Coefficient::Float(f) => *f,
        }
    }

    pub fn abs(&self) -> Self {
        match self {
            Coefficient::Rational(n, d) => match n.checked_abs() {
                Some(n) => Coefficient::Rational(n, *d),
                None => Coefficient::Float(-(*n as f64) / *d as f64),
            },
            Coefficient::Float(f) => Coefficient::Float(f.abs()),
        }
    }

    /// `1/self`
    pub fn recip(&self) -> Self {
        match self {
            Coefficient::Rational(n, d) => Coefficient::rational(*d, *n),
            Coefficient::Float(f) => Coefficient::Float(1.0 / f),
        }
    }

    /// Integer power, exact unless the result overflows
    pub fn pow_int(&self, exp: i32) -> Self {
        if exp < 0 {
            return self.pow_int(exp.saturating_neg()).recip();
        }
        match self {
            Coefficient::Rational(n, d) => {
                let e = exp.unsigned_abs();
                exact_or_float(n.checked_pow(e), d.checked_pow(e), || {
                    self.to_f64().powi(exp)
                })
            }
            Coefficient::Float(f) => Coefficient::Float(f.powi(exp)),
        }
    }

    /// Power that stays exact, or `None` when the result would be irrational
    /// or undefined (`0^-n`, even roots of negatives, non-square rationals).
    ///
    /// Float operands always produce a float result.
    pub fn checked_pow(&self, exp: &Coefficient) -> Option<Self> {
        if self.is_zero() && exp.is_negative() {
            return None;
        }
        match (self, exp) {
            (Coefficient::Rational(..), Coefficient::Rational(n, 1)) => {
                i32::try_from(*n).ok().map(|e| self.pow_int(e))
            }
            (Coefficient::Rational(..), Coefficient::Rational(n, 2)) => {
                let root = self.sqrt_exact()?;
                i32::try_from(*n).ok().map(|e| root.pow_int(e))
            }
            (Coefficient::Rational(..), Coefficient::Rational(..)) => None,
            _ => {
                let value = self.to_f64().powf(exp.to_f64());
                value.is_finite().then(|| Coefficient::from_f64_exact(value))
            }
        }
    }

    /// Exact square root of a non-negative rational whose numerator and
    /// denominator are both perfect squares
    pub fn sqrt_exact(&self) -> Option<Self> {
        match self {
            Coefficient::Rational(n, d) if *n >= 0 => {
                Some(Coefficient::rational(isqrt_exact(*n)?, isqrt_exact(*d)?))
            }
            _ => None,
        }
    }
}

// Rationals and floats never compare equal: an exact zero must stay
// distinguishable from a rounded one. Hash agrees with this.
impl PartialEq for Coefficient {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Coefficient::Rational(n1, d1), Coefficient::Rational(n2, d2)) => n1 == n2 && d1 == d2,
            (Coefficient::Float(a), Coefficient::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Coefficient {}

impl Hash for Coefficient {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Coefficient::Rational(n, d) => {
                state.write_u8(0);
                n.hash(state);
                d.hash(state);
            }
            Coefficient::Float(f) => {
                state.write_u8(1);
                f.to_bits().hash(state);
            }
        }
    }
}

impl PartialOrd for Coefficient {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Numeric order; equal values of different kinds put rationals first
impl Ord for Coefficient {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Coefficient::Rational(n1, d1), Coefficient::Rational(n2, d2)) => {
                // d1, d2 > 0, so cross-multiplying keeps the order
                (*n1 as i128 * *d2 as i128).cmp(&(*n2 as i128 * *d1 as i128))
            }
            _ => self
                .to_f64()
                .total_cmp(&other.to_f64())
                .then_with(|| self.kind_rank().cmp(&other.kind_rank())),
        }
    }
}

impl Coefficient {
    fn kind_rank(&self) -> u8 {
        match self {
            Coefficient::Rational(..) => 0,
            Coefficient::Float(_) => 1,
        }
    }
}

impl Default for Coefficient {
    fn default() -> Self {
        Coefficient::int(0)
    }
}

impl From<i64> for Coefficient {
    fn from(n: i64) -> Self {
        Coefficient::int(n)
    }
}

impl From<f64> for Coefficient {
    fn from(f: f64) -> Self {
        Coefficient::from_f64_exact(f)
    }
}

impl Neg for Coefficient {
    type Output = Coefficient;

    fn neg(self) -> Self::Output {
        match self {
            Coefficient::Rational(n, d) => match n.checked_neg() {
                Some(n) => Coefficient::Rational(n, d),
                None => Coefficient::Float(-(n as f64) / d as f64),
            },
            Coefficient::Float(f) => Coefficient::Float(-f),
        }
    }
}

impl Add for Coefficient {
    type Output = Coefficient;

    fn add(self, rhs: Self) -> Self::Output {
        match (&self, &rhs) {
            (Coefficient::Rational(n1, d1), Coefficient::Rational(n2, d2)) => {
                // n1/d1 + n2/d2 = (n1*d2 + n2*d1) / (d1*d2)
                let num = n1
                    .checked_mul(*d2)
                    .zip(n2.checked_mul(*d1))
                    .and_then(|(a, b)| a.checked_add(b));
                exact_or_float(num, d1.checked_mul(*d2), || self.to_f64() + rhs.to_f64())
            }
            _ => Coefficient::from_f64_exact(self.to_f64() + rhs.to_f64()),
        }
    }
}

impl Sub for Coefficient {
    type Output = Coefficient;

    fn sub(self, rhs: Self) -> Self::Output {
        self + (-rhs)
    }
}

impl Mul for Coefficient {
    type Output = Coefficient;

    fn mul(self, rhs: Self) -> Self::Output {
        match (&self, &rhs) {
            (Coefficient::Rational(n1, d1), Coefficient::Rational(n2, d2)) => {
                // Cross-reduce first to keep intermediates small
                let g1 = gcd(*n1, *d2) as i64;
                let g2 = gcd(*n2, *d1) as i64;
                let num = (n1 / g1).checked_mul(n2 / g2);
                let den = (d1 / g2).checked_mul(d2 / g1);
                exact_or_float(num, den, || self.to_f64() * rhs.to_f64())
            }
            _ => Coefficient::from_f64_exact(self.to_f64() * rhs.to_f64()),
        }
    }
}

impl Div for Coefficient {
    type Output = Coefficient;

    fn div(self, rhs: Self) -> Self::Output {
        self * rhs.recip()
    }
}

impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coefficient::Rational(n, 1) => write!(f, "{}", n),
            Coefficient::Rational(n, d) => write!(f, "{}/{}", n, d),
            Coefficient::Float(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_formula_arithmetic() {
        // -b/(2a) for a = 3/2, b = -9/4 is 3/4
        let a = Coefficient::rational(3, 2);
        let b = Coefficient::rational(-9, 4);
        let root = -b / (Coefficient::int(2) * a);
        assert_eq!(root, Coefficient::rational(3, 4));

        // b^2 - 4ac with c = 1/2
        let disc = Coefficient::rational(-9, 4).pow_int(2)
            - Coefficient::int(4) * Coefficient::rational(3, 2) * Coefficient::rational(1, 2);
        assert_eq!(disc, Coefficient::rational(33, 16));
    }

    #[test]
    fn test_rationals_stay_reduced() {
        assert_eq!(Coefficient::rational(4, -6), Coefficient::Rational(-2, 3));
        assert_eq!(Coefficient::rational(0, 5), Coefficient::int(0));
        assert_eq!(
            Coefficient::rational(1, 3) + Coefficient::rational(2, 3),
            Coefficient::int(1)
        );
    }

    #[test]
    fn test_exact_zero_differs_from_float_zero() {
        let exact = Coefficient::int(0);
        let float = Coefficient::Float(1e-300);
        assert_ne!(exact, float);
        assert!(exact < float);
        assert!(Coefficient::Float(0.0).is_zero());
    }

    #[test]
    fn test_overflow_falls_back_to_float() {
        let big = Coefficient::int(i64::MAX);
        assert!(matches!(big.clone() * big.clone(), Coefficient::Float(_)));
        assert!(matches!(-Coefficient::int(i64::MIN), Coefficient::Float(_)));
        assert!(matches!(Coefficient::int(10).pow_int(40), Coefficient::Float(_)));
    }

    #[test]
    fn test_extreme_numerators_do_not_overflow() {
        let min = Coefficient::int(i64::MIN + 1) + Coefficient::int(-1);
        assert_eq!(min, Coefficient::int(i64::MIN));
        assert!(matches!(min.abs(), Coefficient::Float(_)));

        assert!(matches!(Coefficient::rational(i64::MIN, -1), Coefficient::Float(_)));
        assert_eq!(Coefficient::rational(i64::MIN, 2), Coefficient::int(i64::MIN / 2));
        assert!(matches!(Coefficient::int(i64::MIN).recip(), Coefficient::Float(_)));
        assert_eq!(
            Coefficient::int(i64::MIN) * Coefficient::rational(1, 2),
            Coefficient::int(i64::MIN / 2)
        );
    }

    #[test]
    fn test_negative_powers_invert() {
        let a = Coefficient::rational(2, 3);
        assert_eq!(a.pow_int(2), Coefficient::rational(4, 9));
        assert_eq!(a.pow_int(-1), Coefficient::rational(3, 2));
        assert_eq!(a.pow_int(0), Coefficient::int(1));
    }

    #[test]
    fn test_checked_pow_square_roots() {
        let half = Coefficient::rational(1, 2);
        assert_eq!(Coefficient::int(16).checked_pow(&half), Some(Coefficient::int(4)));
        assert_eq!(
            Coefficient::rational(9, 4).checked_pow(&half),
            Some(Coefficient::rational(3, 2))
        );
        assert_eq!(Coefficient::int(2).checked_pow(&half), None);
        assert_eq!(Coefficient::int(-4).checked_pow(&half), None);

        // 4^(3/2) = 8
        assert_eq!(
            Coefficient::int(4).checked_pow(&Coefficient::rational(3, 2)),
            Some(Coefficient::int(8))
        );
    }

    #[test]
    fn test_checked_pow_zero_base() {
        assert_eq!(Coefficient::int(0).checked_pow(&Coefficient::int(-1)), None);
        assert_eq!(
            Coefficient::int(0).checked_pow(&Coefficient::int(3)),
            Some(Coefficient::int(0))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Coefficient::int(-3).to_string(), "-3");
        assert_eq!(Coefficient::rational(1, 2).to_string(), "1/2");
    }
}
