///
/// probability calculation in log space
/// implements logaddexp
///
use approx::{AbsDiffEq, RelativeEq};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::str::FromStr;

///
/// Wrapper of f64 that represents probability `0 <= p <= 1`
/// by its natural log. `p = 0` is stored as `-inf`.
///
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, SerializeDisplay, DeserializeFromStr)]
pub struct Prob(f64);

///
/// short-hand of `Prob::from_prob`
///
pub fn p(p: f64) -> Prob {
    Prob::from_prob(p)
}

///
/// short-hand of `Prob::from_log_prob`
///
pub fn lp(lp: f64) -> Prob {
    Prob::from_log_prob(lp)
}

///
/// `log(exp(a) + exp(b))` of two raw log values.
///
/// ```text
/// log(exp(x) + exp(y))
///  = x + log(1 + exp(y-x))   (x >= y)
/// ```
///
/// Returns `-inf` if both are `-inf`.
///
#[inline]
pub fn add_log(a: f64, b: f64) -> f64 {
    let (x, y) = if a >= b { (a, b) } else { (b, a) };
    if y == f64::NEG_INFINITY {
        x
    } else if x == y {
        x + std::f64::consts::LN_2
    } else {
        x + (y - x).exp().ln_1p()
    }
}

///
/// `log(sum_i exp(xs[i]))` with a single pass over the max.
/// Empty slice gives `-inf`.
///
pub fn log_sum_exp(xs: &[f64]) -> f64 {
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = xs.iter().map(|x| (x - max).exp()).sum();
    max + sum.ln()
}

impl Prob {
    ///
    ///
    pub fn from_prob(value: f64) -> Prob {
        Prob(value.ln())
    }
    ///
    ///
    pub fn from_log_prob(log_value: f64) -> Prob {
        Prob(log_value)
    }
    ///
    /// Get the probability (in `[0, 1]`)
    pub fn to_value(self) -> f64 {
        self.0.exp()
    }
    ///
    /// Get the log probability
    pub fn to_log_value(self) -> f64 {
        self.0
    }
    ///
    /// Is `p == 0` or not? (log p = -inf)
    ///
    pub fn is_zero(self) -> bool {
        self.0.is_infinite() && self.0.is_sign_negative()
    }
    ///
    /// Is `p == 1`? (log p = 0)
    ///
    pub fn is_one(self) -> bool {
        self.0 == 0.0
    }
    ///
    /// prob=0.0
    ///
    pub fn zero() -> Prob {
        Prob(f64::NEG_INFINITY)
    }
    ///
    /// prob=1.0
    ///
    pub fn one() -> Prob {
        Prob(0.0)
    }
    ///
    /// abs diff of two probs `= |p_a - p_b|`
    ///
    pub fn diff(&self, other: Prob) -> f64 {
        (self.to_value() - other.to_value()).abs()
    }
    ///
    /// abs diff of two log probs `= |log p_a - log p_b|`
    ///
    pub fn log_diff(&self, other: Prob) -> f64 {
        match (self.is_zero(), other.is_zero()) {
            (true, true) => 0.0,
            (true, false) | (false, true) => f64::INFINITY,
            (false, false) => (self.to_log_value() - other.to_log_value()).abs(),
        }
    }
}

/// p=0 (Prob(-inf)) as a default value
impl Default for Prob {
    fn default() -> Self {
        Prob(f64::NEG_INFINITY)
    }
}

///
/// Prob has multiplicative identity element
/// `num_traits::One`
///
impl num_traits::One for Prob {
    fn one() -> Self {
        Prob::one()
    }
}

///
/// Prob has additive identity element
/// `num_traits::Zero`
///
impl num_traits::Zero for Prob {
    fn zero() -> Self {
        Prob::zero()
    }
    fn is_zero(&self) -> bool {
        Prob::is_zero(*self)
    }
}

// display
impl std::fmt::Display for Prob {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}({:.4})", self.0, self.to_value())
    }
}
impl FromStr for Prob {
    type Err = std::num::ParseFloatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let front = s.split_once('(').map(|(front, _)| front).unwrap_or(s);
        front.trim().parse::<f64>().map(Prob)
    }
}

/// Addition of two probabilities `px + py` in log space
/// (see `add_log`)
impl std::ops::Add for Prob {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Prob(add_log(self.0, other.0))
    }
}

/// Multiplication of two probabilities `px * py` in log space
///
/// ```text
/// log(px * py) = log(px) + log(py)
/// ```
impl std::ops::Mul for Prob {
    type Output = Self;
    fn mul(self, other: Self) -> Self {
        Prob(self.0 + other.0)
    }
}

/// Division of two probabilities `px / py` in log space
///
/// ```text
/// log(px / py) = log(px) - log(py)
/// ```
impl std::ops::Div for Prob {
    type Output = Self;
    fn div(self, other: Self) -> Self {
        Prob(self.0 - other.0)
    }
}

// assign
impl std::ops::AddAssign for Prob {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}
impl std::ops::MulAssign for Prob {
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}
// sum/prod
impl std::iter::Sum for Prob {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Prob::zero(), |a, b| a + b)
    }
}
impl<'a> std::iter::Sum<&'a Self> for Prob {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Prob::zero(), |a, b| a + *b)
    }
}
impl std::iter::Product for Prob {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Prob::one(), |a, b| a * b)
    }
}
impl<'a> std::iter::Product<&'a Self> for Prob {
    fn product<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Prob::one(), |a, b| a * *b)
    }
}

/// for approx `assert_abs_diff_eq`
impl AbsDiffEq for Prob {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        if self.is_zero() || other.is_zero() {
            self.is_zero() && other.is_zero()
        } else {
            f64::abs_diff_eq(&self.0, &other.0, epsilon)
        }
    }
}

impl RelativeEq for Prob {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        if self.is_zero() || other.is_zero() {
            self.is_zero() && other.is_zero()
        } else {
            f64::relative_eq(&self.0, &other.0, epsilon, max_relative)
        }
    }
}

impl Eq for Prob {}
impl Ord for Prob {
    /// NaN never appears in a well-formed trellis; it is ordered below
    /// every other value so that a max-search ignores it.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0
            .partial_cmp(&other.0)
            .unwrap_or_else(|| other.0.is_nan().cmp(&self.0.is_nan()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_log_zero_and_identity() {
        let inf = f64::NEG_INFINITY;
        assert_eq!(add_log(inf, inf), inf);
        assert_eq!(add_log(-1.5, inf), -1.5);
        assert_eq!(add_log(inf, -1.5), -1.5);
        assert_abs_diff_eq!(add_log(0.3f64.ln(), 0.3f64.ln()), 0.6f64.ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(add_log(0.5f64.ln(), 0.25f64.ln()), 0.75f64.ln(), epsilon = 1e-12);
    }
    #[test]
    fn add_log_does_not_underflow() {
        // exp(-1000) underflows to 0 in linear space
        let x = add_log(-1000.0, -1000.0);
        assert_abs_diff_eq!(x, -1000.0 + 2f64.ln(), epsilon = 1e-9);
        let y = add_log(-1000.0, -1001.0);
        assert_abs_diff_eq!(y, -1000.0 + (1.0 + (-1f64).exp()).ln(), epsilon = 1e-9);
    }
    #[test]
    fn log_sum_exp_matches_add_log() {
        let xs = [-3.0, -1.0, -2.5, f64::NEG_INFINITY, -0.1];
        let folded = xs.iter().fold(f64::NEG_INFINITY, |a, &b| add_log(a, b));
        assert_abs_diff_eq!(log_sum_exp(&xs), folded, epsilon = 1e-12);
        assert_eq!(log_sum_exp(&[]), f64::NEG_INFINITY);
        assert_eq!(
            log_sum_exp(&[f64::NEG_INFINITY, f64::NEG_INFINITY]),
            f64::NEG_INFINITY
        );
    }
    #[test]
    fn test_sum() {
        let xs = vec![
            Prob::from_prob(0.1),
            Prob::from_prob(0.1),
            Prob::from_prob(0.1),
        ];
        let x: Prob = xs.iter().sum();
        let y = Prob::from_prob(0.3);
        assert_relative_eq!(x.to_value(), y.to_value(), epsilon = 1e-12);
    }
    #[test]
    fn test_prod() {
        let xs = vec![
            Prob::from_prob(0.1),
            Prob::from_prob(0.1),
            Prob::from_prob(0.1),
        ];
        let x: Prob = xs.iter().product();
        let y = Prob::from_prob(0.001);
        assert_relative_eq!(x.to_value(), y.to_value(), epsilon = 1e-12);
    }
    #[test]
    fn prob_add_mul() {
        assert_eq!(p(0.0) + p(1.0), p(1.0));
        assert_eq!(p(0.0) * p(1.0), p(0.0));
        assert_abs_diff_eq!((p(0.3) + p(0.3)).0, p(0.6).0, epsilon = 1e-12);
        assert_abs_diff_eq!((p(0.3) * p(0.3)).0, p(0.09).0, epsilon = 1e-12);
        assert_abs_diff_eq!((p(0.5) + p(0.00001)).0, p(0.50001).0, epsilon = 1e-12);
        assert_abs_diff_eq!((p(0.5) * p(0.00001)).0, p(0.000005).0, epsilon = 1e-12);
    }
    #[test]
    fn prob_sum_prod_of_empty() {
        let xs: Vec<Prob> = vec![];
        let sum: Prob = xs.iter().sum();
        let product: Prob = xs.iter().product();
        assert_eq!(sum, p(0.0));
        assert_eq!(product, p(1.0));

        let xs: Vec<Prob> = vec![p(0.0), p(0.0)];
        let sum: Prob = xs.iter().sum();
        let product: Prob = xs.iter().product();
        assert_eq!(sum, p(0.0));
        assert_eq!(product, p(0.0));
    }
    #[test]
    fn test_prob_assign() {
        let mut x = p(0.4);
        x += p(0.2);
        assert_abs_diff_eq!(x, p(0.6), epsilon = 1e-12);
        x *= p(0.5);
        assert_abs_diff_eq!(x, p(0.3), epsilon = 1e-12);
        x += p(0.0);
        assert_abs_diff_eq!(x, p(0.3), epsilon = 1e-12);
        x *= p(0.0);
        assert!(x.is_zero());
    }
    #[test]
    fn prob_sort() {
        let mut ps = vec![p(0.9), p(0.2), p(0.5), p(0.1), p(1.0), p(0.0)];
        ps.sort();
        assert_eq!(ps, vec![p(0.0), p(0.1), p(0.2), p(0.5), p(0.9), p(1.0)]);
        let max = ps.iter().max().unwrap();
        assert_eq!(*max, p(1.0));
        assert!(p(0.1) > p(0.09999));
        assert!(p(0.0) < p(0.01));
    }
    #[test]
    fn prob_zero_eq() {
        // two zeros are equal under approx
        assert!(abs_diff_eq!(p(0.0), p(0.0)));
        assert!(!abs_diff_eq!(p(0.0), p(0.1)));
        assert!(abs_diff_eq!(p(0.1), p(0.11), epsilon = 0.1));
        assert!(Prob::zero().is_zero());
        assert!(Prob::one().is_one());
    }
    #[test]
    fn prob_serialize() {
        let p1 = Prob::one();
        let p05 = Prob::from_prob(0.5);
        let p0 = Prob::zero();
        assert_eq!(Prob::from_str(&p1.to_string()).unwrap(), p1);
        assert_eq!(Prob::from_str(&p05.to_string()).unwrap(), p05);
        assert_eq!(Prob::from_str(&p0.to_string()).unwrap(), p0);
        assert_eq!(Prob::from_str("-0.5").unwrap(), lp(-0.5));

        let f = |p: Prob| -> Prob {
            let json = serde_json::to_string(&p).unwrap();
            serde_json::from_str(&json).unwrap()
        };
        assert_eq!(p1, f(p1));
        assert_eq!(p05, f(p05));
        assert_eq!(p0, f(p0));
    }
    #[test]
    fn prob_diff() {
        let p1 = Prob::one();
        let p0 = Prob::zero();
        assert_eq!(0.0, p1.log_diff(p1));
        assert_eq!(0.0, p0.log_diff(p0));
        assert_eq!(f64::INFINITY, p0.log_diff(p1));
        assert_eq!(f64::INFINITY, p1.log_diff(p0));
        assert_abs_diff_eq!(p(0.5).diff(p(0.25)), 0.25, epsilon = 1e-12);
    }
}
