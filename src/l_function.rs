//! Truncated Euler-product approximation of L(E, s) at s = 1.
//!
//! L(E, s) ≈ Π_{p ≤ P} (1 − a_p p^{−s} + p^{1−2s})^{−1} over the primes up
//! to a configurable bound, with a_p taken from the local point counts. The
//! product is finite, so s = 1 is evaluated by direct substitution unless a
//! local denominator vanishes there; in that case the value is resolved by
//! Richardson extrapolation of perturbed evaluations s → 1⁺ instead of
//! dividing by zero.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::arith::sieve_primes;
use crate::curve::CurveParams;
use crate::error::ExplorerError;
use crate::local::LocalFactor;

/// Denominator magnitude below which direct substitution at s = 1 is
/// abandoned for the limiting evaluation.
const SINGULAR_EPS: f64 = 1e-12;

/// Perturbation step for the limiting evaluation.
const LIMIT_DELTA: f64 = 1e-4;

/// The truncated L-function value at s = 1 together with the local data it
/// was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LFunctionApproximation {
    pub value_at_1: f64,
    pub primes_used: Vec<u64>,
    pub local_factors: Vec<LocalFactor>,
    /// True when a vanishing local denominator forced the limiting
    /// evaluation instead of direct substitution.
    pub limit_resolved: bool,
}

/// Approximate L(E, 1) from the Euler factors at all primes ≤ `max_prime`.
pub fn approximate(
    params: &CurveParams,
    max_prime: u64,
) -> Result<LFunctionApproximation, ExplorerError> {
    approximate_within(params, max_prime, None)
}

/// Deadline-aware variant used by the analyzer; the deadline is checked
/// between primes.
pub(crate) fn approximate_within(
    params: &CurveParams,
    max_prime: u64,
    deadline: Option<Instant>,
) -> Result<LFunctionApproximation, ExplorerError> {
    let factors = collect_local_factors(params, max_prime, deadline)?;
    let (value_at_1, limit_resolved) = evaluate_at_1(&factors);
    Ok(LFunctionApproximation {
        value_at_1,
        primes_used: factors.iter().map(|f| f.p).collect(),
        local_factors: factors,
        limit_resolved,
    })
}

/// Compute the local factors for all primes ≤ `max_prime`, ascending.
///
/// Each factor is independent of the others, so they are counted in
/// parallel; the ordered collect keeps the output deterministic.
pub(crate) fn collect_local_factors(
    params: &CurveParams,
    max_prime: u64,
    deadline: Option<Instant>,
) -> Result<Vec<LocalFactor>, ExplorerError> {
    sieve_primes(max_prime)
        .par_iter()
        .map(|&p| {
            if let Some(d) = deadline {
                if Instant::now() >= d {
                    return Err(ExplorerError::TimeBudgetExceeded);
                }
            }
            Ok(LocalFactor::compute(params, p))
        })
        .collect()
}

/// Evaluate the truncated product at the given s by direct substitution.
pub fn product_at(factors: &[LocalFactor], s: f64) -> f64 {
    factors.iter().map(|f| 1.0 / f.denominator_at(s)).product()
}

/// Evaluate the product at s = 1, resolving a vanishing local denominator
/// via a numeric limit.
///
/// Returns the value and whether the limiting path was taken. The limit uses
/// Richardson extrapolation of two perturbed evaluations,
/// 2·f(1 + δ/2) − f(1 + δ), which cancels the O(δ) error term.
pub fn evaluate_at_1(factors: &[LocalFactor]) -> (f64, bool) {
    let singular = factors
        .iter()
        .any(|f| f.denominator_at(1.0).abs() < SINGULAR_EPS);
    if !singular {
        return (product_at(factors, 1.0), false);
    }

    let coarse = product_at(factors, 1.0 + LIMIT_DELTA);
    let fine = product_at(factors, 1.0 + LIMIT_DELTA / 2.0);
    let extrapolated = 2.0 * fine - coarse;
    if extrapolated.is_finite() {
        (extrapolated, true)
    } else {
        (fine, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_at_1_is_product_of_p_over_np() {
        // At s = 1 every denominator is N_p/p, so the product telescopes to
        // Π p/N_p.
        let params = CurveParams::new(-5, 5);
        let approx = approximate(&params, 50).unwrap();
        let expected: f64 = approx
            .local_factors
            .iter()
            .map(|f| f.p as f64 / f.n_p as f64)
            .product();
        assert!(
            (approx.value_at_1 - expected).abs() < 1e-9,
            "L(1) = {}, expected {}",
            approx.value_at_1,
            expected
        );
        assert!(!approx.limit_resolved);
    }

    #[test]
    fn test_primes_used_ascending() {
        let params = CurveParams::new(0, 1);
        let approx = approximate(&params, 100).unwrap();
        assert_eq!(approx.primes_used, sieve_primes(100));
        assert_eq!(approx.primes_used.len(), approx.local_factors.len());
    }

    #[test]
    fn test_value_is_finite_and_positive() {
        // N_p ≥ 1 keeps every factor p/N_p in (0, p], so the product is a
        // positive finite real.
        for (a, b) in [(-5i64, 5i64), (-1, 0), (0, 0), (3, -4), (-10, 20)] {
            let approx = approximate(&CurveParams::new(a, b), 100).unwrap();
            assert!(
                approx.value_at_1.is_finite() && approx.value_at_1 > 0.0,
                "L(1) = {} for a={}, b={}",
                approx.value_at_1,
                a,
                b
            );
        }
    }

    #[test]
    fn test_determinism() {
        let params = CurveParams::new(2, 3);
        let first = approximate(&params, 100).unwrap();
        let second = approximate(&params, 100).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_singular_denominator_resolved_by_limit() {
        // A synthetic factor with a_p = p + 1 makes the denominator vanish
        // exactly at s = 1; the limiting evaluation must return a finite
        // value rather than dividing by zero.
        let singular = LocalFactor { p: 5, a_p: 6, n_p: 0 };
        assert!(singular.denominator_at(1.0).abs() < 1e-12);
        let (value, resolved) = evaluate_at_1(&[singular]);
        assert!(resolved);
        assert!(value.is_finite(), "limit evaluation produced {}", value);
    }

    #[test]
    fn test_limit_path_not_taken_for_regular_factors() {
        let factors = vec![
            LocalFactor { p: 2, a_p: 0, n_p: 3 },
            LocalFactor { p: 3, a_p: -1, n_p: 5 },
        ];
        let (value, resolved) = evaluate_at_1(&factors);
        assert!(!resolved);
        let expected = (2.0 / 3.0) * (3.0 / 5.0);
        assert!((value - expected).abs() < 1e-12);
    }
}
