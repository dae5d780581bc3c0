//! Local data of the curve at small primes.
//!
//! Counts points on the reduced curve over F_p by quadratic-residue testing
//! (the documented O(p²) naive baseline) and derives the Frobenius trace
//! a_p = p + 1 − N_p, the defining datum of the Euler factor at p.

use serde::{Deserialize, Serialize};

use crate::arith::{is_quadratic_residue, mod_reduce};
use crate::curve::CurveParams;

/// Per-prime local data of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFactor {
    pub p: u64,
    /// Frobenius trace a_p = p + 1 − N_p; Hasse: |a_p| ≤ 2√p.
    pub a_p: i64,
    /// Points on the reduced curve including the point at infinity, in [1, 2p+1].
    pub n_p: u64,
}

impl LocalFactor {
    pub fn compute(params: &CurveParams, p: u64) -> Self {
        let n_p = count_points(params, p);
        LocalFactor {
            p,
            a_p: p as i64 + 1 - n_p as i64,
            n_p,
        }
    }

    /// Euler-factor denominator 1 − a_p·p^{−s} + p^{1−2s} at the given s.
    pub fn denominator_at(&self, s: f64) -> f64 {
        let p = self.p as f64;
        1.0 - self.a_p as f64 * p.powf(-s) + p.powf(1.0 - 2.0 * s)
    }
}

/// Count the points of y² = x³ + ax + b over F_p, including the point at
/// infinity.
///
/// For each x in [0, p−1]: a vanishing right-hand side contributes the
/// single root y = 0, a quadratic residue contributes the pair ±y, and a
/// non-residue contributes nothing. O(p²) with the naive residue scan.
pub fn count_points(params: &CurveParams, p: u64) -> u64 {
    let a = mod_reduce(params.a, p) as u128;
    let b = mod_reduce(params.b, p) as u128;
    let m = p as u128;

    let mut count = 1u64; // point at infinity
    for x in 0..p {
        let x = x as u128;
        let rhs = ((x * x % m * x) % m + a * x % m + b) % m;
        if rhs == 0 {
            count += 1;
        } else if is_quadratic_residue(rhs as i64, p) {
            count += 2;
        }
    }
    count
}

/// Frobenius trace a_p = p + 1 − N_p.
pub fn frobenius_trace(params: &CurveParams, p: u64) -> i64 {
    p as i64 + 1 - count_points(params, p) as i64
}
