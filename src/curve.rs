//! Short-Weierstrass curve parameters and bounded rational-point search.
//!
//! Points are found by stepping x across [−bound, +bound] and testing
//! whether x³ + ax + b is a (near-)perfect square. Two square tests are
//! available: the tolerance-based test for fractional stepping, and an exact
//! integer test with checked arithmetic for integral stepping.

use std::fmt;
use std::time::Instant;

use num_integer::Roots;
use serde::{Deserialize, Serialize};

use crate::arith::{is_near_square, is_perfect_square};
use crate::error::ExplorerError;

/// Coefficients of a short-Weierstrass curve y² = x³ + ax + b.
///
/// Coefficients are integers: every local computation reduces them mod p.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveParams {
    pub a: i64,
    pub b: i64,
}

impl CurveParams {
    pub fn new(a: i64, b: i64) -> Self {
        CurveParams { a, b }
    }

    /// Right-hand side x³ + ax + b as a real value.
    pub fn rhs(&self, x: f64) -> f64 {
        x * x * x + self.a as f64 * x + self.b as f64
    }

    /// Right-hand side with checked integer arithmetic; `None` on overflow.
    pub fn rhs_exact(&self, x: i64) -> Option<i128> {
        let x = x as i128;
        let cube = x.checked_mul(x)?.checked_mul(x)?;
        let linear = (self.a as i128).checked_mul(x)?;
        cube.checked_add(linear)?.checked_add(self.b as i128)
    }
}

impl fmt::Display for CurveParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "y² = x³")?;
        if self.a != 0 {
            write!(f, " {} {}x", if self.a < 0 { "-" } else { "+" }, self.a.abs())?;
        }
        if self.b != 0 {
            write!(f, " {} {}", if self.b < 0 { "-" } else { "+" }, self.b.abs())?;
        }
        Ok(())
    }
}

/// A point (x, y) with y² = x³ + ax + b within the search tolerance.
///
/// Produced by the point search, never mutated. The exact-integer search
/// emits exactly integral coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RationalPoint {
    pub x: f64,
    pub y: f64,
}

/// Bounded brute-force point search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// x is stepped across [−bound, +bound].
    pub bound: f64,
    /// Step size; strictly positive, may be fractional.
    pub step: f64,
    /// Tolerance for the near-square test and the y ≈ 0 check.
    pub tolerance: f64,
    /// Use the exact integer square test instead of the tolerance test.
    /// Requires integral bound and step.
    pub exact: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            bound: 50.0,
            step: 1.0,
            tolerance: 1e-6,
            exact: false,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ExplorerError> {
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(ExplorerError::InvalidConfig(format!(
                "point search step must be strictly positive, got {}",
                self.step
            )));
        }
        if !self.bound.is_finite() || self.bound < 0.0 {
            return Err(ExplorerError::InvalidConfig(format!(
                "point search bound must be non-negative, got {}",
                self.bound
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ExplorerError::InvalidConfig(format!(
                "tolerance must be strictly positive, got {}",
                self.tolerance
            )));
        }
        if self.exact && (self.step.fract() != 0.0 || self.bound.fract() != 0.0) {
            return Err(ExplorerError::InvalidConfig(format!(
                "exact search requires integral bound and step, got bound={}, step={}",
                self.bound, self.step
            )));
        }
        Ok(())
    }
}

/// Search for points on the curve with x in [−bound, +bound].
///
/// For each x in ascending order: if x³ + ax + b passes the square test,
/// emit (x, +√y2), and when √y2 exceeds the tolerance away from zero also
/// emit (x, −√y2), so (x, 0) appears exactly once. The sequence is finite,
/// deterministic, and ordered by increasing x.
pub fn find_points(
    params: &CurveParams,
    config: &SearchConfig,
) -> Result<Vec<RationalPoint>, ExplorerError> {
    find_points_within(params, config, None)
}

/// Deadline-aware variant used by the analyzer; the deadline is checked
/// between x-steps.
pub(crate) fn find_points_within(
    params: &CurveParams,
    config: &SearchConfig,
    deadline: Option<Instant>,
) -> Result<Vec<RationalPoint>, ExplorerError> {
    config.validate()?;
    if config.exact {
        return find_integer_points_within(params, config.bound as i64, config.step as i64, deadline);
    }

    // Index-based stepping keeps the step count exact for fractional steps.
    let n_steps = (2.0 * config.bound / config.step + 1e-9).floor() as u64;
    let mut points = Vec::new();
    for i in 0..=n_steps {
        if let Some(d) = deadline {
            if Instant::now() >= d {
                return Err(ExplorerError::TimeBudgetExceeded);
            }
        }
        let x = -config.bound + i as f64 * config.step;
        let y2 = params.rhs(x);
        if !is_near_square(y2, config.tolerance) {
            continue;
        }
        let y = y2.sqrt();
        points.push(RationalPoint { x, y });
        if y > config.tolerance {
            points.push(RationalPoint { x, y: -y });
        }
    }
    Ok(points)
}

/// Exact-integer point search: integral x stepping, checked i128 arithmetic,
/// and the no-tolerance square test.
pub fn find_integer_points(
    params: &CurveParams,
    bound: i64,
    step: i64,
) -> Result<Vec<RationalPoint>, ExplorerError> {
    find_integer_points_within(params, bound, step, None)
}

fn find_integer_points_within(
    params: &CurveParams,
    bound: i64,
    step: i64,
    deadline: Option<Instant>,
) -> Result<Vec<RationalPoint>, ExplorerError> {
    if step <= 0 {
        return Err(ExplorerError::InvalidConfig(format!(
            "point search step must be strictly positive, got {}",
            step
        )));
    }
    let mut points = Vec::new();
    let mut x = -bound;
    while x <= bound {
        if let Some(d) = deadline {
            if Instant::now() >= d {
                return Err(ExplorerError::TimeBudgetExceeded);
            }
        }
        let y2 = params
            .rhs_exact(x)
            .ok_or(ExplorerError::Overflow { a: params.a, b: params.b })?;
        if is_perfect_square(y2) {
            let y = y2.sqrt();
            points.push(RationalPoint { x: x as f64, y: y as f64 });
            if y != 0 {
                points.push(RationalPoint { x: x as f64, y: -y as f64 });
            }
        }
        x = match x.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(points)
}

/// Dense real-valued sampling of the curve for plotting callers.
///
/// Returns (x, y) pairs for both branches wherever x³ + ax + b ≥ 0, ordered
/// by increasing x with the +y branch first at each sample.
pub fn sample_curve(params: &CurveParams, x_min: f64, x_max: f64, samples: usize) -> Vec<(f64, f64)> {
    if samples < 2 || x_max <= x_min {
        return Vec::new();
    }
    let dx = (x_max - x_min) / (samples - 1) as f64;
    let mut out = Vec::new();
    for i in 0..samples {
        let x = x_min + i as f64 * dx;
        let y2 = params.rhs(x);
        if y2 >= 0.0 {
            let y = y2.sqrt();
            out.push((x, y));
            out.push((x, -y));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_set(points: &[RationalPoint]) -> Vec<(i64, i64)> {
        points.iter().map(|p| (p.x as i64, p.y as i64)).collect()
    }

    #[test]
    fn test_display() {
        assert_eq!(CurveParams::new(-5, 5).to_string(), "y² = x³ - 5x + 5");
        assert_eq!(CurveParams::new(0, 0).to_string(), "y² = x³");
        assert_eq!(CurveParams::new(1, -2).to_string(), "y² = x³ + 1x - 2");
    }

    #[test]
    fn test_known_points_a_minus5_b_5() {
        // y² = x³ - 5x + 5 has exactly these integer points for |x| ≤ 25
        let params = CurveParams::new(-5, 5);
        let points = find_integer_points(&params, 25, 1).unwrap();
        assert_eq!(
            point_set(&points),
            vec![(-1, 3), (-1, -3), (1, 1), (1, -1), (4, 7), (4, -7)]
        );
    }

    #[test]
    fn test_known_points_a_minus1_b_0() {
        // x³ - x vanishes at x = -1, 0, 1; no other squares in range
        let params = CurveParams::new(-1, 0);
        let points = find_integer_points(&params, 10, 1).unwrap();
        assert_eq!(point_set(&points), vec![(-1, 0), (0, 0), (1, 0)]);
    }

    #[test]
    fn test_float_and_exact_search_agree_on_integral_grid() {
        let params = CurveParams::new(-5, 5);
        let config = SearchConfig {
            bound: 25.0,
            step: 1.0,
            tolerance: 1e-6,
            exact: false,
        };
        let float_points = find_points(&params, &config).unwrap();
        let exact_points = find_integer_points(&params, 25, 1).unwrap();
        assert_eq!(point_set(&float_points), point_set(&exact_points));
    }

    #[test]
    fn test_points_satisfy_curve_equation() {
        let params = CurveParams::new(-2, 1);
        let config = SearchConfig {
            bound: 40.0,
            step: 0.5,
            tolerance: 1e-6,
            exact: false,
        };
        for p in find_points(&params, &config).unwrap() {
            let residual = (p.y * p.y - params.rhs(p.x)).abs();
            assert!(
                residual < 1e-6,
                "point ({}, {}) off the curve by {}",
                p.x,
                p.y,
                residual
            );
        }
    }

    #[test]
    fn test_negation_pairing_and_unique_zero() {
        let params = CurveParams::new(-1, 0);
        let config = SearchConfig {
            bound: 10.0,
            step: 1.0,
            tolerance: 1e-6,
            exact: false,
        };
        let points = find_points(&params, &config).unwrap();
        for p in &points {
            if p.y.abs() > config.tolerance {
                assert!(
                    points.iter().any(|q| q.x == p.x && q.y == -p.y),
                    "missing negation of ({}, {})",
                    p.x,
                    p.y
                );
            } else {
                let zero_count = points.iter().filter(|q| q.x == p.x).count();
                assert_eq!(zero_count, 1, "(x, 0) at x={} emitted more than once", p.x);
            }
        }
    }

    #[test]
    fn test_ordered_by_increasing_x() {
        let params = CurveParams::new(-5, 5);
        let points = find_integer_points(&params, 25, 1).unwrap();
        for window in points.windows(2) {
            assert!(window[0].x <= window[1].x);
        }
    }

    #[test]
    fn test_invalid_step_rejected() {
        let params = CurveParams::new(0, 1);
        for step in [0.0, -1.0] {
            let config = SearchConfig {
                bound: 5.0,
                step,
                tolerance: 1e-6,
                exact: false,
            };
            assert!(matches!(
                find_points(&params, &config),
                Err(ExplorerError::InvalidConfig(_))
            ));
        }
        assert!(matches!(
            find_integer_points(&params, 5, 0),
            Err(ExplorerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_exact_search_overflow_is_an_error() {
        let params = CurveParams::new(i64::MAX, i64::MAX);
        let result = find_integer_points(&params, i64::MAX / 2, i64::MAX / 4);
        assert!(matches!(result, Err(ExplorerError::Overflow { .. })));
    }

    #[test]
    fn test_sample_curve_branches() {
        let params = CurveParams::new(0, 1);
        let samples = sample_curve(&params, -1.0, 2.0, 100);
        assert!(!samples.is_empty());
        for &(x, y) in &samples {
            assert!(
                (y * y - params.rhs(x)).abs() < 1e-9,
                "sample ({}, {}) off the curve",
                x,
                y
            );
        }
        // Both branches present
        assert!(samples.iter().any(|&(_, y)| y > 0.5));
        assert!(samples.iter().any(|&(_, y)| y < -0.5));
    }
}
