//! Rank heuristic, consistency verdict, and the per-curve analyzer.
//!
//! The Birch–Swinnerton-Dyer conjecture predicts that L(E, 1) vanishes
//! exactly when the curve has positive rank. The analyzer compares a
//! truncated L(1) approximation against a heuristic rank estimate and
//! reports whether the two agree with that prediction.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::curve::{self, CurveParams, RationalPoint, SearchConfig};
use crate::error::ExplorerError;
use crate::l_function::{self, LFunctionApproximation};

/// Consistency verdict for one curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Consistent,
    Inconsistent,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Consistent => write!(f, "Consistent"),
            Verdict::Inconsistent => write!(f, "Inconsistent"),
        }
    }
}

/// Heuristic rank estimate: the number of distinct x-coordinates among the
/// found points, minus one; zero for an empty point set.
///
/// This is not the Mordell–Weil rank: torsion points and generators are not
/// distinguished. It is a known simplification and is kept exactly as
/// stated.
pub fn rank_estimate(points: &[RationalPoint]) -> u32 {
    if points.is_empty() {
        return 0;
    }
    let mut xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    xs.sort_by(f64::total_cmp);
    xs.dedup();
    (xs.len() - 1) as u32
}

/// Compare the L-value against the rank estimate.
///
/// Consistent iff a (numerically) vanishing L(1) accompanies positive rank,
/// or a non-vanishing L(1) accompanies rank zero. Both mismatched
/// combinations are classified Inconsistent without distinction.
pub fn check_consistency(l_at_1: f64, rank: u32, tolerance: f64) -> Verdict {
    let vanishes = l_at_1.abs() < tolerance;
    if (vanishes && rank > 0) || (!vanishes && rank == 0) {
        Verdict::Consistent
    } else {
        Verdict::Inconsistent
    }
}

/// Per-curve engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub search: SearchConfig,
    /// Euler factors are taken at every prime ≤ max_prime.
    pub max_prime: u64,
    /// |L(1)| below this counts as a vanishing L-value.
    pub consistency_tolerance: f64,
    /// Optional wall-clock budget for one curve; exceeding it fails the
    /// curve rather than stalling the sweep.
    pub time_budget: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            search: SearchConfig::default(),
            max_prime: 100,
            consistency_tolerance: 1e-6,
            time_budget: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ExplorerError> {
        self.search.validate()?;
        if self.max_prime < 2 {
            return Err(ExplorerError::InvalidConfig(format!(
                "max_prime must be at least 2, got {}",
                self.max_prime
            )));
        }
        if !self.consistency_tolerance.is_finite() || self.consistency_tolerance <= 0.0 {
            return Err(ExplorerError::InvalidConfig(format!(
                "consistency tolerance must be strictly positive, got {}",
                self.consistency_tolerance
            )));
        }
        if let Some(budget) = self.time_budget {
            if budget.is_zero() {
                return Err(ExplorerError::InvalidConfig(
                    "time budget must be non-zero".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Everything the engine knows about one curve after analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub params: CurveParams,
    pub points: Vec<RationalPoint>,
    pub rank_estimate: u32,
    pub l_function: LFunctionApproximation,
    pub verdict: Verdict,
}

/// Analyze one curve: point search, truncated L(1), rank heuristic, verdict.
///
/// Pure orchestration over its inputs with no shared mutable state:
/// identical inputs always produce identical results. Per-curve failures
/// (overflow, exceeded time budget) come back as `Err` for the caller to
/// record.
pub fn analyze(params: &CurveParams, config: &EngineConfig) -> Result<AnalysisResult, ExplorerError> {
    config.validate()?;
    let deadline = config.time_budget.map(|budget| Instant::now() + budget);

    let points = curve::find_points_within(params, &config.search, deadline)?;
    let l_function = l_function::approximate_within(params, config.max_prime, deadline)?;
    let rank = rank_estimate(&points);
    let verdict = check_consistency(l_function.value_at_1, rank, config.consistency_tolerance);

    Ok(AnalysisResult {
        params: *params,
        points,
        rank_estimate: rank,
        l_function,
        verdict,
    })
}
