//! # BSD Explorer
//!
//! Numerical evidence for the Birch–Swinnerton-Dyer conjecture on
//! short-Weierstrass curves y² = x³ + ax + b.
//!
//! For one curve the engine searches integer rational points by bounded
//! brute force, approximates L(E, 1) by a truncated Euler product
//! Π_p (1 − a_p p^{−s} + p^{1−2s})^{−1} built from per-prime point counts,
//! estimates rank from the distinct x-coordinates of the points found, and
//! checks whether the L-value and the rank are mutually consistent with the
//! conjecture's prediction. A sweep driver applies the same pipeline across
//! an (a, b) grid with remaining-time projection and periodic checkpointing.
//!
//! The L-value uses only primes up to a configurable bound and the rank
//! estimate is a deliberate heuristic, so verdicts are numerical evidence,
//! never proofs. Plotting, tabular export, and console reporting are left to
//! callers; the engine exposes result collections and injection points
//! (`sweep::ProgressSink`, `checkpoint::CheckpointStore`) for them.

pub mod analysis;
pub mod arith;
pub mod checkpoint;
pub mod curve;
pub mod error;
pub mod l_function;
pub mod local;
pub mod sweep;

pub use error::ExplorerError;
