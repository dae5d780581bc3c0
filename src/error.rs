//! Error types for the explorer engine.

/// Errors surfaced by configuration validation and per-curve analysis.
///
/// Configuration problems are rejected before any loop executes; the
/// per-curve variants (`Overflow`, `TimeBudgetExceeded`) are absorbed at the
/// sweep boundary, where the failing cell is recorded and the sweep
/// continues.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("arithmetic overflow while evaluating y² = x³ + {a}x + {b}")]
    Overflow { a: i64, b: i64 },

    #[error("per-curve time budget exceeded")]
    TimeBudgetExceeded,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
