//! Grid sweep over (a, b) with progress projection and checkpointing.
//!
//! The driver walks the Cartesian product of two integer ranges in a fixed
//! order (outer a ascending, inner b ascending), analyzes each cell, and
//! projects the remaining duration from a moving average of per-curve cost.
//! Every K processed curves a snapshot of all results so far is persisted;
//! persistence failure never aborts the sweep.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::analysis::{self, AnalysisResult, EngineConfig, Verdict};
use crate::checkpoint::{self, CheckpointStore, SweepCheckpoint};
use crate::curve::CurveParams;
use crate::error::ExplorerError;

/// Inclusive integer range with a strictly positive step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRange {
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl GridRange {
    pub fn new(start: i64, end: i64, step: i64) -> Self {
        GridRange { start, end, step }
    }

    pub fn validate(&self) -> Result<(), ExplorerError> {
        if self.step <= 0 {
            return Err(ExplorerError::InvalidConfig(format!(
                "grid step must be strictly positive, got {}",
                self.step
            )));
        }
        Ok(())
    }

    /// Number of grid values; an end before the start yields an empty range.
    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            ((self.end - self.start) / self.step + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn value(&self, index: usize) -> i64 {
        self.start + self.step * index as i64
    }
}

/// Full sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    pub a_range: GridRange,
    pub b_range: GridRange,
    pub engine: EngineConfig,
    /// Persist a checkpoint every this many processed curves.
    pub checkpoint_interval: usize,
    /// Moving-average window, in curves, for the remaining-time projection.
    pub progress_window: usize,
}

impl SweepConfig {
    pub fn new(a_range: GridRange, b_range: GridRange, engine: EngineConfig) -> Self {
        SweepConfig {
            a_range,
            b_range,
            engine,
            checkpoint_interval: 100,
            progress_window: 25,
        }
    }

    pub fn validate(&self) -> Result<(), ExplorerError> {
        self.a_range.validate()?;
        self.b_range.validate()?;
        self.engine.validate()?;
        if self.checkpoint_interval == 0 {
            return Err(ExplorerError::InvalidConfig(
                "checkpoint interval must be at least 1".to_string(),
            ));
        }
        if self.progress_window == 0 {
            return Err(ExplorerError::InvalidConfig(
                "progress window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Total number of grid cells.
    pub fn total_cells(&self) -> usize {
        self.a_range.len() * self.b_range.len()
    }
}

/// One cell of the sweep: a completed analysis, or a recorded failure that
/// did not stop the sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellOutcome {
    Completed(AnalysisResult),
    Errored { params: CurveParams, reason: String },
}

impl CellOutcome {
    pub fn params(&self) -> &CurveParams {
        match self {
            CellOutcome::Completed(result) => &result.params,
            CellOutcome::Errored { params, .. } => params,
        }
    }
}

/// Observer for sweep progress. Console reporting lives outside the engine;
/// implementations receive the projection and decide what to show.
pub trait ProgressSink {
    /// Called after every processed cell with the remaining-time projection.
    fn on_cell(
        &mut self,
        _processed: usize,
        _total: usize,
        _outcome: &CellOutcome,
        _projected_remaining: Duration,
    ) {
    }

    /// Called after each checkpoint attempt.
    fn on_checkpoint(&mut self, _processed: usize, _persisted: bool) {}
}

/// Sink that ignores all progress events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {}

/// Aggregate counts consumed by export and plotting callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub total_cells: usize,
    pub completed: usize,
    pub errored: usize,
    pub consistent: usize,
    pub inconsistent: usize,
    /// Rank estimate → number of curves with that estimate.
    pub rank_distribution: BTreeMap<u32, usize>,
}

/// Everything a finished (or cancelled) sweep produced.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub run_id: String,
    pub outcomes: Vec<CellOutcome>,
    pub cancelled: bool,
    pub checkpoints_written: usize,
    /// True when a structural persistence failure disabled checkpointing.
    pub checkpointing_disabled: bool,
    pub elapsed: Duration,
}

impl SweepReport {
    pub fn summary(&self) -> SweepSummary {
        let mut summary = SweepSummary {
            total_cells: self.outcomes.len(),
            completed: 0,
            errored: 0,
            consistent: 0,
            inconsistent: 0,
            rank_distribution: BTreeMap::new(),
        };
        for outcome in &self.outcomes {
            match outcome {
                CellOutcome::Completed(result) => {
                    summary.completed += 1;
                    match result.verdict {
                        Verdict::Consistent => summary.consistent += 1,
                        Verdict::Inconsistent => summary.inconsistent += 1,
                    }
                    *summary
                        .rank_distribution
                        .entry(result.rank_estimate)
                        .or_insert(0) += 1;
                }
                CellOutcome::Errored { .. } => summary.errored += 1,
            }
        }
        summary
    }
}

/// Drives the per-curve analyzer over the Cartesian product of the two
/// ranges in a fixed deterministic order.
pub struct SweepDriver {
    config: SweepConfig,
    run_id: String,
    cancel: Arc<AtomicBool>,
    /// Outcomes carried over from a resumed checkpoint.
    seed: Vec<CellOutcome>,
}

impl SweepDriver {
    /// Create a driver; fails fast on invalid configuration, before any
    /// cell is visited.
    pub fn new(config: SweepConfig) -> Result<Self, ExplorerError> {
        config.validate()?;
        let run_id = format!("sweep{}", checkpoint::unix_timestamp_secs());
        Ok(SweepDriver {
            config,
            run_id,
            cancel: Arc::new(AtomicBool::new(false)),
            seed: Vec::new(),
        })
    }

    /// Same as [`SweepDriver::new`] with a caller-chosen run identifier.
    pub fn with_run_id(config: SweepConfig, run_id: impl Into<String>) -> Result<Self, ExplorerError> {
        let mut driver = SweepDriver::new(config)?;
        driver.run_id = run_id.into();
        Ok(driver)
    }

    /// Resume from a persisted checkpoint: the first `processed_count` cells
    /// are taken from the snapshot and the sweep continues after them in the
    /// same fixed order, so the final collection matches an uninterrupted
    /// run.
    pub fn resume(checkpoint: SweepCheckpoint, config: SweepConfig) -> Result<Self, ExplorerError> {
        config.validate()?;
        let total = config.total_cells();
        if checkpoint.processed_count != checkpoint.results.len()
            || checkpoint.processed_count > total
        {
            return Err(ExplorerError::InvalidConfig(format!(
                "checkpoint does not match sweep dimensions: {} recorded results, {} processed, {} cells total",
                checkpoint.results.len(),
                checkpoint.processed_count,
                total
            )));
        }
        Ok(SweepDriver {
            config,
            run_id: checkpoint.run_id,
            cancel: Arc::new(AtomicBool::new(false)),
            seed: checkpoint.results,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Cooperative cancellation flag, checked between cells. Setting it
    /// stops the sweep at the next cell boundary.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Run the sweep to completion or cancellation.
    ///
    /// Per-curve failures are recorded as `Errored` cells; checkpoint
    /// persistence failures are logged and never abort the sweep, and a
    /// structural failure disables further attempts.
    pub fn run(
        &self,
        store: &mut dyn CheckpointStore,
        progress: &mut dyn ProgressSink,
    ) -> SweepReport {
        let start = Instant::now();
        let total = self.config.total_cells();
        let b_len = self.config.b_range.len();

        let mut outcomes = self.seed.clone();
        let mut durations: VecDeque<Duration> = VecDeque::new();
        let mut checkpoints_written = 0usize;
        let mut checkpointing_disabled = false;
        let mut cancelled = false;

        log::info!(
            "sweep {}: {} cells ({} x {}), starting at cell {}",
            self.run_id,
            total,
            self.config.a_range.len(),
            b_len,
            outcomes.len()
        );

        for index in outcomes.len()..total {
            if self.cancel.load(Ordering::Relaxed) {
                log::info!("sweep {} cancelled at cell {}", self.run_id, index);
                cancelled = true;
                break;
            }

            let a = self.config.a_range.value(index / b_len);
            let b = self.config.b_range.value(index % b_len);
            let params = CurveParams::new(a, b);

            let cell_start = Instant::now();
            let outcome = match analysis::analyze(&params, &self.config.engine) {
                Ok(result) => CellOutcome::Completed(result),
                Err(e) => {
                    log::warn!("curve a={}, b={} failed: {}", a, b, e);
                    CellOutcome::Errored {
                        params,
                        reason: e.to_string(),
                    }
                }
            };

            if durations.len() == self.config.progress_window {
                durations.pop_front();
            }
            durations.push_back(cell_start.elapsed());
            let avg = durations.iter().sum::<Duration>() / durations.len() as u32;

            outcomes.push(outcome);
            let processed = outcomes.len();
            let projected = avg * (total - processed) as u32;
            if let Some(last) = outcomes.last() {
                progress.on_cell(processed, total, last, projected);
            }

            if !checkpointing_disabled && processed % self.config.checkpoint_interval == 0 {
                let snapshot = SweepCheckpoint::new(&self.run_id, &outcomes);
                match store.persist(&snapshot) {
                    Ok(()) => {
                        checkpoints_written += 1;
                        progress.on_checkpoint(processed, true);
                    }
                    Err(e) => {
                        log::warn!(
                            "sweep {}: checkpoint at {} cells failed: {}",
                            self.run_id,
                            processed,
                            e
                        );
                        if checkpoint::is_structural_failure(&e) {
                            log::warn!(
                                "sweep {}: checkpoint destination unusable, disabling further checkpoints",
                                self.run_id
                            );
                            checkpointing_disabled = true;
                        }
                        progress.on_checkpoint(processed, false);
                    }
                }
            }
        }

        SweepReport {
            run_id: self.run_id.clone(),
            outcomes,
            cancelled,
            checkpoints_written,
            checkpointing_disabled,
            elapsed: start.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::NullCheckpointStore;
    use std::io;

    fn small_config() -> SweepConfig {
        let engine = EngineConfig {
            search: crate::curve::SearchConfig {
                bound: 10.0,
                step: 1.0,
                tolerance: 1e-6,
                exact: true,
            },
            max_prime: 20,
            consistency_tolerance: 1e-6,
            time_budget: None,
        };
        let mut config = SweepConfig::new(
            GridRange::new(-2, 2, 1),
            GridRange::new(-2, 2, 1),
            engine,
        );
        config.checkpoint_interval = 7;
        config
    }

    struct CountingStore {
        persisted: Vec<usize>,
        fail_with: Option<io::ErrorKind>,
    }

    impl CountingStore {
        fn new() -> Self {
            CountingStore {
                persisted: Vec::new(),
                fail_with: None,
            }
        }
    }

    impl CheckpointStore for CountingStore {
        fn persist(&mut self, checkpoint: &SweepCheckpoint) -> io::Result<()> {
            if let Some(kind) = self.fail_with {
                return Err(io::Error::new(kind, "store failure"));
            }
            self.persisted.push(checkpoint.processed_count);
            Ok(())
        }
    }

    #[test]
    fn test_grid_range_len_and_values() {
        let range = GridRange::new(-2, 2, 1);
        assert_eq!(range.len(), 5);
        assert_eq!(range.value(0), -2);
        assert_eq!(range.value(4), 2);

        let coarse = GridRange::new(0, 10, 4);
        assert_eq!(coarse.len(), 3); // 0, 4, 8
        assert_eq!(coarse.value(2), 8);

        assert!(GridRange::new(5, 0, 1).is_empty());
        assert!(GridRange::new(0, 5, 0).validate().is_err());
        assert!(GridRange::new(0, 5, -2).validate().is_err());
    }

    #[test]
    fn test_sweep_visits_cells_in_fixed_order() {
        let driver = SweepDriver::new(small_config()).unwrap();
        let report = driver.run(&mut NullCheckpointStore, &mut NullProgress);
        assert_eq!(report.outcomes.len(), 25);
        assert!(!report.cancelled);

        // Outer a ascending, inner b ascending
        let cells: Vec<(i64, i64)> = report
            .outcomes
            .iter()
            .map(|o| (o.params().a, o.params().b))
            .collect();
        let mut expected = Vec::new();
        for a in -2..=2 {
            for b in -2..=2 {
                expected.push((a, b));
            }
        }
        assert_eq!(cells, expected);
    }

    #[test]
    fn test_sweep_determinism() {
        let first = SweepDriver::new(small_config())
            .unwrap()
            .run(&mut NullCheckpointStore, &mut NullProgress);
        let second = SweepDriver::new(small_config())
            .unwrap()
            .run(&mut NullCheckpointStore, &mut NullProgress);
        assert_eq!(first.outcomes, second.outcomes);
    }

    #[test]
    fn test_checkpoints_every_interval() {
        let driver = SweepDriver::new(small_config()).unwrap();
        let mut store = CountingStore::new();
        let report = driver.run(&mut store, &mut NullProgress);
        // 25 cells, interval 7: snapshots at 7, 14, 21
        assert_eq!(store.persisted, vec![7, 14, 21]);
        assert_eq!(report.checkpoints_written, 3);
        assert!(!report.checkpointing_disabled);
    }

    #[test]
    fn test_structural_persistence_failure_disables_checkpointing() {
        let driver = SweepDriver::new(small_config()).unwrap();
        let mut store = CountingStore::new();
        store.fail_with = Some(io::ErrorKind::PermissionDenied);
        let report = driver.run(&mut store, &mut NullProgress);
        // Sweep completes anyway; one failed attempt, no retries
        assert_eq!(report.outcomes.len(), 25);
        assert_eq!(report.checkpoints_written, 0);
        assert!(report.checkpointing_disabled);
    }

    #[test]
    fn test_transient_persistence_failure_keeps_trying() {
        let driver = SweepDriver::new(small_config()).unwrap();
        let mut store = CountingStore::new();
        store.fail_with = Some(io::ErrorKind::TimedOut);
        let report = driver.run(&mut store, &mut NullProgress);
        assert_eq!(report.outcomes.len(), 25);
        assert_eq!(report.checkpoints_written, 0);
        assert!(!report.checkpointing_disabled);
    }

    #[test]
    fn test_cancellation_stops_between_cells() {
        let driver = SweepDriver::new(small_config()).unwrap();
        driver.cancel_flag().store(true, Ordering::Relaxed);
        let report = driver.run(&mut NullCheckpointStore, &mut NullProgress);
        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn test_resume_matches_uninterrupted_run() {
        let full = SweepDriver::with_run_id(small_config(), "full")
            .unwrap()
            .run(&mut NullCheckpointStore, &mut NullProgress);

        // Snapshot after 7 cells, then resume from it
        let snapshot = SweepCheckpoint::new("resumed", &full.outcomes[..7]);
        let resumed = SweepDriver::resume(snapshot, small_config())
            .unwrap()
            .run(&mut NullCheckpointStore, &mut NullProgress);

        assert_eq!(resumed.outcomes, full.outcomes);
    }

    #[test]
    fn test_resume_rejects_mismatched_checkpoint() {
        let full = SweepDriver::new(small_config())
            .unwrap()
            .run(&mut NullCheckpointStore, &mut NullProgress);

        let mut snapshot = SweepCheckpoint::new("bad", &full.outcomes);
        snapshot.processed_count = 3; // inconsistent with results
        assert!(SweepDriver::resume(snapshot, small_config()).is_err());

        let mut tiny = small_config();
        tiny.a_range = GridRange::new(0, 0, 1);
        tiny.b_range = GridRange::new(0, 0, 1);
        let oversized = SweepCheckpoint::new("bad", &full.outcomes);
        assert!(SweepDriver::resume(oversized, tiny).is_err());
    }

    #[test]
    fn test_errored_cells_do_not_abort_the_sweep() {
        // A tiny time budget fails every curve, but the sweep still visits
        // every cell and records the failures.
        let mut config = small_config();
        config.engine.time_budget = Some(Duration::from_nanos(1));
        config.engine.search.bound = 10_000.0;
        config.engine.search.step = 0.001;
        config.engine.search.exact = false;
        config.engine.max_prime = 5_000;
        let report = SweepDriver::new(config)
            .unwrap()
            .run(&mut NullCheckpointStore, &mut NullProgress);
        assert_eq!(report.outcomes.len(), 25);
        assert!(report
            .outcomes
            .iter()
            .any(|o| matches!(o, CellOutcome::Errored { .. })));
    }

    #[test]
    fn test_invalid_sweep_config_rejected() {
        let mut config = small_config();
        config.checkpoint_interval = 0;
        assert!(SweepDriver::new(config).is_err());

        let mut config = small_config();
        config.a_range.step = 0;
        assert!(SweepDriver::new(config).is_err());

        let mut config = small_config();
        config.engine.search.step = -1.0;
        assert!(SweepDriver::new(config).is_err());
    }

    #[test]
    fn test_summary_counts() {
        let report = SweepDriver::new(small_config())
            .unwrap()
            .run(&mut NullCheckpointStore, &mut NullProgress);
        let summary = report.summary();
        assert_eq!(summary.total_cells, 25);
        assert_eq!(summary.completed + summary.errored, 25);
        assert_eq!(summary.consistent + summary.inconsistent, summary.completed);
        let rank_total: usize = summary.rank_distribution.values().sum();
        assert_eq!(rank_total, summary.completed);
    }
}
