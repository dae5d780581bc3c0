//! Durable sweep checkpoints.
//!
//! A checkpoint snapshots every result accumulated so far, keyed by a run
//! identifier, so an interrupted sweep can be resumed deterministically.
//! The persistence target is an injected capability rather than embedded
//! global state; the JSON store writes one pretty-printed file per snapshot.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::sweep::CellOutcome;

/// Snapshot of a sweep in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepCheckpoint {
    pub run_id: String,
    /// Number of grid cells processed so far, in the fixed sweep order.
    pub processed_count: usize,
    /// Every outcome accumulated so far.
    pub results: Vec<CellOutcome>,
    pub timestamp_secs: u64,
}

impl SweepCheckpoint {
    pub fn new(run_id: &str, results: &[CellOutcome]) -> Self {
        SweepCheckpoint {
            run_id: run_id.to_string(),
            processed_count: results.len(),
            results: results.to_vec(),
            timestamp_secs: unix_timestamp_secs(),
        }
    }
}

pub(crate) fn unix_timestamp_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Destination for checkpoint snapshots.
///
/// Implementations decide layout and format; the sweep driver only sees
/// success or an IO error it can classify.
pub trait CheckpointStore {
    fn persist(&mut self, checkpoint: &SweepCheckpoint) -> io::Result<()>;
}

/// Store that drops every snapshot, for sweeps without durability needs.
#[derive(Debug, Default)]
pub struct NullCheckpointStore;

impl CheckpointStore for NullCheckpointStore {
    fn persist(&mut self, _checkpoint: &SweepCheckpoint) -> io::Result<()> {
        Ok(())
    }
}

/// JSON-file store: `<dir>/checkpoint_<run_id>_<processed>.json` per
/// snapshot, pretty-printed.
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    dir: PathBuf,
}

impl JsonCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonCheckpointStore { dir: dir.into() }
    }

    /// Path the next snapshot with this many processed cells would land at.
    pub fn snapshot_path(&self, run_id: &str, processed_count: usize) -> PathBuf {
        self.dir
            .join(format!("checkpoint_{}_{:06}.json", run_id, processed_count))
    }

    /// Load a previously written snapshot for resuming.
    pub fn load(path: &Path) -> io::Result<SweepCheckpoint> {
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn persist(&mut self, checkpoint: &SweepCheckpoint) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(checkpoint)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(
            self.snapshot_path(&checkpoint.run_id, checkpoint.processed_count),
            json,
        )
    }
}

/// Whether a persistence failure is structural (unusable destination) as
/// opposed to transient. Structural failures disable further checkpoint
/// attempts for the rest of the sweep; transient ones do not.
pub fn is_structural_failure(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::ReadOnlyFilesystem
            | io::ErrorKind::StorageFull
    )
}
