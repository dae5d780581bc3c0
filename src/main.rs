//! bsd-explorer CLI: numerical BSD-consistency exploration.
//!
//! Modes:
//!   --mode=single --a=-5 --b=5                Analyze one curve
//!   --mode=sweep --a-range=-3:3:1 --b-range=-3:3:1   Sweep an (a,b) grid
//!
//! Options:
//!   --bound=<X>               Point search bound (default: 25)
//!   --step=<X>                Point search step (default: 1)
//!   --max-prime=<P>           Euler product truncation (default: 100)
//!   --tolerance=<T>           Square / consistency tolerance (default: 1e-6)
//!   --exact                   Exact integer square testing in the search
//!   --time-budget-ms=<N>      Per-curve wall-clock budget
//!   --checkpoint-every=<K>    Persist a checkpoint every K curves (default: 100)
//!   --checkpoint-dir=<path>   Checkpoint directory (default: checkpoints)
//!   --resume=<file>           Resume a sweep from a checkpoint file
//!   --report=<file>           Write the sweep results as JSON (default: bsd_sweep_results.json)
//!   --quick                   Small demo preset (5x5 grid, max-prime 50)

use std::path::Path;
use std::time::Duration;

use bsd_explorer::analysis::{self, EngineConfig};
use bsd_explorer::checkpoint::{JsonCheckpointStore, SweepCheckpoint};
use bsd_explorer::curve::{self, CurveParams, SearchConfig};
use bsd_explorer::sweep::{CellOutcome, GridRange, ProgressSink, SweepConfig, SweepDriver};

/// CLI configuration parsed from command-line arguments.
struct CliConfig {
    mode: Mode,
    a: i64,
    b: i64,
    a_range: GridRange,
    b_range: GridRange,
    bound: f64,
    step: f64,
    max_prime: u64,
    tolerance: f64,
    exact: bool,
    time_budget_ms: Option<u64>,
    checkpoint_every: usize,
    checkpoint_dir: String,
    resume: Option<String>,
    report: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Single,
    Sweep,
}

fn parse_range(raw: &str) -> Option<GridRange> {
    let parts: Vec<i64> = raw.split(':').filter_map(|s| s.trim().parse().ok()).collect();
    match parts[..] {
        [start, end] => Some(GridRange::new(start, end, 1)),
        [start, end, step] => Some(GridRange::new(start, end, step)),
        _ => None,
    }
}

fn parse_args() -> CliConfig {
    let args: Vec<String> = std::env::args().collect();
    let quick = args.iter().any(|a| a == "--quick" || a == "-q");

    let mode = if args.iter().any(|a| a == "--mode=sweep") {
        Mode::Sweep
    } else {
        Mode::Single
    };

    let flag_i64 = |name: &str, default: i64| -> i64 {
        args.iter()
            .find(|a| a.starts_with(name))
            .and_then(|a| a.strip_prefix(name)?.parse().ok())
            .unwrap_or(default)
    };
    let flag_f64 = |name: &str, default: f64| -> f64 {
        args.iter()
            .find(|a| a.starts_with(name))
            .and_then(|a| a.strip_prefix(name)?.parse().ok())
            .unwrap_or(default)
    };
    let flag_str = |name: &str| -> Option<String> {
        args.iter()
            .find(|a| a.starts_with(name))
            .map(|a| a.strip_prefix(name).unwrap_or_default().to_string())
    };

    let default_range = if quick {
        GridRange::new(-2, 2, 1)
    } else {
        GridRange::new(-5, 5, 1)
    };
    let a_range = flag_str("--a-range=")
        .and_then(|s| parse_range(&s))
        .unwrap_or(default_range);
    let b_range = flag_str("--b-range=")
        .and_then(|s| parse_range(&s))
        .unwrap_or(default_range);

    CliConfig {
        mode,
        a: flag_i64("--a=", -5),
        b: flag_i64("--b=", 5),
        a_range,
        b_range,
        bound: flag_f64("--bound=", 25.0),
        step: flag_f64("--step=", 1.0),
        max_prime: flag_str("--max-prime=")
            .and_then(|s| s.parse().ok())
            .unwrap_or(if quick { 50 } else { 100 }),
        tolerance: flag_f64("--tolerance=", 1e-6),
        exact: args.iter().any(|a| a == "--exact"),
        time_budget_ms: flag_str("--time-budget-ms=").and_then(|s| s.parse().ok()),
        checkpoint_every: flag_str("--checkpoint-every=")
            .and_then(|s| s.parse().ok())
            .unwrap_or(100),
        checkpoint_dir: flag_str("--checkpoint-dir=").unwrap_or_else(|| "checkpoints".to_string()),
        resume: flag_str("--resume="),
        report: flag_str("--report=").unwrap_or_else(|| "bsd_sweep_results.json".to_string()),
    }
}

fn engine_config(cli: &CliConfig) -> EngineConfig {
    EngineConfig {
        search: SearchConfig {
            bound: cli.bound,
            step: cli.step,
            tolerance: cli.tolerance,
            exact: cli.exact,
        },
        max_prime: cli.max_prime,
        consistency_tolerance: cli.tolerance,
        time_budget: cli.time_budget_ms.map(Duration::from_millis),
    }
}

fn main() {
    env_logger::init();

    let cli = parse_args();

    println!("========================================");
    println!("  bsd-explorer: BSD Consistency Search");
    println!("========================================");
    println!();

    match cli.mode {
        Mode::Single => run_single_mode(&cli),
        Mode::Sweep => run_sweep_mode(&cli),
    }

    println!();
    println!("========================================");
    println!("  Done.");
    println!("========================================");
}

// -------------------------------------------------------------------------
// Single-curve mode
// -------------------------------------------------------------------------

fn run_single_mode(cli: &CliConfig) {
    let params = CurveParams::new(cli.a, cli.b);
    let config = engine_config(cli);

    println!("--- Single Curve Analysis ---");
    println!();
    println!("  Curve: {}", params);
    println!(
        "  Search: |x| <= {}, step {}, {} squares",
        cli.bound,
        cli.step,
        if cli.exact { "exact" } else { "tolerance" }
    );
    println!("  Euler product over primes <= {}", cli.max_prime);
    println!();

    let result = match analysis::analyze(&params, &config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if result.points.is_empty() {
        println!("  No integer points found in range.");
    } else {
        println!("  Integer points found:");
        for p in &result.points {
            println!("    ({}, {})", p.x, p.y);
        }
    }
    println!();

    println!("  Local factors (first 8):");
    for factor in result.l_function.local_factors.iter().take(8) {
        println!(
            "    p={:<4} N_p={:<5} a_p={:>3}",
            factor.p, factor.n_p, factor.a_p
        );
    }
    println!();

    println!(
        "  L(E, 1) ~ {:.6} over {} primes{}",
        result.l_function.value_at_1,
        result.l_function.primes_used.len(),
        if result.l_function.limit_resolved {
            " (limit-resolved)"
        } else {
            ""
        }
    );
    println!("  Rank estimate: {}", result.rank_estimate);
    println!("  Verdict: {}", result.verdict);
}

// -------------------------------------------------------------------------
// Sweep mode
// -------------------------------------------------------------------------

/// Console progress: one line every `report_interval` curves, plus
/// checkpoint notices.
struct ConsoleProgress {
    report_interval: usize,
}

impl ProgressSink for ConsoleProgress {
    fn on_cell(
        &mut self,
        processed: usize,
        total: usize,
        outcome: &CellOutcome,
        projected_remaining: Duration,
    ) {
        if processed % self.report_interval != 0 && processed != total {
            return;
        }
        let params = outcome.params();
        let status = match outcome {
            CellOutcome::Completed(result) => {
                format!("rank={} {}", result.rank_estimate, result.verdict)
            }
            CellOutcome::Errored { reason, .. } => format!("ERROR: {}", reason),
        };
        println!(
            "  [{:>6}/{}] a={:<4} b={:<4} | {} | ~{:.1}s remaining",
            processed,
            total,
            params.a,
            params.b,
            status,
            projected_remaining.as_secs_f64()
        );
    }

    fn on_checkpoint(&mut self, processed: usize, persisted: bool) {
        if persisted {
            println!("  [Checkpoint saved at {} curves]", processed);
        }
    }
}

fn run_sweep_mode(cli: &CliConfig) {
    let mut config = SweepConfig::new(cli.a_range, cli.b_range, engine_config(cli));
    config.checkpoint_interval = cli.checkpoint_every;

    let driver = if let Some(resume_path) = &cli.resume {
        println!("Resuming from checkpoint: {}", resume_path);
        let snapshot = match JsonCheckpointStore::load(Path::new(resume_path)) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                eprintln!("Error: failed to load checkpoint {}: {}", resume_path, e);
                std::process::exit(1);
            }
        };
        println!(
            "  Run {} with {} cells already processed",
            snapshot.run_id, snapshot.processed_count
        );
        SweepDriver::resume(snapshot, config.clone())
    } else {
        SweepDriver::new(config.clone())
    };

    let driver = match driver {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let total = config.total_cells();
    println!("--- Sweep Mode ---");
    println!();
    println!(
        "  a in {}..={} step {}, b in {}..={} step {}: {} curves",
        config.a_range.start,
        config.a_range.end,
        config.a_range.step,
        config.b_range.start,
        config.b_range.end,
        config.b_range.step,
        total
    );
    println!("  Run id: {}", driver.run_id());
    println!(
        "  Checkpoints: every {} curves into {}/",
        config.checkpoint_interval, cli.checkpoint_dir
    );
    println!();

    let mut store = JsonCheckpointStore::new(&cli.checkpoint_dir);
    let mut progress = ConsoleProgress {
        report_interval: (total / 20).max(1),
    };
    let report = driver.run(&mut store, &mut progress);

    println!();
    println!("--- Sweep Results ---");
    println!();
    let summary = report.summary();
    println!(
        "  {} curves in {:.1}s ({} checkpoints written)",
        summary.total_cells,
        report.elapsed.as_secs_f64(),
        report.checkpoints_written
    );
    println!(
        "  Consistent: {}  Inconsistent: {}  Errored: {}",
        summary.consistent, summary.inconsistent, summary.errored
    );
    println!("  Rank distribution:");
    for (rank, count) in &summary.rank_distribution {
        println!("    rank {:>2}: {:>6} curves", rank, count);
    }

    // Persist the full result collection for downstream export/plotting.
    let final_snapshot = SweepCheckpoint::new(report.run_id.as_str(), &report.outcomes);
    match serde_json::to_string_pretty(&final_snapshot) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&cli.report, &json) {
                eprintln!("  Warning: failed to write results: {}", e);
            } else {
                println!();
                println!("  Results saved: {}", cli.report);
            }
        }
        Err(e) => eprintln!("  Warning: failed to serialize results: {}", e),
    }

    // Example plotting hand-off: a dense sampling of the first curve.
    if let Some(CellOutcome::Completed(first)) = report.outcomes.first() {
        let samples = curve::sample_curve(&first.params, -cli.bound, cli.bound, 200);
        println!(
            "  ({} plot samples available for {} via sample_curve)",
            samples.len(),
            first.params
        );
    }
}
