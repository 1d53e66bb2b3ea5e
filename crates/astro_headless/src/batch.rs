//! Batch battle runner for balance testing.
//!
//! Runs many seeds of one encounter in parallel using rayon and collects
//! their metrics into a single results file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::encounter::Encounter;
use crate::metrics::{BatchSummary, BattleMetrics};
use crate::policy::PlayerPolicy;
use crate::runner::{run_encounter_with, RunError, RunOptions};

/// Which encounter to sweep, over which seeds, under which policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Built-in encounter name or path to an encounter file
    pub encounter: String,
    /// Number of battles to run
    pub count: u32,
    /// Maximum parallel battles (0 = use rayon default)
    pub parallel: u32,
    /// Starting seed; battle `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Player policy
    pub policy: PlayerPolicy,
    /// Override for the encounter's tick limit
    pub max_ticks: Option<u64>,
    /// Where `batch_results.json` is written
    pub output_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            encounter: "row_house".to_string(),
            count: 100,
            parallel: 0,
            seed_start: 0,
            policy: PlayerPolicy::Steady,
            max_ticks: None,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl BatchConfig {
    /// Create config for a specific encounter
    pub fn new(encounter: &str, count: u32) -> Self {
        Self {
            encounter: encounter.to_string(),
            count,
            ..Default::default()
        }
    }

    /// Write results under `dir`
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// First seed of the sweep
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set player policy
    pub fn with_policy(mut self, policy: PlayerPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Everything a sweep produced, as saved to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// The sweep that produced these runs
    pub config: BatchConfig,
    /// Individual battle metrics, ordered by seed
    pub runs: Vec<BattleMetrics>,
    /// Totals across `runs`
    pub summary: BatchSummary,
    /// Wall-clock time for the sweep
    pub duration_seconds: f64,
    /// Seeds that failed to run
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Write as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Read a file written by [`BatchResults::save`].
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// A seed that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Battle index
    pub index: u32,
    /// Its seed
    pub seed: u64,
    /// What went wrong
    pub message: String,
}

/// Run a batch of battles.
///
/// Fails only if the encounter cannot be resolved or is invalid; per-seed
/// failures are collected into [`BatchResults::errors`].
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, RunError> {
    let start = Instant::now();
    let encounter = Encounter::resolve(&config.encounter)?;
    encounter.ensure_valid()?;

    info!(
        encounter = %encounter.name,
        count = config.count,
        policy = %config.policy,
        "Starting batch run"
    );

    // The global pool can only be built once per process
    if config.parallel > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel as usize)
            .build_global()
            .ok();
    }

    let options = RunOptions {
        record_narration: false,
        max_ticks: config.max_ticks,
    };
    let completed = AtomicU32::new(0);

    let results: Vec<Result<BattleMetrics, BatchError>> = (0..config.count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            let result = run_encounter_with(&encounter, seed, config.policy, options);

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 100 == 0 {
                debug!("Progress: {}/{}", done, config.count);
            }

            result.map_err(|e| {
                warn!("Battle {} failed: {}", i, e);
                BatchError {
                    index: i,
                    seed,
                    message: e.to_string(),
                }
            })
        })
        .collect();

    let (runs, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let runs: Vec<BattleMetrics> = runs.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_runs(&runs);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} battles in {:.2}s ({:.0} battles/sec)",
        runs.len(),
        duration_seconds,
        runs.len() as f64 / duration_seconds.max(0.001)
    );

    Ok(BatchResults {
        config,
        runs,
        summary,
        duration_seconds,
        errors,
    })
}

/// Outcome of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismCheck {
    /// Runs performed.
    pub runs: u32,
    /// Final state hash of the first run.
    pub expected_hash: u64,
    /// Index of the first run that differed, if any.
    pub first_mismatch: Option<u32>,
}

impl DeterminismCheck {
    /// Whether every run matched the first.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.first_mismatch.is_none()
    }
}

/// Run the same seed repeatedly and compare final hashes and narration.
pub fn verify_determinism(
    encounter: &Encounter,
    seed: u64,
    runs: u32,
    policy: PlayerPolicy,
) -> Result<DeterminismCheck, RunError> {
    let options = RunOptions {
        record_narration: true,
        max_ticks: None,
    };
    let first = run_encounter_with(encounter, seed, policy, options)?;

    let mut first_mismatch = None;
    for i in 1..runs {
        let run = run_encounter_with(encounter, seed, policy, options)?;
        if run.final_state_hash != first.final_state_hash || run.narration != first.narration {
            warn!(run = i, seed, "Determinism mismatch");
            first_mismatch = Some(i);
            break;
        }
    }

    Ok(DeterminismCheck {
        runs,
        expected_hash: first.final_state_hash,
        first_mismatch,
    })
}
