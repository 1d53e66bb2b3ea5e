//! Astroborn headless battle runner.
//!
//! Usage:
//!   astro_headless run --encounter row_house --seed 7
//!   astro_headless batch --encounter gnasher_den --count 1000 --output results
//!   astro_headless verify --encounter row_house --seed 12345 --runs 5
//!   astro_headless validate crates/astro_headless/content/encounters/*.ron

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use astro_core::data::parse_roster;
use astro_headless::{
    run_batch, run_encounter_with, verify_determinism, BatchConfig, Encounter, PlayerPolicy,
    RunOptions, RunResult,
};

#[derive(Parser)]
#[command(name = "astro_headless")]
#[command(about = "Headless Astroborn battle runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one battle and print its narration
    Run {
        /// Built-in encounter name or path to an encounter file
        #[arg(short, long, default_value = "row_house")]
        encounter: String,

        /// Random seed
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Player policy
        #[arg(short, long, value_enum, default_value = "steady")]
        policy: PlayerPolicy,

        /// Append damage breakdowns to attack narration
        #[arg(long)]
        debug_narration: bool,

        /// Print metrics as JSON instead of narration
        #[arg(long)]
        json: bool,
    },

    /// Run many seeds in parallel and save aggregate metrics
    Batch {
        /// Built-in encounter name or path to an encounter file
        #[arg(short, long, default_value = "row_house")]
        encounter: String,

        /// Number of battles
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Parallel battles (0 = all cores)
        #[arg(short = 'j', long, default_value = "0")]
        parallel: u32,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Player policy
        #[arg(short, long, value_enum, default_value = "steady")]
        policy: PlayerPolicy,

        /// Override the encounter's tick limit
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Output directory
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    /// Run one seed repeatedly and check every run matches
    Verify {
        /// Built-in encounter name or path to an encounter file
        #[arg(short, long, default_value = "row_house")]
        encounter: String,

        /// Random seed
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Player policy
        #[arg(short, long, value_enum, default_value = "steady")]
        policy: PlayerPolicy,
    },

    /// Check encounter files or monster roster files for mistakes
    Validate {
        /// Files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Treat files as monster rosters instead of encounters
        #[arg(long)]
        roster: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs to stderr; stdout carries narration and JSON
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let code = match cli.command {
        Commands::Run {
            encounter,
            seed,
            policy,
            debug_narration,
            json,
        } => cmd_run(&encounter, seed, policy, debug_narration, json),
        Commands::Batch {
            encounter,
            count,
            parallel,
            seed,
            policy,
            max_ticks,
            output,
        } => cmd_batch(BatchConfig {
            encounter,
            count,
            parallel,
            seed_start: seed,
            policy,
            max_ticks,
            output_dir: output,
        }),
        Commands::Verify {
            encounter,
            seed,
            runs,
            policy,
        } => cmd_verify(&encounter, seed, runs, policy),
        Commands::Validate { files, roster } => cmd_validate(&files, roster),
    };

    std::process::exit(code);
}

fn load_encounter(name_or_path: &str) -> Option<Encounter> {
    match Encounter::resolve(name_or_path).and_then(|e| e.ensure_valid().map(|()| e)) {
        Ok(encounter) => Some(encounter),
        Err(e) => {
            tracing::error!(encounter = %name_or_path, error = %e, "Failed to load encounter");
            eprintln!("FATAL: {e}");
            None
        }
    }
}

/// Run a single battle
fn cmd_run(name: &str, seed: u64, policy: PlayerPolicy, debug_narration: bool, json: bool) -> i32 {
    let Some(mut encounter) = load_encounter(name) else {
        return 1;
    };
    encounter.config.debug_narration |= debug_narration;

    let options = RunOptions {
        record_narration: true,
        max_ticks: None,
    };
    let metrics = match run_encounter_with(&encounter, seed, policy, options) {
        Ok(metrics) => metrics,
        Err(e) => {
            tracing::error!(error = %e, "Battle failed");
            eprintln!("FATAL: {e}");
            return 1;
        }
    };

    if json {
        match serde_json::to_string_pretty(&metrics) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("FATAL: {e}");
                return 1;
            }
        }
    } else {
        for line in &metrics.narration {
            println!("{line}");
        }
        eprintln!(
            "\n{:?} after {} ticks: {} experience, {} HP left",
            metrics.result, metrics.ticks, metrics.experience, metrics.hp_end
        );
    }

    if metrics.result == RunResult::Timeout {
        tracing::warn!(ticks = metrics.ticks, "Battle hit the tick limit");
    }
    0
}

/// Run a batch and save results
fn cmd_batch(config: BatchConfig) -> i32 {
    let output = config.output_dir.clone();
    if let Err(e) = std::fs::create_dir_all(&output) {
        tracing::error!(error = %e, path = %output.display(), "Failed to create output directory");
        eprintln!("FATAL: Cannot create output directory '{}': {}", output.display(), e);
        return 1;
    }

    let results = match run_batch(config) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("FATAL: {e}");
            return 1;
        }
    };

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        tracing::error!(error = %e, path = %results_path.display(), "Failed to save results");
        eprintln!("FATAL: Failed to save results: {e}");
        return 1;
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Battles: {}", summary.total_runs);
    if !results.errors.is_empty() {
        eprintln!("Battles FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.2}s", results.duration_seconds);
    eprintln!(
        "Wins/Losses/Timeouts: {}/{}/{} ({:.1}% win rate)",
        summary.wins,
        summary.losses,
        summary.timeouts,
        summary.win_rate * 100.0
    );
    eprintln!(
        "Ticks: avg {:.1}, min {}, max {}",
        summary.avg_ticks, summary.min_ticks, summary.max_ticks
    );
    eprintln!("Average HP left: {:.1}", summary.avg_hp_remaining);
    eprintln!(
        "Damage dealt/taken: {}/{}",
        summary.total_damage_dealt, summary.total_damage_taken
    );
    eprintln!("Misses: {}, could not act: {}", summary.misses, summary.noacts);

    for error in results.errors.iter().take(10) {
        eprintln!("  Battle {} (seed {}): {}", error.index, error.seed, error.message);
    }
    if results.errors.len() > 10 {
        eprintln!("  ... and {} more failures", results.errors.len() - 10);
    }

    eprintln!("\nResults saved to: {}", results_path.display());
    i32::from(!results.errors.is_empty())
}

/// Verify determinism
fn cmd_verify(name: &str, seed: u64, runs: u32, policy: PlayerPolicy) -> i32 {
    let Some(encounter) = load_encounter(name) else {
        return 1;
    };
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        encounter.name,
        seed,
        runs
    );

    match verify_determinism(&encounter, seed, runs.max(1), policy) {
        Ok(check) if check.passed() => {
            eprintln!(
                "PASS: All {} runs produced identical results (hash {:016x})",
                check.runs, check.expected_hash
            );
            0
        }
        Ok(check) => {
            eprintln!(
                "FAIL: Non-determinism detected at run {}",
                check.first_mismatch.unwrap_or_default()
            );
            1
        }
        Err(e) => {
            eprintln!("FATAL: {e}");
            1
        }
    }
}

/// Validate content files
fn cmd_validate(files: &[PathBuf], roster: bool) -> i32 {
    let mut failures = 0;
    for path in files {
        let errors = if roster {
            validate_roster(path)
        } else {
            match Encounter::load(path) {
                Ok(encounter) => encounter.validate(),
                Err(e) => vec![e.to_string()],
            }
        };

        if errors.is_empty() {
            eprintln!("OK   {}", path.display());
        } else {
            failures += 1;
            eprintln!("FAIL {}", path.display());
            for error in &errors {
                eprintln!("     {error}");
            }
        }
    }
    i32::from(failures > 0)
}

fn validate_roster(path: &Path) -> Vec<String> {
    let label = path.display().to_string();
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => return vec![format!("{label}: {e}")],
    };
    match parse_roster(&label, &text) {
        Ok(monsters) => monsters.iter().flat_map(|m| m.validate()).collect(),
        Err(e) => vec![e.to_string()],
    }
}
