//! Headless battle runner for balance testing and CI verification.
//!
//! This crate drives [`astro_core`] battles without a UI. A scripted
//! [`PlayerPolicy`] stands in for the human, so the same encounter can be
//! replayed across thousands of seeds. This enables:
//!
//! - **Balance sweeps**: Win rates and damage totals per encounter and policy
//! - **CI verification**: Same seed, same narration, same final hash
//! - **Content validation**: Catch bad monster and encounter files early
//!
//! Logs go to stderr; narration and JSON results go to stdout.
//!
//! # Example
//!
//! ```bash
//! # Watch one battle
//! cargo run -p astro_headless -- run --encounter row_house --seed 7
//!
//! # Sweep 1000 seeds
//! cargo run -p astro_headless -- batch --encounter gnasher_den --count 1000
//!
//! # Verify determinism
//! cargo run -p astro_headless -- verify --encounter row_house --seed 12345
//! ```

pub mod batch;
pub mod encounter;
pub mod metrics;
pub mod policy;
pub mod runner;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, DeterminismCheck};
pub use encounter::{Encounter, EncounterError, PlayerSetup};
pub use metrics::{BatchSummary, BattleMetrics, RunResult};
pub use policy::PlayerPolicy;
pub use runner::{run_encounter, run_encounter_with, RunError, RunOptions};
