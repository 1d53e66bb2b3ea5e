//! Runs a single encounter to completion under a player policy.

use astro_core::battle::Battle;
use astro_core::error::BattleError;
use astro_core::rng::GameRng;
use thiserror::Error;
use tracing::{debug, info};

use crate::encounter::{Encounter, EncounterError};
use crate::metrics::{BattleMetrics, RunResult};
use crate::policy::PlayerPolicy;

/// Error type for headless runs.
#[derive(Error, Debug)]
pub enum RunError {
    /// The encounter could not be loaded or is invalid.
    #[error(transparent)]
    Encounter(#[from] EncounterError),
    /// The engine rejected a call.
    #[error("Battle error: {0}")]
    Battle(#[from] BattleError),
    /// Writing output failed.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
    /// Serializing output failed.
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Options for a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Keep the full narration log in the metrics.
    pub record_narration: bool,
    /// Override the encounter's tick limit.
    pub max_ticks: Option<u64>,
}

/// Run an encounter with default options.
pub fn run_encounter(encounter: &Encounter, seed: u64, policy: PlayerPolicy) -> Result<BattleMetrics, RunError> {
    run_encounter_with(encounter, seed, policy, RunOptions::default())
}

/// Run an encounter until it ends or hits its tick limit.
pub fn run_encounter_with(
    encounter: &Encounter,
    seed: u64,
    policy: PlayerPolicy,
    options: RunOptions,
) -> Result<BattleMetrics, RunError> {
    let mut record = encounter.player.record()?;
    let max_ticks = options.max_ticks.unwrap_or(encounter.max_ticks);
    let mut rng = GameRng::new(seed);
    let mut battle = Battle::new(record.combatant(), encounter.template(), encounter.config, &mut rng)?;

    let mut metrics = BattleMetrics::new(encounter.name.clone(), seed, policy);
    metrics.hp_start = battle.player().resources().hp;
    metrics.hp_end = metrics.hp_start;
    if options.record_narration {
        metrics.narration = battle.take_signals().narration;
    }

    while battle.is_active() && battle.tick_count() < max_ticks {
        policy.act(&mut battle)?;
        let report = battle.tick(&mut rng)?;
        metrics.record_report(&report, options.record_narration);
    }

    metrics.final_state_hash = battle.state_hash();
    metrics.result = RunResult::from(battle.state().result());
    if battle.is_active() {
        metrics.experience = battle.experience();
        debug!(encounter = %encounter.name, seed, max_ticks, "Run timed out");
    } else {
        let conclusion = battle.finish()?;
        metrics.experience = conclusion.outcome.experience;
        metrics.levels_gained = record.apply_outcome(&conclusion.outcome);
    }

    info!(
        encounter = %metrics.encounter,
        seed,
        policy = %policy,
        result = ?metrics.result,
        ticks = metrics.ticks,
        "Run complete"
    );
    Ok(metrics)
}
