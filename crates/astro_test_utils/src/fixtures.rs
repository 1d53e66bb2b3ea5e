//! Test fixtures and helpers.
//!
//! Pre-built stat blocks, monsters and battles for consistent testing.

use std::sync::Arc;

use astro_core::attack::{Attack, PowerAgainst, PowerIn, StanceTable};
use astro_core::battle::{Battle, BattleConfig, BattleTemplate, MonsterSpec};
use astro_core::bestiary::Behavior;
use astro_core::combatant::{Combatant, Stance};
use astro_core::error::Result;
use astro_core::rng::RandomSource;
use astro_core::stats::StatBlock;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Stats of a fresh level 1 player.
#[must_use]
pub fn level_one_stats() -> StatBlock {
    StatBlock {
        hp: 100,
        mp: 45,
        pp: 30,
        off: 15,
        def: 17,
        psy: 12,
        ..StatBlock::ZERO
    }
}

/// A fresh level 1 player at full resources.
#[must_use]
pub fn level_one_player() -> Combatant {
    let base = level_one_stats();
    Combatant::player("You", base, Vec::new(), Vec::new(), base.capacity())
}

/// A player with custom stats at full resources.
#[must_use]
pub fn player_with(base: StatBlock) -> Combatant {
    Combatant::player("You", base, Vec::new(), Vec::new(), base.capacity())
}

/// A monster stat block with the given hit points and middling attributes.
#[must_use]
pub fn monster_stats(hp: i32) -> StatBlock {
    StatBlock {
        hp,
        off: 10,
        def: 6,
        psy: 6,
        dmg_phy: 2,
        ..StatBlock::ZERO
    }
}

/// An attack that cannot be executed from any stance.
#[must_use]
pub fn inert_attack() -> Attack {
    Attack {
        name: "Inert".to_string(),
        power_in: StanceTable::uniform(PowerIn::CannotAct),
        power_against: StanceTable::uniform(PowerAgainst::Miss),
        narration: None,
    }
}

/// A monster that never manages to act: every action is an inert attack
/// on the given countdown.
#[must_use]
pub fn harmless_monster(name: &str, hp: i32, countdown: i32) -> MonsterSpec {
    let behavior = Behavior::Scripted {
        stance: Some(Stance::Fight),
        countdown: Some(countdown),
        attack: Some(inert_attack()),
    };
    let spec = MonsterSpec::new(name, monster_stats(hp), 10);
    match behavior.into_decision() {
        Some(decision) => spec.with_decision(decision),
        None => spec,
    }
}

/// A monster with default behaviour.
#[must_use]
pub fn plain_monster(name: &str, hp: i32) -> MonsterSpec {
    MonsterSpec::new(name, monster_stats(hp), 10)
}

/// Wrap a closure as a monster decision.
pub fn decision<F>(f: F) -> Arc<dyn astro_core::decision::Decision>
where
    F: astro_core::decision::Decision + 'static,
{
    Arc::new(f)
}

/// Start a battle against the given monsters with the default config.
pub fn start_battle(
    player: Combatant,
    monsters: Vec<MonsterSpec>,
    rng: &mut dyn RandomSource,
) -> Result<Battle> {
    Battle::new(player, BattleTemplate::new(monsters), BattleConfig::default(), rng)
}

/// Tick a battle until it ends or `max_ticks` pass. Returns every narration
/// line in order.
///
/// # Panics
///
/// Panics if a tick fails, which only happens when driving a finished
/// battle.
pub fn run_to_end(battle: &mut Battle, rng: &mut dyn RandomSource, max_ticks: u64) -> Vec<String> {
    let mut narration = battle.take_signals().narration;
    while battle.is_active() && battle.tick_count() < max_ticks {
        let report = battle.tick(rng).expect("active battle ticks");
        narration.extend(report.narration);
    }
    narration
}

/// Write a value as RON and read it back, the way content files are
/// authored and loaded.
///
/// # Panics
///
/// Panics if the value does not survive serialization.
pub fn ron_round_trip<T: Serialize + DeserializeOwned>(value: &T) -> T {
    let text = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
        .expect("value serializes to RON");
    ron::from_str(&text).unwrap_or_else(|e| panic!("RON did not parse back: {e}\n{text}"))
}
