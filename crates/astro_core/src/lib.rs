//! # Astro Core
//!
//! Combat resolution engine for Astroborn.
//!
//! This crate turns two combatants' stats, stances and queued attacks into
//! damage, narration and a battle result. It contains **only** engine logic:
//! - No rendering
//! - No IO
//! - No ambient randomness (every draw goes through a [`rng::RandomSource`])
//! - No floating-point formula math (uses fixed-point)
//!
//! The world layer builds a [`battle::BattleTemplate`], hands it to
//! [`battle::Battle::new`] together with the player's snapshot, and calls
//! [`battle::Battle::tick`] once per world-clock tick until the battle
//! reports a terminal state.
//!
//! ## Crate Structure
//!
//! - [`stats`] - Stat blocks, modifiers and clamping
//! - [`damage`] - The four damage channel formulas
//! - [`attack`] - Stance tables and positional resolution
//! - [`combatant`] - Battle-local combatants and stances
//! - [`decision`] - The monster AI hook
//! - [`battle`] - The tick-driven battle orchestrator
//! - [`progression`] - Persistent player record and levelling
//! - [`bestiary`] - Data-driven monster behaviours and built-in content
//! - [`math`] - Fixed-point helpers

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod attack;
pub mod battle;
pub mod bestiary;
pub mod combatant;
pub mod damage;
pub mod data;
pub mod decision;
pub mod error;
pub mod math;
pub mod progression;
pub mod rng;
pub mod stats;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::attack::{resolve_attack, Attack, AttackOutcome, PowerAgainst, PowerIn, Special};
    pub use crate::battle::{
        Battle, BattleConclusion, BattleConfig, BattleEvent, BattleOutcome, BattleResult,
        BattleState, BattleTemplate, HookAction, MonsterSpec, TickReport,
    };
    pub use crate::bestiary::Behavior;
    pub use crate::combatant::{Combatant, CombatantId, Stance};
    pub use crate::damage::{calculate_base_damage, DamageBase};
    pub use crate::decision::{Decision, DecisionContext, DecisionUpdate, Scratch};
    pub use crate::error::{BattleError, Result};
    pub use crate::math::Fixed;
    pub use crate::progression::{level_for_experience, PlayerRecord};
    pub use crate::rng::{GameRng, RandomSource, SequenceRng};
    pub use crate::stats::{Equipment, EquipmentSlot, ResourcePool, StatBlock, StatsMod, Status};
}
