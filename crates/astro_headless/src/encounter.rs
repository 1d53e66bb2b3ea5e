//! Encounter loading and configuration.
//!
//! An encounter is everything needed to stage one battle headlessly: the
//! player's setup, the monster roster, bonus experience, engine config and
//! a tick limit.

use std::path::Path;

use astro_core::battle::{BattleConfig, BattleTemplate};
use astro_core::bestiary::{bore_mite_data, gnasher_data};
use astro_core::data::MonsterData;
use astro_core::error::BattleError;
use astro_core::progression::PlayerRecord;
use astro_core::stats::{Equipment, EquipmentSlot, StatBlock, StatsMod, Status};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default tick limit: long enough for any winnable fight.
pub const DEFAULT_MAX_TICKS: u64 = 10_000;

/// Error type for encounter operations.
#[derive(Error, Debug)]
pub enum EncounterError {
    /// File not found.
    #[error("Encounter file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read encounter file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse encounter: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Player setup rejected by the engine.
    #[error("Invalid player setup: {0}")]
    Player(#[from] BattleError),
    /// Content checks failed.
    #[error("Encounter '{name}' is invalid: {}", .errors.join("; "))]
    Invalid {
        /// Encounter name.
        name: String,
        /// Validation messages.
        errors: Vec<String>,
    },
}

/// How the player enters the encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Display name.
    #[serde(default = "default_player_name")]
    pub name: String,
    /// Starting level.
    #[serde(default = "default_level")]
    pub level: u32,
    /// Worn equipment.
    #[serde(default)]
    pub equipment: Vec<Equipment>,
    /// Active status effects.
    #[serde(default)]
    pub statuses: Vec<Status>,
}

fn default_player_name() -> String {
    "Vela".to_string()
}

/// Default starting level.
const fn default_level() -> u32 {
    1
}

const fn default_max_ticks() -> u64 {
    DEFAULT_MAX_TICKS
}

impl Default for PlayerSetup {
    fn default() -> Self {
        Self {
            name: default_player_name(),
            level: default_level(),
            equipment: Vec::new(),
            statuses: Vec::new(),
        }
    }
}

impl PlayerSetup {
    /// Build the persistent record this setup describes, at full resources.
    pub fn record(&self) -> Result<PlayerRecord, BattleError> {
        let mut record = PlayerRecord::at_level(self.name.clone(), self.level)?;
        for item in &self.equipment {
            record.equip(item.clone());
        }
        for status in &self.statuses {
            record.add_status(status.clone());
        }
        record.rest();
        Ok(record)
    }
}

/// A complete encounter.
///
/// # Example RON
///
/// ```ron
/// Encounter(
///     name: "row_house",
///     description: "Two Bore Mites in the hole under the row house.",
///     player: (level: 1),
///     monsters: [...],
///     bonus_experience: 0,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    /// Encounter name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Player setup.
    #[serde(default)]
    pub player: PlayerSetup,
    /// Monsters, in battle order.
    pub monsters: Vec<MonsterData>,
    /// Experience added on a win.
    #[serde(default)]
    pub bonus_experience: u32,
    /// Engine configuration.
    #[serde(default)]
    pub config: BattleConfig,
    /// Ticks after which the run counts as a timeout.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

impl Encounter {
    /// Load an encounter from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EncounterError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EncounterError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, EncounterError> {
        let encounter: Encounter = ron::from_str(ron)?;
        Ok(encounter)
    }

    /// Resolve a built-in encounter name or a path to a RON file.
    pub fn resolve(name_or_path: &str) -> Result<Self, EncounterError> {
        match Self::builtin(name_or_path) {
            Some(encounter) => Ok(encounter),
            None => Self::load(name_or_path),
        }
    }

    /// Built-in encounters by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "row_house" => Some(Self::row_house()),
            "gnasher_den" => Some(Self::gnasher_den()),
            _ => None,
        }
    }

    /// Names accepted by [`Encounter::builtin`].
    pub const BUILTIN: [&'static str; 2] = ["row_house", "gnasher_den"];

    /// Two Bore Mites in the hole under the row house.
    #[must_use]
    pub fn row_house() -> Self {
        Self {
            name: "row_house".to_string(),
            description: "Two Bore Mites in the hole under the row house".to_string(),
            player: PlayerSetup::default(),
            monsters: vec![bore_mite_data(), bore_mite_data()],
            bonus_experience: 0,
            config: BattleConfig::default(),
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }

    /// A Gnasher and its mite escort, for a player with a weapon.
    #[must_use]
    pub fn gnasher_den() -> Self {
        let pipe = Equipment::new(
            "Lead Pipe",
            EquipmentSlot::Weapon,
            StatsMod::flat(StatBlock {
                dmg_phy: 3,
                ..StatBlock::ZERO
            }),
        );
        Self {
            name: "gnasher_den".to_string(),
            description: "A Gnasher guarding its burrow, with a Bore Mite in tow".to_string(),
            player: PlayerSetup {
                level: 3,
                equipment: vec![pipe],
                ..PlayerSetup::default()
            },
            monsters: vec![gnasher_data(), bore_mite_data()],
            bonus_experience: 60,
            config: BattleConfig::default(),
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }

    /// Check for content mistakes.
    ///
    /// Returns a list of validation errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.monsters.is_empty() {
            errors.push(format!("Encounter '{}' has no monsters", self.name));
        }
        if self.max_ticks == 0 {
            errors.push(format!("Encounter '{}' has a zero tick limit", self.name));
        }
        if self.config.default_countdown <= 0 {
            errors.push(format!(
                "Encounter '{}' has a non-positive default countdown {}",
                self.name, self.config.default_countdown
            ));
        }
        if let Err(e) = self.player.record() {
            errors.push(format!("Encounter '{}' player: {e}", self.name));
        }
        for monster in &self.monsters {
            errors.extend(monster.validate());
        }

        errors
    }

    /// Validate, returning an error listing every problem.
    pub fn ensure_valid(&self) -> Result<(), EncounterError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(EncounterError::Invalid {
                name: self.name.clone(),
                errors,
            })
        }
    }

    /// The battle template for this encounter.
    #[must_use]
    pub fn template(&self) -> BattleTemplate {
        BattleTemplate::new(self.monsters.iter().map(MonsterData::to_spec).collect())
            .with_bonus_experience(self.bonus_experience)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_valid() {
        for name in Encounter::BUILTIN {
            let encounter = Encounter::builtin(name).unwrap();
            assert!(encounter.validate().is_empty(), "{name}: {:?}", encounter.validate());
        }
        assert!(Encounter::builtin("nowhere").is_none());
    }

    #[test]
    fn test_minimal_ron() {
        let encounter = Encounter::from_ron_str(
            r#"Encounter(
                name: "rat",
                monsters: [(name: "Rat", experience: 5, base: (hp: 5, off: 3, def: 2, psy: 1))],
            )"#,
        )
        .unwrap();
        assert_eq!(encounter.player.level, 1);
        assert_eq!(encounter.max_ticks, DEFAULT_MAX_TICKS);
        assert_eq!(encounter.config, BattleConfig::default());
        assert_eq!(encounter.template().monsters.len(), 1);
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut encounter = Encounter::row_house();
        encounter.monsters.clear();
        encounter.max_ticks = 0;
        encounter.player.level = 40;
        assert_eq!(encounter.validate().len(), 3);
        assert!(matches!(encounter.ensure_valid(), Err(EncounterError::Invalid { .. })));
    }

    #[test]
    fn test_builtins_use_bestiary_monsters() {
        assert_eq!(Encounter::row_house().monsters, vec![bore_mite_data(), bore_mite_data()]);
        assert_eq!(Encounter::gnasher_den().monsters, vec![gnasher_data(), bore_mite_data()]);
    }

    #[test]
    fn test_player_setup_applies_equipment() {
        let encounter = Encounter::gnasher_den();
        let record = encounter.player.record().unwrap();
        assert_eq!(record.level(), 3);
        assert_eq!(record.stats().dmg_phy, 3);
        assert_eq!(record.resources().hp, 121);
    }
}
