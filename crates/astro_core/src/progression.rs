//! Persistent player record and levelling.
//!
//! The [`PlayerRecord`] lives outside battles. A battle receives a snapshot
//! via [`PlayerRecord::combatant`] and hands its [`BattleOutcome`] back to
//! [`PlayerRecord::apply_outcome`] when it ends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::battle::BattleOutcome;
use crate::combatant::Combatant;
use crate::error::{BattleError, Result};
use crate::stats::{apply_modifiers, Equipment, EquipmentSlot, ResourcePool, StatBlock, StatsMod, Status};

/// Highest attainable level.
pub const MAX_LEVEL: u32 = 20;

/// One row of the level table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelEntry {
    /// Cumulative experience needed to reach the level.
    pub experience: u32,
    /// Hit point capacity.
    pub hp: i32,
    /// Mystic point capacity.
    pub mp: i32,
    /// Psychic point capacity.
    pub pp: i32,
    /// Offense.
    pub off: i32,
    /// Defense.
    pub def: i32,
    /// Psyche.
    pub psy: i32,
}

const fn row(experience: u32, hp: i32, mp: i32, pp: i32, off: i32, def: i32, psy: i32) -> LevelEntry {
    LevelEntry {
        experience,
        hp,
        mp,
        pp,
        off,
        def,
        psy,
    }
}

/// Level table indexed by level. Index 0 is unused.
pub const LEVEL_TABLE: [LevelEntry; 21] = [
    row(0, 0, 0, 0, 0, 0, 0),
    row(0, 100, 45, 30, 15, 17, 12),
    row(200, 110, 50, 33, 16, 17, 12),
    row(400, 121, 56, 37, 16, 18, 12),
    row(600, 132, 62, 41, 16, 18, 13),
    row(1000, 146, 69, 46, 17, 18, 13),
    row(1400, 160, 76, 50, 17, 19, 13),
    row(1800, 175, 83, 55, 17, 19, 14),
    row(2500, 199, 90, 61, 18, 19, 14),
    row(3500, 230, 99, 66, 18, 20, 14),
    row(5000, 262, 108, 72, 18, 20, 15),
    row(10000, 319, 117, 78, 19, 20, 15),
    row(15000, 371, 127, 85, 19, 21, 15),
    row(22000, 470, 138, 92, 19, 21, 16),
    row(30000, 585, 149, 99, 20, 21, 16),
    row(40000, 699, 162, 107, 20, 22, 16),
    row(54000, 810, 175, 115, 20, 22, 17),
    row(69000, 950, 188, 125, 21, 22, 17),
    row(88000, 1022, 201, 134, 21, 23, 17),
    row(100_000, 1175, 218, 145, 21, 23, 18),
    row(120_000, 1400, 237, 156, 22, 24, 19),
];

/// Look up a level's table row.
pub fn level_entry(level: u32) -> Result<&'static LevelEntry> {
    if level == 0 || level > MAX_LEVEL {
        return Err(BattleError::UnknownLevel(level));
    }
    Ok(&LEVEL_TABLE[level as usize])
}

/// The highest level whose threshold `experience` meets.
#[must_use]
pub fn level_for_experience(experience: u32) -> u32 {
    (1..=MAX_LEVEL)
        .rev()
        .find(|level| LEVEL_TABLE[*level as usize].experience <= experience)
        .unwrap_or(1)
}

/// The persistent player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Display name.
    pub name: String,
    level: u32,
    experience: u32,
    base: StatBlock,
    resources: ResourcePool,
    statuses: Vec<Status>,
    equipment: BTreeMap<EquipmentSlot, Equipment>,
}

impl PlayerRecord {
    /// A fresh level 1 player at full resources.
    pub fn new(name: impl Into<String>) -> Self {
        let base = base_for(&LEVEL_TABLE[1], &StatBlock::ZERO);
        Self {
            name: name.into(),
            level: 1,
            experience: 0,
            base,
            resources: base.capacity(),
            statuses: Vec::new(),
            equipment: BTreeMap::new(),
        }
    }

    /// A player at the given level with exactly that level's experience.
    pub fn at_level(name: impl Into<String>, level: u32) -> Result<Self> {
        let entry = level_entry(level)?;
        let base = base_for(entry, &StatBlock::ZERO);
        Ok(Self {
            name: name.into(),
            level,
            experience: entry.experience,
            base,
            resources: base.capacity(),
            statuses: Vec::new(),
            equipment: BTreeMap::new(),
        })
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Cumulative experience.
    #[must_use]
    pub const fn experience(&self) -> u32 {
        self.experience
    }

    /// Base stats.
    #[must_use]
    pub const fn base(&self) -> &StatBlock {
        &self.base
    }

    /// Replace base stats, for content that grants innate damage ratings or
    /// resistances.
    pub fn set_base(&mut self, base: StatBlock) {
        self.base = base;
        self.recalculate();
    }

    /// Current resources.
    #[must_use]
    pub const fn resources(&self) -> &ResourcePool {
        &self.resources
    }

    /// Active status effects.
    #[must_use]
    pub fn statuses(&self) -> &[Status] {
        &self.statuses
    }

    /// Worn equipment.
    pub fn equipment(&self) -> impl Iterator<Item = &Equipment> {
        self.equipment.values()
    }

    /// Calculated stats with equipment and statuses applied.
    #[must_use]
    pub fn stats(&self) -> StatBlock {
        apply_modifiers(self.base, self.modifiers().iter())
    }

    /// Lower resources that exceed the current capacities.
    pub fn recalculate(&mut self) {
        let stats = self.stats();
        self.resources.clamp_to(&stats);
    }

    /// Wear an item, returning whatever it displaced.
    pub fn equip(&mut self, item: Equipment) -> Option<Equipment> {
        let previous = self.equipment.insert(item.slot, item);
        self.recalculate();
        previous
    }

    /// Remove whatever is worn in a slot.
    pub fn unequip(&mut self, slot: EquipmentSlot) -> Option<Equipment> {
        let removed = self.equipment.remove(&slot);
        self.recalculate();
        removed
    }

    /// Gain a status effect.
    pub fn add_status(&mut self, status: Status) {
        self.statuses.push(status);
        self.recalculate();
    }

    /// Lose the first status effect with the given name.
    pub fn remove_status(&mut self, name: &str) -> Option<Status> {
        let index = self.statuses.iter().position(|s| s.name == name)?;
        let status = self.statuses.remove(index);
        self.recalculate();
        Some(status)
    }

    /// Restore resources to full capacity.
    pub fn rest(&mut self) {
        self.resources = self.stats().capacity();
    }

    /// The battle snapshot of this player.
    #[must_use]
    pub fn combatant(&self) -> Combatant {
        Combatant::player(
            self.name.clone(),
            self.base,
            self.equipment.values().map(|e| e.modifier).collect(),
            self.statuses.clone(),
            self.resources,
        )
    }

    /// Fold a finished battle back into the record.
    ///
    /// Returns the number of levels gained.
    pub fn apply_outcome(&mut self, outcome: &BattleOutcome) -> u32 {
        self.resources = outcome.resources;
        self.experience = self.experience.saturating_add(outcome.experience);

        let reached = level_for_experience(self.experience).max(self.level);
        let gained = reached - self.level;
        if gained > 0 {
            self.level = reached;
            self.base = base_for(&LEVEL_TABLE[reached as usize], &self.base);
            info!(name = %self.name, level = self.level, gained, "Level up");
        }
        self.recalculate();
        gained
    }

    fn modifiers(&self) -> Vec<StatsMod> {
        self.equipment
            .values()
            .map(|e| e.modifier)
            .chain(self.statuses.iter().map(|s| s.modifier))
            .collect()
    }
}

/// Table values for the core attributes, keeping damage and resistance.
fn base_for(entry: &LevelEntry, previous: &StatBlock) -> StatBlock {
    StatBlock {
        hp: entry.hp,
        mp: entry.mp,
        pp: entry.pp,
        off: entry.off,
        def: entry.def,
        psy: entry.psy,
        ..*previous
    }
}
