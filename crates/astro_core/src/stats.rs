//! Stat blocks, modifiers and clamping.
//!
//! A [`StatBlock`] is the full numeric profile of a combatant. Base values
//! come from class/level; current values are recomputed from the base and
//! the active [`StatsMod`] set whenever that set changes.
//!
//! # Modifier order
//!
//! Percentages are always taken of the *base* value and applied before any
//! flat bonus:
//!
//! ```text
//! current = clamp(base + round(base * sum(percent) / 100) + sum(add))
//! ```

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::math::percent_of;

/// The complete numeric profile of a combatant.
///
/// Resistances may be negative, meaning vulnerability to that channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBlock {
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
    /// Physical damage rating.
    pub dmg_phy: i32,
    /// Elemental damage rating.
    pub dmg_ele: i32,
    /// Mystical damage rating.
    pub dmg_mys: i32,
    /// Psychic damage rating.
    pub dmg_psy: i32,
    /// Physical resistance.
    pub res_phy: i32,
    /// Elemental resistance.
    pub res_ele: i32,
    /// Mystical resistance.
    pub res_mys: i32,
    /// Psychic resistance.
    pub res_psy: i32,
}

impl StatBlock {
    /// All fields zero.
    pub const ZERO: Self = Self {
        hp: 0,
        mp: 0,
        pp: 0,
        off: 0,
        def: 0,
        psy: 0,
        dmg_phy: 0,
        dmg_ele: 0,
        dmg_mys: 0,
        dmg_psy: 0,
        res_phy: 0,
        res_ele: 0,
        res_mys: 0,
        res_psy: 0,
    };

    /// Combine two blocks field by field.
    #[must_use]
    pub fn zip_with(self, other: Self, f: impl Fn(i32, i32) -> i32) -> Self {
        Self {
            hp: f(self.hp, other.hp),
            mp: f(self.mp, other.mp),
            pp: f(self.pp, other.pp),
            off: f(self.off, other.off),
            def: f(self.def, other.def),
            psy: f(self.psy, other.psy),
            dmg_phy: f(self.dmg_phy, other.dmg_phy),
            dmg_ele: f(self.dmg_ele, other.dmg_ele),
            dmg_mys: f(self.dmg_mys, other.dmg_mys),
            dmg_psy: f(self.dmg_psy, other.dmg_psy),
            res_phy: f(self.res_phy, other.res_phy),
            res_ele: f(self.res_ele, other.res_ele),
            res_mys: f(self.res_mys, other.res_mys),
            res_psy: f(self.res_psy, other.res_psy),
        }
    }

    /// Clamp to the legal range.
    ///
    /// Capacities and core attributes are floored at 1, damage ratings at 0.
    /// Resistances are left alone.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            hp: self.hp.max(1),
            mp: self.mp.max(1),
            pp: self.pp.max(1),
            off: self.off.max(1),
            def: self.def.max(1),
            psy: self.psy.max(1),
            dmg_phy: self.dmg_phy.max(0),
            dmg_ele: self.dmg_ele.max(0),
            dmg_mys: self.dmg_mys.max(0),
            dmg_psy: self.dmg_psy.max(0),
            ..self
        }
    }

    /// The resource capacities as a full pool.
    #[must_use]
    pub const fn capacity(&self) -> ResourcePool {
        ResourcePool {
            hp: self.hp,
            mp: self.mp,
            pp: self.pp,
        }
    }
}

impl Add for StatBlock {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.zip_with(rhs, i32::saturating_add)
    }
}

impl AddAssign for StatBlock {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Element-wise sum over all fourteen fields.
#[must_use]
pub fn add_stats(a: StatBlock, b: StatBlock) -> StatBlock {
    a + b
}

/// The consumable current resources of a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ResourcePool {
    /// Current hit points. Zero means defeated.
    pub hp: i32,
    /// Current mystic points.
    pub mp: i32,
    /// Current psychic points.
    pub pp: i32,
}

impl ResourcePool {
    /// Lower each resource to its capacity. Never raises a value.
    pub fn clamp_to(&mut self, capacity: &StatBlock) {
        self.hp = self.hp.min(capacity.hp);
        self.mp = self.mp.min(capacity.mp);
        self.pp = self.pp.min(capacity.pp);
    }

    /// Subtract hit points, floored at zero. Returns the amount removed.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        let before = self.hp;
        self.hp = self.hp.saturating_sub(amount).max(0);
        (before - self.hp).max(0) as u32
    }

    /// Whether hit points are exhausted.
    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.hp <= 0
    }
}

/// A stat modifier: a percentage-of-base part and a flat part.
///
/// Either part may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsMod {
    /// Percentages of the base value to add (may be negative).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_percent: Option<StatBlock>,
    /// Flat amounts to add after percentages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add: Option<StatBlock>,
}

impl StatsMod {
    /// A modifier with only a percentage part.
    #[must_use]
    pub const fn percent(add_percent: StatBlock) -> Self {
        Self {
            add_percent: Some(add_percent),
            add: None,
        }
    }

    /// A modifier with only a flat part.
    #[must_use]
    pub const fn flat(add: StatBlock) -> Self {
        Self {
            add_percent: None,
            add: Some(add),
        }
    }

    /// Sum two modifiers part by part.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        fn merge(a: Option<StatBlock>, b: Option<StatBlock>) -> Option<StatBlock> {
            match (a, b) {
                (Some(a), Some(b)) => Some(a + b),
                (a, None) => a,
                (None, b) => b,
            }
        }
        Self {
            add_percent: merge(self.add_percent, other.add_percent),
            add: merge(self.add, other.add),
        }
    }
}

/// Compute current stats from base stats and a modifier set.
///
/// All percentage parts are summed and applied to the base first, then all
/// flat parts are added on top, then the result is clamped. Swapping the two
/// phases changes results.
#[must_use]
pub fn apply_modifiers<'a>(
    base: StatBlock,
    mods: impl IntoIterator<Item = &'a StatsMod>,
) -> StatBlock {
    let total = mods
        .into_iter()
        .fold(StatsMod::default(), |acc, m| acc.combine(*m));

    let mut stats = base;
    if let Some(percent) = total.add_percent {
        stats += base.zip_with(percent, percent_of);
    }
    if let Some(add) = total.add {
        stats += add;
    }
    stats.clamped()
}

/// A status effect that modifies stats while active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Display name, also the identity used for removal.
    pub name: String,
    /// Stat modifier while the status is active.
    pub modifier: StatsMod,
}

impl Status {
    /// Create a status effect.
    pub fn new(name: impl Into<String>, modifier: StatsMod) -> Self {
        Self {
            name: name.into(),
            modifier,
        }
    }

    /// Poison: -15% offense.
    #[must_use]
    pub fn poison() -> Self {
        Self::new(
            "Poison",
            StatsMod::percent(StatBlock {
                off: -15,
                ..StatBlock::ZERO
            }),
        )
    }
}

/// Where a piece of equipment is worn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EquipmentSlot {
    /// Held weapon.
    Weapon,
    /// Head.
    Helmet,
    /// Hands.
    Hands,
    /// Torso.
    Body,
    /// Feet.
    Feet,
}

/// A wearable item. Only its stat modifier matters to combat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    /// Display name.
    pub name: String,
    /// Slot the item occupies.
    pub slot: EquipmentSlot,
    /// Stat modifier while worn.
    #[serde(default)]
    pub modifier: StatsMod,
}

impl Equipment {
    /// Create a piece of equipment.
    pub fn new(name: impl Into<String>, slot: EquipmentSlot, modifier: StatsMod) -> Self {
        Self {
            name: name.into(),
            slot,
            modifier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> StatBlock {
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

    #[test]
    fn test_add_stats_all_fields() {
        let a = StatBlock {
            hp: 1,
            res_psy: -3,
            dmg_ele: 2,
            ..StatBlock::ZERO
        };
        let b = StatBlock {
            hp: 4,
            res_psy: 1,
            dmg_mys: 5,
            ..StatBlock::ZERO
        };
        let sum = add_stats(a, b);
        assert_eq!(sum.hp, 5);
        assert_eq!(sum.res_psy, -2);
        assert_eq!(sum.dmg_ele, 2);
        assert_eq!(sum.dmg_mys, 5);
    }

    #[test]
    fn test_poison_reduces_offense() {
        let stats = apply_modifiers(base(), &[Status::poison().modifier]);
        // round(15 * -15 / 100) = round(-2.25) = -2
        assert_eq!(stats.off, 13);
        assert_eq!(stats.def, 17);
    }

    #[test]
    fn test_percent_before_flat() {
        let percent = StatsMod::percent(StatBlock {
            off: 100,
            ..StatBlock::ZERO
        });
        let flat = StatsMod::flat(StatBlock {
            off: 10,
            ..StatBlock::ZERO
        });
        // Percent of base (15), not of base + flat (25).
        let stats = apply_modifiers(base(), &[flat, percent]);
        assert_eq!(stats.off, 15 + 15 + 10);
    }

    #[test]
    fn test_clamping() {
        let crush = StatsMod::flat(StatBlock {
            off: -100,
            hp: -500,
            dmg_phy: -4,
            res_ele: -9,
            ..StatBlock::ZERO
        });
        let stats = apply_modifiers(base(), &[crush]);
        assert_eq!(stats.off, 1);
        assert_eq!(stats.hp, 1);
        assert_eq!(stats.dmg_phy, 0);
        assert_eq!(stats.res_ele, -9);
    }

    #[test]
    fn test_empty_modifier_set_is_clamped_base() {
        let none: Vec<StatsMod> = Vec::new();
        assert_eq!(apply_modifiers(base(), &none), base().clamped());
    }

    #[test]
    fn test_combine_keeps_present_parts() {
        let a = StatsMod::flat(StatBlock {
            def: 1,
            ..StatBlock::ZERO
        });
        let b = StatsMod::percent(StatBlock {
            off: 10,
            ..StatBlock::ZERO
        });
        let c = a.combine(b).combine(a);
        assert_eq!(c.add.map(|s| s.def), Some(2));
        assert_eq!(c.add_percent.map(|s| s.off), Some(10));
    }

    #[test]
    fn test_resource_clamp_never_raises() {
        let mut pool = ResourcePool {
            hp: 40,
            mp: 50,
            pp: 3,
        };
        pool.clamp_to(&base());
        assert_eq!(pool, ResourcePool { hp: 40, mp: 45, pp: 3 });
    }

    #[test]
    fn test_take_damage_floors_at_zero() {
        let mut pool = ResourcePool { hp: 5, mp: 0, pp: 0 };
        assert_eq!(pool.take_damage(3), 3);
        assert_eq!(pool.take_damage(10), 2);
        assert!(pool.is_defeated());
    }
}
