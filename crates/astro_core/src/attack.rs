//! Attacks and positional effectiveness.
//!
//! An [`Attack`] carries two stance-keyed tables:
//! - `power_in`: how well the attacker can execute it from its own stance
//! - `power_against`: how well it lands on a defender in a given stance
//!
//! Both are percentages with a sentinel for the degenerate case
//! ([`PowerIn::CannotAct`], [`PowerAgainst::Miss`]). The lookup itself is
//! pure; all game rules such as "guarding blunts most attacks" live in the
//! attack tables.

use serde::{Deserialize, Serialize};

use crate::combatant::Stance;
use crate::damage::{calculate_base_damage, DamageBase};
use crate::math::percent_of;
use crate::rng::RandomSource;
use crate::stats::StatBlock;

/// A value for each of the six stances.
///
/// Every stance has an entry, so a table can never be missing one; content
/// files that omit a stance fail to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StanceTable<T> {
    /// Entry for [`Stance::Fight`].
    pub fight: T,
    /// Entry for [`Stance::Guard`].
    pub guard: T,
    /// Entry for [`Stance::Left`].
    pub left: T,
    /// Entry for [`Stance::Right`].
    pub right: T,
    /// Entry for [`Stance::Back`].
    pub back: T,
    /// Entry for [`Stance::Duck`].
    pub duck: T,
}

impl<T> StanceTable<T> {
    /// Look up the entry for a stance.
    pub const fn get(&self, stance: Stance) -> &T {
        match stance {
            Stance::Fight => &self.fight,
            Stance::Guard => &self.guard,
            Stance::Left => &self.left,
            Stance::Right => &self.right,
            Stance::Back => &self.back,
            Stance::Duck => &self.duck,
        }
    }

    /// Replace the entry for a stance.
    #[must_use]
    pub fn with(mut self, stance: Stance, value: T) -> Self {
        let slot = match stance {
            Stance::Fight => &mut self.fight,
            Stance::Guard => &mut self.guard,
            Stance::Left => &mut self.left,
            Stance::Right => &mut self.right,
            Stance::Back => &mut self.back,
            Stance::Duck => &mut self.duck,
        };
        *slot = value;
        self
    }
}

impl<T: Copy> StanceTable<T> {
    /// The same value for every stance.
    pub const fn uniform(value: T) -> Self {
        Self {
            fight: value,
            guard: value,
            left: value,
            right: value,
            back: value,
            duck: value,
        }
    }
}

/// Effectiveness of an attack from the attacker's stance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerIn {
    /// Percentage of full power (100 = full, 200 = double).
    Percent(u32),
    /// The attack cannot be executed from this stance.
    CannotAct,
}

/// Effectiveness of an attack against the defender's stance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerAgainst {
    /// Percentage of full power (0 = harmless, 100 = full).
    Percent(u32),
    /// The attack misses entirely.
    Miss,
}

/// Why an attack dealt no damage regardless of the numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Special {
    /// The attacker could not act from its stance.
    NoAct,
    /// The attack missed the defender's stance entirely.
    Miss,
}

/// A queued action: stance tables plus optional flavor narration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attack {
    /// Display name.
    pub name: String,
    /// Effectiveness keyed by the attacker's stance.
    pub power_in: StanceTable<PowerIn>,
    /// Effectiveness keyed by the defender's stance.
    pub power_against: StanceTable<PowerAgainst>,
    /// Flavor line shown after the attack lands or misses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
}

impl Attack {
    /// The default unarmed attack used when nothing else is queued.
    ///
    /// Guarding and retreating blunt it from both sides; ducking under it
    /// does not help.
    #[must_use]
    pub fn unarmed() -> Self {
        Self {
            name: "Unarmed".to_string(),
            power_in: StanceTable {
                fight: PowerIn::Percent(100),
                guard: PowerIn::Percent(50),
                left: PowerIn::Percent(75),
                right: PowerIn::Percent(75),
                back: PowerIn::Percent(40),
                duck: PowerIn::Percent(60),
            },
            power_against: StanceTable {
                fight: PowerAgainst::Percent(100),
                guard: PowerAgainst::Percent(75),
                left: PowerAgainst::Percent(85),
                right: PowerAgainst::Percent(85),
                back: PowerAgainst::Percent(60),
                duck: PowerAgainst::Percent(100),
            },
            narration: None,
        }
    }

    /// Builder method to set the flavor narration.
    #[must_use]
    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = Some(narration.into());
        self
    }
}

/// One side of an attack round.
#[derive(Debug, Clone, Copy)]
pub struct RoundSide<'a> {
    /// Current (calculated) stats.
    pub stats: &'a StatBlock,
    /// Current stance.
    pub stance: Stance,
}

/// Everything needed to resolve one attack.
#[derive(Debug, Clone, Copy)]
pub struct AttackRound<'a> {
    /// The acting side.
    pub attacker: RoundSide<'a>,
    /// The attack being executed.
    pub attack: &'a Attack,
    /// The receiving side.
    pub defender: RoundSide<'a>,
}

/// The result of resolving an attack round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Per-channel base damage (all zero when the attacker could not act).
    pub base: DamageBase,
    /// Power-in entry for the attacker's stance.
    pub power_in: PowerIn,
    /// Power-against entry for the defender's stance, if the attack got
    /// that far.
    pub power_against: Option<PowerAgainst>,
    /// `round(power_in / 100 * base.total)`.
    pub preliminary: u32,
    /// Damage to apply to the defender.
    pub effective: u32,
    /// Set when the attack dealt nothing because of a sentinel.
    pub special: Option<Special>,
}

/// Resolve one attack round.
///
/// When the attacker cannot act no damage is rolled and no draws are
/// consumed. On a miss the damage is rolled and then discarded.
pub fn resolve_attack(round: &AttackRound<'_>, rng: &mut dyn RandomSource) -> AttackOutcome {
    let power_in = *round.attack.power_in.get(round.attacker.stance);
    let pi = match power_in {
        PowerIn::CannotAct => {
            return AttackOutcome {
                base: DamageBase::default(),
                power_in,
                power_against: None,
                preliminary: 0,
                effective: 0,
                special: Some(Special::NoAct),
            };
        }
        PowerIn::Percent(pi) => pi,
    };

    let base = calculate_base_damage(round.attacker.stats, round.defender.stats, rng);
    let preliminary = scale(base.total, pi);

    let power_against = *round.attack.power_against.get(round.defender.stance);
    let (effective, special) = match power_against {
        PowerAgainst::Miss => (0, Some(Special::Miss)),
        PowerAgainst::Percent(pa) => (scale(preliminary, pa), None),
    };

    AttackOutcome {
        base,
        power_in,
        power_against: Some(power_against),
        preliminary,
        effective,
        special,
    }
}

fn scale(value: u32, percent: u32) -> u32 {
    let value = i32::try_from(value).unwrap_or(i32::MAX);
    let percent = i32::try_from(percent).unwrap_or(i32::MAX);
    percent_of(value, percent).max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SequenceRng;

    fn stats(off: i32, def: i32) -> StatBlock {
        StatBlock {
            hp: 50,
            off,
            def,
            psy: 1,
            ..StatBlock::ZERO
        }
    }

    fn round<'a>(
        a: &'a StatBlock,
        a_stance: Stance,
        attack: &'a Attack,
        d: &'a StatBlock,
        d_stance: Stance,
    ) -> AttackRound<'a> {
        AttackRound {
            attacker: RoundSide {
                stats: a,
                stance: a_stance,
            },
            attack,
            defender: RoundSide {
                stats: d,
                stance: d_stance,
            },
        }
    }

    #[test]
    fn test_full_power_hit() {
        let a = stats(15, 1);
        let d = stats(1, 1);
        let attack = Attack::unarmed();
        let mut rng = SequenceRng::constant(0.0);

        let outcome = resolve_attack(&round(&a, Stance::Fight, &attack, &d, Stance::Fight), &mut rng);
        assert_eq!(outcome.base.phy, 15);
        assert_eq!(outcome.preliminary, 15);
        assert_eq!(outcome.effective, 15);
        assert_eq!(outcome.special, None);
    }

    #[test]
    fn test_power_scaling_rounds_each_step() {
        let a = stats(15, 1);
        let d = stats(1, 1);
        let attack = Attack::unarmed();
        let mut rng = SequenceRng::constant(0.0);

        // Attacker guards (50%): round(7.5) = 8; defender guards (75%): round(6) = 6
        let outcome = resolve_attack(&round(&a, Stance::Guard, &attack, &d, Stance::Guard), &mut rng);
        assert_eq!(outcome.preliminary, 8);
        assert_eq!(outcome.effective, 6);
    }

    #[test]
    fn test_cannot_act_consumes_no_draws() {
        let a = stats(15, 1);
        let d = stats(1, 1);
        let attack = Attack {
            power_in: Attack::unarmed().power_in.with(Stance::Fight, PowerIn::CannotAct),
            ..Attack::unarmed()
        };
        let mut rng = SequenceRng::constant(0.0);

        let outcome = resolve_attack(&round(&a, Stance::Fight, &attack, &d, Stance::Fight), &mut rng);
        assert_eq!(outcome.special, Some(Special::NoAct));
        assert_eq!(outcome.effective, 0);
        assert_eq!(outcome.power_against, None);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_miss_discards_damage() {
        let a = stats(15, 1);
        let d = stats(1, 1);
        let attack = Attack {
            power_against: StanceTable::uniform(PowerAgainst::Miss),
            ..Attack::unarmed()
        };
        let mut rng = SequenceRng::constant(0.0);

        let outcome = resolve_attack(&round(&a, Stance::Fight, &attack, &d, Stance::Duck), &mut rng);
        assert_eq!(outcome.special, Some(Special::Miss));
        assert_eq!(outcome.effective, 0);
        assert_eq!(outcome.preliminary, 15);
        assert_eq!(rng.draws(), 5);
    }

    #[test]
    fn test_table_lookup_covers_every_stance() {
        let table = StanceTable::uniform(0u32)
            .with(Stance::Fight, 1)
            .with(Stance::Guard, 2)
            .with(Stance::Left, 3)
            .with(Stance::Right, 4)
            .with(Stance::Back, 5)
            .with(Stance::Duck, 6);
        let values: Vec<u32> = Stance::ALL.iter().map(|s| *table.get(*s)).collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_attack_ron_requires_every_stance() {
        let partial = r#"(
            name: "Broken",
            power_in: (fight: Percent(100), guard: Percent(50)),
            power_against: (fight: Percent(100), guard: Percent(75), left: Miss, right: Miss, back: Miss, duck: Miss),
        )"#;
        assert!(ron::from_str::<Attack>(partial).is_err());
    }
}
