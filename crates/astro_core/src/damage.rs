//! Damage channel formulas.
//!
//! Four independent channels (physical, elemental, mystical, psychic) each
//! turn attacker and defender stats into a non-negative damage number. Each
//! channel rolls its own variance, so one call to [`calculate_base_damage`]
//! consumes five draws: one per channel plus the mystical burst check.
//!
//! Negative resistance is vulnerability: its magnitude is added to the
//! attacker's rating for that channel before the formula runs. Positive
//! resistance is subtracted at the end. Every subtraction floors at zero
//! on its own, so the order of steps is part of the formula.
//!
//! Stat blocks are unbounded, so every intermediate saturates instead of
//! overflowing: absurd content caps out at the largest representable
//! damage rather than panicking.

use serde::{Deserialize, Serialize};

use crate::math::{div_round, fx, round_half_up, Fixed};
use crate::rng::RandomSource;
use crate::stats::StatBlock;

/// Threshold on the burst draw at or above which mystical damage doubles.
pub const MYSTIC_BURST_THRESHOLD: f64 = 0.333;

/// Per-channel base damage before positional scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DamageBase {
    /// Physical channel.
    pub phy: u32,
    /// Elemental channel.
    pub ele: u32,
    /// Mystical channel.
    pub mys: u32,
    /// Psychic channel.
    pub psy: u32,
    /// Sum of the four channels.
    pub total: u32,
}

/// The attacker's channel rating with any defender vulnerability folded in.
fn rating_against(rating: i32, resistance: i32) -> i32 {
    if resistance < 0 {
        rating.saturating_sub(resistance)
    } else {
        rating
    }
}

/// Subtract a positive resistance, floored at zero.
fn resist(damage: i32, resistance: i32) -> i32 {
    if resistance > 0 {
        damage.saturating_sub(resistance).max(0)
    } else {
        damage
    }
}

fn to_damage(value: i32) -> u32 {
    value.max(0) as u32
}

/// Physical damage: offense-driven, heavily mitigated by defense.
///
/// Defense is subtracted twice: a flat third, then half of any margin by
/// which the defender's defense exceeds the attacker's offense.
pub fn physical(a: &StatBlock, d: &StatBlock, rng: &mut dyn RandomSource) -> u32 {
    let oompf = rng.uniform(fx(1), Fixed::from_num(1.5));
    let rating = rating_against(a.dmg_phy, d.res_phy);

    let mut dmg = round_half_up(fx(a.off).saturating_mul(oompf).saturating_add(fx(rating)));
    dmg = dmg.saturating_sub(div_round(d.def, 3)).max(0);
    dmg = dmg.saturating_sub(div_round(d.def.saturating_sub(a.off).max(0), 2)).max(0);
    to_damage(resist(dmg, d.res_phy))
}

/// Elemental damage: narrow variance, scaled by offense.
pub fn elemental(a: &StatBlock, d: &StatBlock, rng: &mut dyn RandomSource) -> u32 {
    let oompf = rng.uniform(Fixed::from_num(0.9), Fixed::from_num(1.1));
    let rating = rating_against(a.dmg_ele, d.res_ele);

    let scale = Fixed::ONE.saturating_add(fx(a.off) / fx(15));
    let mut dmg = round_half_up(scale.saturating_mul(oompf).saturating_mul(fx(rating)));
    dmg = dmg.saturating_sub(div_round(d.def, 3)).max(0);
    to_damage(resist(dmg, d.res_ele))
}

/// Mystical damage: wide variance with a doubling burst.
pub fn mystical(a: &StatBlock, d: &StatBlock, rng: &mut dyn RandomSource) -> u32 {
    let mut oompf = rng.uniform(Fixed::from_num(0.5), Fixed::from_num(1.5));
    if rng.ratio() >= Fixed::from_num(MYSTIC_BURST_THRESHOLD) {
        oompf = oompf.saturating_mul(fx(2));
    }
    let rating = rating_against(a.dmg_mys, d.res_mys);

    let mut dmg = round_half_up(fx(rating).saturating_mul(oompf));
    dmg = dmg.saturating_sub(div_round(d.def, 6)).max(0);
    to_damage(resist(dmg, d.res_mys))
}

/// Psychic damage: scaled by psyche, with a bonus for out-psyching the
/// defender.
pub fn psychic(a: &StatBlock, d: &StatBlock, rng: &mut dyn RandomSource) -> u32 {
    let oompf = rng.uniform(fx(1), Fixed::from_num(1.25));
    let psy_base = fx(a.psy) / fx(15);
    let psy_boost = fx(a.psy.saturating_sub(d.psy).max(0)) / fx(4);
    let rating = rating_against(a.dmg_psy, d.res_psy);

    let scale = Fixed::ONE.saturating_add(psy_base).saturating_add(psy_boost);
    let mut dmg = round_half_up(scale.saturating_mul(oompf).saturating_mul(fx(rating)));
    dmg = dmg.saturating_sub(round_half_up((fx(d.def) / fx(4)).saturating_add(fx(d.psy) / fx(4)))).max(0);
    to_damage(resist(dmg, d.res_psy))
}

/// Roll all four channels, in order, and sum them.
pub fn calculate_base_damage(
    attacker: &StatBlock,
    defender: &StatBlock,
    rng: &mut dyn RandomSource,
) -> DamageBase {
    let phy = physical(attacker, defender, rng);
    let ele = elemental(attacker, defender, rng);
    let mys = mystical(attacker, defender, rng);
    let psy = psychic(attacker, defender, rng);
    DamageBase {
        phy,
        ele,
        mys,
        psy,
        total: phy.saturating_add(ele).saturating_add(mys).saturating_add(psy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SequenceRng;

    fn attacker() -> StatBlock {
        StatBlock {
            hp: 100,
            off: 15,
            def: 17,
            psy: 12,
            ..StatBlock::ZERO
        }
    }

    fn defender() -> StatBlock {
        StatBlock {
            hp: 50,
            off: 10,
            def: 17,
            psy: 6,
            ..StatBlock::ZERO
        }
    }

    #[test]
    fn test_physical_minimum_roll() {
        let mut rng = SequenceRng::constant(0.0);
        // round(15 * 1.0) = 15; -round(17 / 3) = 6 -> 9; -round(2 / 2) = 1 -> 8
        assert_eq!(physical(&attacker(), &defender(), &mut rng), 8);
    }

    #[test]
    fn test_physical_defense_advantage_penalty() {
        let mut rng = SequenceRng::constant(0.0);
        let wall = StatBlock {
            def: 45,
            ..defender()
        };
        // 15 - round(15) = 0, stays floored at zero.
        assert_eq!(physical(&attacker(), &wall, &mut rng), 0);
    }

    #[test]
    fn test_physical_vulnerability_adds_rating() {
        let mut rng = SequenceRng::constant(0.0);
        let soft = StatBlock {
            res_phy: -5,
            ..defender()
        };
        assert_eq!(physical(&attacker(), &soft, &mut rng), 13);
    }

    #[test]
    fn test_physical_resistance_subtracts() {
        let mut rng = SequenceRng::constant(0.0);
        let hard = StatBlock {
            res_phy: 5,
            ..defender()
        };
        assert_eq!(physical(&attacker(), &hard, &mut rng), 3);

        let harder = StatBlock {
            res_phy: 50,
            ..defender()
        };
        assert_eq!(physical(&attacker(), &harder, &mut rng), 0);
    }

    #[test]
    fn test_elemental_scales_with_offense() {
        let mut rng = SequenceRng::constant(0.0);
        let a = StatBlock {
            dmg_ele: 10,
            ..attacker()
        };
        let d = StatBlock {
            def: 1,
            ..defender()
        };
        // (1 + 15/15) * 0.9 * 10 = 18
        assert_eq!(elemental(&a, &d, &mut rng), 18);
    }

    #[test]
    fn test_zero_rating_channels_deal_nothing() {
        let mut rng = SequenceRng::constant(0.7);
        let a = attacker();
        assert_eq!(elemental(&a, &defender(), &mut rng), 0);
        assert_eq!(mystical(&a, &defender(), &mut rng), 0);
        assert_eq!(psychic(&a, &defender(), &mut rng), 0);
    }

    #[test]
    fn test_mystical_burst() {
        let a = StatBlock {
            dmg_mys: 10,
            ..attacker()
        };
        let d = StatBlock {
            def: 6,
            ..defender()
        };
        // Multiplier 1.0, burst draw 0.5 >= 0.333 doubles it: 20 - round(6/6) = 19
        let mut burst = SequenceRng::constant(0.5);
        assert_eq!(mystical(&a, &d, &mut burst), 19);

        // Multiplier 1.0, burst draw 0.2 misses: 10 - 1 = 9
        let mut plain = SequenceRng::new(vec![0.5, 0.2]);
        assert_eq!(mystical(&a, &d, &mut plain), 9);
    }

    #[test]
    fn test_psychic_disparity_bonus() {
        let mut rng = SequenceRng::constant(0.0);
        let a = StatBlock {
            psy: 20,
            dmg_psy: 4,
            ..attacker()
        };
        let d = StatBlock {
            def: 8,
            psy: 12,
            ..defender()
        };
        // (1 + 20/15 + 8/4) * 1.0 * 4 = 17.33 -> 17; -round(2 + 3) -> 12
        assert_eq!(psychic(&a, &d, &mut rng), 12);
    }

    #[test]
    fn test_base_damage_consumes_five_draws() {
        let mut rng = SequenceRng::constant(0.0);
        let base = calculate_base_damage(&attacker(), &defender(), &mut rng);
        assert_eq!(rng.draws(), 5);
        assert_eq!(base.total, base.phy + base.ele + base.mys + base.psy);
        assert_eq!(base.phy, 8);
    }

    #[test]
    fn test_huge_stats_saturate_instead_of_overflowing() {
        let titan = StatBlock {
            off: 100_000,
            psy: 100_000,
            dmg_phy: 100_000,
            dmg_ele: 100_000,
            dmg_mys: 100_000,
            dmg_psy: 100_000,
            ..attacker()
        };
        let mut rng = SequenceRng::constant(0.0);
        assert_eq!(psychic(&titan, &defender(), &mut rng), i32::MAX as u32 - 6);

        let mut rng = SequenceRng::constant(0.99);
        let base = calculate_base_damage(&titan, &defender(), &mut rng);
        assert!(base.ele > 1_000_000);
        assert!(base.total >= base.psy);
    }

    #[test]
    fn test_extreme_negative_stats_do_not_panic() {
        let frail = StatBlock {
            def: i32::MIN,
            psy: i32::MIN,
            res_phy: i32::MIN,
            res_ele: i32::MIN,
            res_mys: i32::MIN,
            res_psy: i32::MIN,
            ..defender()
        };
        let brute = StatBlock {
            off: i32::MAX,
            psy: i32::MAX,
            ..attacker()
        };
        let mut rng = SequenceRng::constant(0.5);
        let base = calculate_base_damage(&brute, &frail, &mut rng);
        assert_eq!(base.total, u32::MAX);
    }
}
