//! Property tests for the stat model and attack resolution.

use astro_core::attack::{resolve_attack, Attack, AttackRound, PowerAgainst, PowerIn, RoundSide, Special, StanceTable};
use astro_core::combatant::Combatant;
use astro_core::damage::calculate_base_damage;
use astro_core::rng::SequenceRng;
use astro_core::stats::{apply_modifiers, StatBlock, StatsMod, Status};
use astro_test_utils::determinism::strategies::{
    arb_draws, arb_stance, arb_stat_block, arb_stats_mod, arb_wild_stat_block,
};
use astro_test_utils::proptest::prelude::*;

fn total(a: &StatBlock, d: &StatBlock, draws: &[f64]) -> u32 {
    let mut rng = SequenceRng::new(draws.to_vec());
    calculate_base_damage(a, d, &mut rng).total
}

proptest! {
    /// Calculated stats never leave their legal ranges.
    #[test]
    fn prop_modifiers_always_clamp(
        base in arb_wild_stat_block(),
        mods in prop::collection::vec(arb_stats_mod(), 0..4),
    ) {
        let stats = apply_modifiers(base, mods.iter());
        for value in [stats.hp, stats.mp, stats.pp, stats.off, stats.def, stats.psy] {
            prop_assert!(value >= 1);
        }
        for value in [stats.dmg_phy, stats.dmg_ele, stats.dmg_mys, stats.dmg_psy] {
            prop_assert!(value >= 0);
        }
    }

    /// Turning any resistance into a vulnerability never lowers damage.
    #[test]
    fn prop_vulnerability_never_helps_the_defender(
        a in arb_stat_block(),
        d in arb_stat_block(),
        draws in arb_draws(),
        amount in 1i32..20,
    ) {
        let neutral = StatBlock { res_phy: 0, res_ele: 0, res_mys: 0, res_psy: 0, ..d };
        let baseline = total(&a, &neutral, &draws);
        for soft in [
            StatBlock { res_phy: -amount, ..neutral },
            StatBlock { res_ele: -amount, ..neutral },
            StatBlock { res_mys: -amount, ..neutral },
            StatBlock { res_psy: -amount, ..neutral },
        ] {
            prop_assert!(total(&a, &soft, &draws) >= baseline);
        }
    }

    /// Positive resistance never raises damage.
    #[test]
    fn prop_resistance_never_hurts_the_defender(
        a in arb_stat_block(),
        d in arb_stat_block(),
        draws in arb_draws(),
        amount in 1i32..20,
    ) {
        let neutral = StatBlock { res_phy: 0, res_ele: 0, res_mys: 0, res_psy: 0, ..d };
        let baseline = total(&a, &neutral, &draws);
        for hard in [
            StatBlock { res_phy: amount, ..neutral },
            StatBlock { res_ele: amount, ..neutral },
            StatBlock { res_mys: amount, ..neutral },
            StatBlock { res_psy: amount, ..neutral },
        ] {
            prop_assert!(total(&a, &hard, &draws) <= baseline);
        }
    }

    /// An attack that cannot be executed deals nothing and draws nothing.
    #[test]
    fn prop_cannot_act_is_inert(
        a in arb_stat_block(),
        d in arb_stat_block(),
        a_stance in arb_stance(),
        d_stance in arb_stance(),
    ) {
        let attack = Attack {
            power_in: StanceTable::uniform(PowerIn::CannotAct),
            ..Attack::unarmed()
        };
        let mut rng = SequenceRng::constant(0.5);
        let outcome = resolve_attack(
            &AttackRound {
                attacker: RoundSide { stats: &a, stance: a_stance },
                attack: &attack,
                defender: RoundSide { stats: &d, stance: d_stance },
            },
            &mut rng,
        );
        prop_assert_eq!(outcome.effective, 0);
        prop_assert_eq!(outcome.special, Some(Special::NoAct));
        prop_assert_eq!(rng.draws(), 0);
    }

    /// A miss rolls the damage but applies none of it.
    #[test]
    fn prop_miss_deals_nothing(
        a in arb_stat_block(),
        d in arb_stat_block(),
        a_stance in arb_stance(),
        d_stance in arb_stance(),
        draws in arb_draws(),
    ) {
        let attack = Attack {
            power_against: StanceTable::uniform(PowerAgainst::Miss),
            ..Attack::unarmed()
        };
        let mut rng = SequenceRng::new(draws);
        let outcome = resolve_attack(
            &AttackRound {
                attacker: RoundSide { stats: &a, stance: a_stance },
                attack: &attack,
                defender: RoundSide { stats: &d, stance: d_stance },
            },
            &mut rng,
        );
        prop_assert_eq!(outcome.effective, 0);
        prop_assert_eq!(outcome.special, Some(Special::Miss));
        prop_assert_eq!(rng.draws(), 5);
    }

    /// Adding then removing a status restores the calculated stats.
    #[test]
    fn prop_status_round_trip(base in arb_stat_block(), modifier in arb_stats_mod()) {
        let mut combatant = Combatant::player("You", base, Vec::new(), Vec::new(), base.capacity());
        let before = *combatant.stats();
        combatant.add_status(Status::new("Hex", modifier));
        combatant.remove_status("Hex");
        prop_assert_eq!(*combatant.stats(), before);
    }

    /// Flat modifiers apply after percentages: the order of the modifier
    /// list does not matter.
    #[test]
    fn prop_modifier_order_is_irrelevant(
        base in arb_stat_block(),
        first in arb_stats_mod(),
        second in arb_stats_mod(),
    ) {
        let forward: Vec<StatsMod> = vec![first, second];
        let backward: Vec<StatsMod> = vec![second, first];
        prop_assert_eq!(apply_modifiers(base, forward.iter()), apply_modifiers(base, backward.iter()));
    }
}
