//! Balance testing utilities.
//!
//! Runs many seeded battles of one matchup to check that encounters are
//! winnable without being trivial.

use astro_core::battle::{Battle, BattleConfig, BattleResult, BattleTemplate};
use astro_core::combatant::Combatant;
use astro_core::rng::GameRng;
use tracing::debug;

/// Result of one simulated battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleSample {
    /// How it ended (`None` on timeout).
    pub result: Option<BattleResult>,
    /// Ticks elapsed.
    pub ticks: u64,
    /// Player hit points at the start.
    pub starting_hp: i32,
    /// Player hit points at the end.
    pub remaining_hp: i32,
}

/// Statistics for a set of battles.
#[derive(Debug, Clone, Default)]
pub struct BattleStats {
    /// Total battles run.
    pub total_battles: u32,
    /// Battles the player won.
    pub wins: u32,
    /// Battles the player lost.
    pub losses: u32,
    /// Battles that hit the tick limit.
    pub timeouts: u32,
    /// Average ticks to resolution.
    pub avg_ticks: f64,
    /// Average fraction of starting hit points left after a win.
    pub avg_remaining_ratio: f64,
}

impl BattleStats {
    /// Aggregate a set of samples.
    #[must_use]
    pub fn from_samples(samples: &[BattleSample]) -> Self {
        let mut stats = Self {
            total_battles: samples.len() as u32,
            ..Self::default()
        };
        if samples.is_empty() {
            return stats;
        }

        let mut ratio_sum = 0.0;
        for sample in samples {
            match sample.result {
                Some(BattleResult::Win) => {
                    stats.wins += 1;
                    if sample.starting_hp > 0 {
                        ratio_sum += f64::from(sample.remaining_hp) / f64::from(sample.starting_hp);
                    }
                }
                Some(BattleResult::Lose) => stats.losses += 1,
                None => stats.timeouts += 1,
            }
        }
        stats.avg_ticks = samples.iter().map(|s| s.ticks as f64).sum::<f64>() / samples.len() as f64;
        if stats.wins > 0 {
            stats.avg_remaining_ratio = ratio_sum / f64::from(stats.wins);
        }
        stats
    }

    /// Player win rate (0.0 to 1.0).
    pub fn win_rate(&self) -> f64 {
        if self.total_battles == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(self.total_battles)
    }

    /// Check whether the win rate falls inside an acceptable range.
    pub fn is_balanced(&self, min_rate: f64, max_rate: f64) -> bool {
        let rate = self.win_rate();
        rate >= min_rate && rate <= max_rate
    }
}

/// Run one battle to completion or `max_ticks`.
///
/// Returns `None` if the battle could not be started.
pub fn simulate(
    player: Combatant,
    template: BattleTemplate,
    seed: u64,
    max_ticks: u64,
) -> Option<BattleSample> {
    let starting_hp = player.resources().hp;
    let mut rng = GameRng::new(seed);
    let mut battle = Battle::new(player, template, BattleConfig::default(), &mut rng).ok()?;

    while battle.is_active() && battle.tick_count() < max_ticks {
        battle.tick(&mut rng).ok()?;
    }

    Some(BattleSample {
        result: battle.state().result(),
        ticks: battle.tick_count(),
        starting_hp,
        remaining_hp: battle.player().resources().hp,
    })
}

/// Run the same matchup over consecutive seeds starting at `first_seed`.
pub fn sweep<P, T>(player: P, template: T, first_seed: u64, runs: u32, max_ticks: u64) -> BattleStats
where
    P: Fn() -> Combatant,
    T: Fn() -> BattleTemplate,
{
    let samples: Vec<BattleSample> = (0..u64::from(runs))
        .filter_map(|i| simulate(player(), template(), first_seed + i, max_ticks))
        .collect();
    let stats = BattleStats::from_samples(&samples);
    debug!(
        runs,
        first_seed,
        wins = stats.wins,
        losses = stats.losses,
        timeouts = stats.timeouts,
        "Balance sweep complete"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{harmless_monster, level_one_player, level_one_stats, player_with};
    use astro_core::bestiary::row_house_hole;
    use astro_core::stats::StatBlock;

    fn sample(result: Option<BattleResult>, ticks: u64, remaining_hp: i32) -> BattleSample {
        BattleSample {
            result,
            ticks,
            starting_hp: 100,
            remaining_hp,
        }
    }

    #[test]
    fn test_stats_from_samples() {
        let stats = BattleStats::from_samples(&[
            sample(Some(BattleResult::Win), 40, 50),
            sample(Some(BattleResult::Win), 60, 100),
            sample(Some(BattleResult::Lose), 80, 0),
            sample(None, 100, 30),
        ]);
        assert_eq!(stats.total_battles, 4);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.timeouts, 1);
        assert!((stats.avg_ticks - 70.0).abs() < f64::EPSILON);
        assert!((stats.avg_remaining_ratio - 0.75).abs() < f64::EPSILON);
        assert!(stats.is_balanced(0.4, 0.6));
    }

    #[test]
    fn test_empty_stats() {
        let stats = BattleStats::from_samples(&[]);
        assert_eq!(stats.win_rate(), 0.0);
    }

    #[test]
    fn test_sweep_counts_every_seed() {
        let stats = sweep(level_one_player, row_house_hole, 0, 50, 10_000);
        assert_eq!(stats.total_battles, 50);
        assert_eq!(stats.wins + stats.losses + stats.timeouts, 50);
        assert!(stats.is_balanced(0.0, 1.0));
    }

    #[test]
    fn test_sweep_against_harmless_monster_always_wins() {
        let strong = || {
            player_with(StatBlock {
                off: 60,
                dmg_phy: 20,
                ..level_one_stats()
            })
        };
        let template = || BattleTemplate::new(vec![harmless_monster("Husk", 30, 5)]);
        let stats = sweep(strong, template, 100, 20, 10_000);
        assert_eq!(stats.total_battles, 20);
        assert_eq!(stats.wins, 20);
        assert_eq!(stats.timeouts, 0);
        assert!(stats.is_balanced(1.0, 1.0));
        assert!((stats.avg_remaining_ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_simulate_stops_at_tick_limit() {
        let template = BattleTemplate::new(vec![harmless_monster("Husk", 30, 5)]);
        let sample = simulate(level_one_player(), template, 3, 1).expect("battle starts");
        assert!(sample.ticks <= 1);
        assert_eq!(sample.starting_hp, 100);
    }
}
