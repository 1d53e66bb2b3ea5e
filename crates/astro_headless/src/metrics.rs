//! Battle metrics collection for balance analysis.

use astro_core::attack::Special;
use astro_core::battle::{BattleEvent, BattleResult, TickReport};
use astro_core::combatant::CombatantId;
use serde::{Deserialize, Serialize};

use crate::policy::PlayerPolicy;

/// How a headless run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunResult {
    /// The player won.
    Win,
    /// The player lost.
    Lose,
    /// The tick limit was reached first.
    Timeout,
}

impl From<Option<BattleResult>> for RunResult {
    fn from(result: Option<BattleResult>) -> Self {
        match result {
            Some(BattleResult::Win) => RunResult::Win,
            Some(BattleResult::Lose) => RunResult::Lose,
            None => RunResult::Timeout,
        }
    }
}

/// Complete metrics for a single battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleMetrics {
    /// Encounter name.
    pub encounter: String,
    /// Random seed used.
    pub seed: u64,
    /// Player policy used.
    pub policy: PlayerPolicy,
    /// How the battle ended.
    pub result: RunResult,
    /// Ticks elapsed.
    pub ticks: u64,
    /// Experience tallied (including bonus on a win).
    pub experience: u32,
    /// Levels the player gained from the outcome.
    pub levels_gained: u32,
    /// Player hit points at the start.
    pub hp_start: i32,
    /// Player hit points at the end.
    pub hp_end: i32,
    /// Damage the player dealt.
    pub damage_dealt: u64,
    /// Damage the player took.
    pub damage_taken: u64,
    /// Player attacks resolved.
    pub player_attacks: u32,
    /// Monster attacks resolved.
    pub monster_attacks: u32,
    /// Attacks that missed the defender's stance.
    pub misses: u32,
    /// Attacks that could not be executed from the attacker's stance.
    pub noacts: u32,
    /// Monsters defeated.
    pub monsters_defeated: u32,
    /// Final battle state hash (for determinism validation).
    pub final_state_hash: u64,
    /// Full narration log, when recorded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub narration: Vec<String>,
}

impl BattleMetrics {
    /// Create an empty metrics record.
    #[must_use]
    pub fn new(encounter: impl Into<String>, seed: u64, policy: PlayerPolicy) -> Self {
        Self {
            encounter: encounter.into(),
            seed,
            policy,
            result: RunResult::Timeout,
            ticks: 0,
            experience: 0,
            levels_gained: 0,
            hp_start: 0,
            hp_end: 0,
            damage_dealt: 0,
            damage_taken: 0,
            player_attacks: 0,
            monster_attacks: 0,
            misses: 0,
            noacts: 0,
            monsters_defeated: 0,
            final_state_hash: 0,
            narration: Vec::new(),
        }
    }

    /// Fold one structured event into the counters.
    pub fn record_event(&mut self, event: &BattleEvent) {
        match event {
            BattleEvent::Attack {
                attacker, outcome, ..
            } => {
                let damage = u64::from(outcome.effective);
                if *attacker == CombatantId::PLAYER {
                    self.player_attacks += 1;
                    self.damage_dealt += damage;
                } else {
                    self.monster_attacks += 1;
                    self.damage_taken += damage;
                }
                match outcome.special {
                    Some(Special::Miss) => self.misses += 1,
                    Some(Special::NoAct) => self.noacts += 1,
                    None => {}
                }
            }
            BattleEvent::MonsterDefeated { .. } => self.monsters_defeated += 1,
            BattleEvent::StanceChanged { .. }
            | BattleEvent::TargetChanged { .. }
            | BattleEvent::Ended { .. } => {}
        }
    }

    /// Fold a tick report into the counters.
    pub fn record_report(&mut self, report: &TickReport, keep_narration: bool) {
        self.ticks = report.tick;
        self.hp_end = report.player_resources.hp;
        for event in &report.events {
            self.record_event(event);
        }
        if keep_narration {
            self.narration.extend(report.narration.iter().cloned());
        }
    }
}

/// Summary statistics across many battles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total battles run.
    pub total_runs: u32,
    /// Player wins.
    pub wins: u32,
    /// Player losses.
    pub losses: u32,
    /// Runs that hit the tick limit.
    pub timeouts: u32,
    /// Wins over total runs.
    pub win_rate: f64,
    /// Average battle length in ticks.
    pub avg_ticks: f64,
    /// Shortest battle.
    pub min_ticks: u64,
    /// Longest battle.
    pub max_ticks: u64,
    /// Average player hit points left at the end.
    pub avg_hp_remaining: f64,
    /// Total damage dealt by the player.
    pub total_damage_dealt: u64,
    /// Total damage taken by the player.
    pub total_damage_taken: u64,
    /// Total misses.
    pub misses: u32,
    /// Total attacks that could not be executed.
    pub noacts: u32,
}

impl BatchSummary {
    /// Calculate a summary from individual runs.
    #[must_use]
    pub fn from_runs(runs: &[BattleMetrics]) -> Self {
        if runs.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_runs: runs.len() as u32,
            min_ticks: u64::MAX,
            ..Self::default()
        };

        let mut tick_sum = 0u64;
        let mut hp_sum = 0i64;
        for run in runs {
            match run.result {
                RunResult::Win => summary.wins += 1,
                RunResult::Lose => summary.losses += 1,
                RunResult::Timeout => summary.timeouts += 1,
            }
            tick_sum += run.ticks;
            hp_sum += i64::from(run.hp_end);
            summary.min_ticks = summary.min_ticks.min(run.ticks);
            summary.max_ticks = summary.max_ticks.max(run.ticks);
            summary.total_damage_dealt += run.damage_dealt;
            summary.total_damage_taken += run.damage_taken;
            summary.misses += run.misses;
            summary.noacts += run.noacts;
        }

        let count = runs.len() as f64;
        summary.win_rate = f64::from(summary.wins) / count;
        summary.avg_ticks = tick_sum as f64 / count;
        summary.avg_hp_remaining = hp_sum as f64 / count;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(result: RunResult, ticks: u64, hp_end: i32) -> BattleMetrics {
        BattleMetrics {
            result,
            ticks,
            hp_end,
            damage_dealt: 10,
            misses: 1,
            ..BattleMetrics::new("test", 0, PlayerPolicy::Steady)
        }
    }

    #[test]
    fn test_summary_from_runs() {
        let summary = BatchSummary::from_runs(&[
            run(RunResult::Win, 40, 80),
            run(RunResult::Lose, 60, 0),
            run(RunResult::Timeout, 100, 40),
            run(RunResult::Win, 20, 120),
        ]);
        assert_eq!(summary.total_runs, 4);
        assert_eq!((summary.wins, summary.losses, summary.timeouts), (2, 1, 1));
        assert!((summary.win_rate - 0.5).abs() < f64::EPSILON);
        assert!((summary.avg_ticks - 55.0).abs() < f64::EPSILON);
        assert_eq!((summary.min_ticks, summary.max_ticks), (20, 100));
        assert!((summary.avg_hp_remaining - 60.0).abs() < f64::EPSILON);
        assert_eq!(summary.total_damage_dealt, 40);
        assert_eq!(summary.misses, 4);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(BatchSummary::from_runs(&[]), BatchSummary::default());
    }

    #[test]
    fn test_run_result_from_battle_result() {
        assert_eq!(RunResult::from(Some(BattleResult::Win)), RunResult::Win);
        assert_eq!(RunResult::from(None), RunResult::Timeout);
    }
}
