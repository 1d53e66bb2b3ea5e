//! Scripted player policies for headless playtesting.
//!
//! A policy stands in for the human at the keyboard: before every tick it
//! may change the player's stance or target, exactly as the UI would.

use std::fmt;
use std::str::FromStr;

use astro_core::battle::Battle;
use astro_core::combatant::{Combatant, Stance};
use astro_core::error::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Countdown at or below which [`PlayerPolicy::Guarded`] braces.
pub const GUARD_THRESHOLD: i32 = 2;

/// How the automated player behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlayerPolicy {
    /// Always fight, always hit the default target.
    #[default]
    Steady,
    /// Guard while any monster is about to act, fight otherwise.
    Guarded,
    /// Fight, always hitting the monster with the fewest hit points.
    Weakest,
}

impl PlayerPolicy {
    /// All policies.
    pub const ALL: [PlayerPolicy; 3] = [PlayerPolicy::Steady, PlayerPolicy::Guarded, PlayerPolicy::Weakest];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PlayerPolicy::Steady => "steady",
            PlayerPolicy::Guarded => "guarded",
            PlayerPolicy::Weakest => "weakest",
        }
    }

    /// Make this tick's choices.
    pub fn act(self, battle: &mut Battle) -> Result<()> {
        match self {
            PlayerPolicy::Steady => {
                battle.set_player_stance(Stance::Fight)?;
            }
            PlayerPolicy::Guarded => {
                let threatened = battle
                    .monsters()
                    .iter()
                    .any(|m| m.is_alive() && m.countdown() <= GUARD_THRESHOLD);
                let stance = if threatened { Stance::Guard } else { Stance::Fight };
                battle.set_player_stance(stance)?;
            }
            PlayerPolicy::Weakest => {
                battle.set_player_stance(Stance::Fight)?;
                let weakest = battle
                    .monsters()
                    .iter()
                    .filter(|m| m.is_alive())
                    .min_by_key(|m| (m.resources().hp, m.id()))
                    .map(Combatant::id);
                if let Some(id) = weakest {
                    if let Err(e) = battle.set_target(id) {
                        warn!(monster = %id, error = %e, "Policy picked an invalid target");
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for PlayerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PlayerPolicy::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown policy '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astro_core::battle::BattleConfig;
    use astro_core::combatant::CombatantId;
    use astro_core::rng::SequenceRng;
    use astro_test_utils::fixtures::{level_one_player, plain_monster, start_battle};

    fn battle() -> Battle {
        let mut rng = SequenceRng::constant(0.0);
        start_battle(
            level_one_player(),
            vec![plain_monster("Rat", 40), plain_monster("Bat", 20)],
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn test_weakest_retargets() {
        let mut battle = battle();
        PlayerPolicy::Weakest.act(&mut battle).unwrap();
        assert_eq!(battle.target(), CombatantId(2));
    }

    #[test]
    fn test_guarded_braces_before_monster_acts() {
        let mut battle = battle();
        let mut rng = SequenceRng::constant(0.0);
        PlayerPolicy::Guarded.act(&mut battle).unwrap();
        assert_eq!(battle.player().stance(), Stance::Fight);

        for _ in 0..8 {
            battle.tick(&mut rng).unwrap();
        }
        PlayerPolicy::Guarded.act(&mut battle).unwrap();
        assert_eq!(battle.player().stance(), Stance::Guard);
        assert_eq!(battle.config(), &BattleConfig::default());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Guarded".parse::<PlayerPolicy>(), Ok(PlayerPolicy::Guarded));
        assert!("berserk".parse::<PlayerPolicy>().is_err());
    }
}
