//! Data-driven monster behaviours and built-in content.
//!
//! A [`Behavior`] is plain data (it deserializes from RON) that implements
//! [`Decision`]. Content files pick a behaviour and tune its numbers; the
//! battle never needs to know which one it is running.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::attack::{Attack, PowerAgainst, PowerIn, StanceTable};
use crate::battle::{BattleTemplate, MonsterSpec};
use crate::combatant::Stance;
use crate::data::MonsterData;
use crate::decision::{Decision, DecisionContext, DecisionUpdate, Scratch};
use crate::math::Fixed;
use crate::rng::RandomSource;
use crate::stats::StatBlock;

/// Scratch slot a [`Behavior::Brute`] uses to remember a windup in flight.
pub const WINDUP_SLOT: &str = "windup";

/// How a monster picks its actions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Behavior {
    /// Always the default: fight stance, unarmed attack, default countdown.
    #[default]
    Steady,

    /// Nervous and noisy. Only decides when an action completes.
    Skittish {
        /// Probability of guarding for the next action.
        guard_chance: f64,
        /// Probability of chattering instead.
        chatter_chance: f64,
        /// Chatter line; `{name}` is replaced with the monster's name.
        chatter: String,
    },

    /// Winds up telegraphed heavy attacks.
    Brute {
        /// Probability of guarding after an action completes.
        guard_chance: f64,
        /// Per-tick probability of starting a windup.
        windup_chance: f64,
        /// Countdown set when a windup starts.
        windup_ticks: i32,
        /// Line announcing the windup; `{name}` is replaced.
        tell: String,
        /// The attack queued by the windup.
        claw: Attack,
    },

    /// Fixed overrides applied every time an action completes.
    Scripted {
        /// Stance override.
        #[serde(default)]
        stance: Option<Stance>,
        /// Countdown override.
        #[serde(default)]
        countdown: Option<i32>,
        /// Attack override.
        #[serde(default)]
        attack: Option<Attack>,
    },
}

impl Behavior {
    /// The behaviour as a shareable decision, `None` for [`Behavior::Steady`].
    #[must_use]
    pub fn into_decision(self) -> Option<Arc<dyn Decision>> {
        match self {
            Behavior::Steady => None,
            other => Some(Arc::new(other)),
        }
    }
}

impl Decision for Behavior {
    fn decide(
        &self,
        ctx: &DecisionContext<'_>,
        scratch: &mut Scratch,
        rng: &mut dyn RandomSource,
    ) -> Option<DecisionUpdate> {
        match self {
            Behavior::Steady => None,

            Behavior::Skittish {
                guard_chance,
                chatter_chance,
                chatter,
            } => {
                if !ctx.old_action_done {
                    return None;
                }
                let r = rng.ratio();
                if r < Fixed::from_num(*guard_chance) {
                    Some(DecisionUpdate::default().with_stance(Stance::Guard))
                } else if r < Fixed::from_num(guard_chance + chatter_chance) {
                    Some(DecisionUpdate::default().with_narration(chatter.replace("{name}", ctx.me.name())))
                } else {
                    None
                }
            }

            Behavior::Brute {
                guard_chance,
                windup_chance,
                windup_ticks,
                tell,
                claw,
            } => {
                if ctx.old_action_done {
                    scratch.clear(WINDUP_SLOT);
                    return rng
                        .chance(*guard_chance)
                        .then(|| DecisionUpdate::default().with_stance(Stance::Guard));
                }
                if scratch.is_set(WINDUP_SLOT) || !rng.chance(*windup_chance) {
                    return None;
                }
                scratch.set(WINDUP_SLOT, 1);
                Some(
                    DecisionUpdate::default()
                        .with_stance(Stance::Fight)
                        .with_countdown(*windup_ticks)
                        .with_attack(claw.clone())
                        .with_narration(tell.replace("{name}", ctx.me.name())),
                )
            }

            Behavior::Scripted {
                stance,
                countdown,
                attack,
            } => {
                if !ctx.old_action_done {
                    return None;
                }
                Some(DecisionUpdate {
                    stance: *stance,
                    countdown: *countdown,
                    attack: attack.clone(),
                    narration: None,
                })
            }
        }
    }
}

/// A raking two-handed claw: double power, but only lands on a defender
/// standing square or backing off.
#[must_use]
pub fn claw() -> Attack {
    Attack {
        name: "Claw".to_string(),
        power_in: StanceTable {
            fight: PowerIn::Percent(200),
            guard: PowerIn::CannotAct,
            left: PowerIn::Percent(150),
            right: PowerIn::Percent(150),
            back: PowerIn::CannotAct,
            duck: PowerIn::Percent(100),
        },
        power_against: StanceTable {
            fight: PowerAgainst::Percent(200),
            guard: PowerAgainst::Percent(50),
            left: PowerAgainst::Miss,
            right: PowerAgainst::Miss,
            back: PowerAgainst::Percent(100),
            duck: PowerAgainst::Miss,
        },
        narration: Some("Claws rake through the air!".to_string()),
    }
}

/// The Bore Mite behaviour.
#[must_use]
pub fn bore_mite_behavior() -> Behavior {
    Behavior::Skittish {
        guard_chance: 0.15,
        chatter_chance: 0.15,
        chatter: "{name} lets out a series of clicks.".to_string(),
    }
}

/// A small burrowing pest, as content.
#[must_use]
pub fn bore_mite_data() -> MonsterData {
    MonsterData {
        name: "Bore Mite".to_string(),
        experience: 50,
        base: StatBlock {
            hp: 50,
            off: 10,
            def: 6,
            psy: 6,
            dmg_phy: 2,
            ..StatBlock::ZERO
        },
        statuses: Vec::new(),
        behavior: bore_mite_behavior(),
    }
}

/// A small burrowing pest.
#[must_use]
pub fn bore_mite() -> MonsterSpec {
    bore_mite_data().to_spec()
}

/// The Gnasher behaviour.
#[must_use]
pub fn gnasher_behavior() -> Behavior {
    Behavior::Brute {
        guard_chance: 0.1,
        windup_chance: 0.2,
        windup_ticks: 4,
        tell: "{name} rears back, claws raised.".to_string(),
        claw: claw(),
    }
}

/// A hulking tunnel predator that telegraphs its heavy swings, as content.
#[must_use]
pub fn gnasher_data() -> MonsterData {
    MonsterData {
        name: "Gnasher".to_string(),
        experience: 120,
        base: StatBlock {
            hp: 90,
            off: 14,
            def: 10,
            psy: 5,
            dmg_phy: 4,
            res_phy: 1,
            ..StatBlock::ZERO
        },
        statuses: Vec::new(),
        behavior: gnasher_behavior(),
    }
}

/// A hulking tunnel predator that telegraphs its heavy swings.
#[must_use]
pub fn gnasher() -> MonsterSpec {
    gnasher_data().to_spec()
}

/// The hole in the row house floor: two Bore Mites.
#[must_use]
pub fn row_house_hole() -> BattleTemplate {
    BattleTemplate::new(vec![bore_mite(), bore_mite()])
}
