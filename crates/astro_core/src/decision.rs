//! The monster AI hook.
//!
//! Every tick the battle asks each living monster's [`Decision`] what to do,
//! once with `old_action_done == false`, and once more with
//! `old_action_done == true` right after the monster attacks. A decision
//! returns an optional [`DecisionUpdate`]; see [`apply_decision`] for how
//! omitted fields are filled in.
//!
//! Decisions must not hide state in captured variables. Per-monster memory
//! lives in the monster's [`Scratch`] slots, which the battle passes in by
//! reference.

use std::collections::BTreeMap;

use crate::attack::Attack;
use crate::combatant::{Combatant, Stance};
use crate::rng::RandomSource;

/// Read-only view of the battle handed to a decision.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    /// The deciding monster.
    pub me: &'a Combatant,
    /// The player's battle snapshot.
    pub player: &'a Combatant,
    /// All monsters in the battle, including `me`.
    pub monsters: &'a [Combatant],
    /// Current tick number (1-based; 0 while the battle is being set up).
    pub tick: u64,
    /// Whether `me` just finished its previous action.
    pub old_action_done: bool,
}

/// A partial update to a monster's plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionUpdate {
    /// New stance.
    pub stance: Option<Stance>,
    /// New countdown.
    pub countdown: Option<i32>,
    /// New queued attack.
    pub attack: Option<Attack>,
    /// A line to narrate immediately.
    pub narration: Option<String>,
}

impl DecisionUpdate {
    /// Builder method to set the stance.
    #[must_use]
    pub fn with_stance(mut self, stance: Stance) -> Self {
        self.stance = Some(stance);
        self
    }

    /// Builder method to set the countdown.
    #[must_use]
    pub fn with_countdown(mut self, countdown: i32) -> Self {
        self.countdown = Some(countdown);
        self
    }

    /// Builder method to queue an attack.
    #[must_use]
    pub fn with_attack(mut self, attack: Attack) -> Self {
        self.attack = Some(attack);
        self
    }

    /// Builder method to emit narration.
    #[must_use]
    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = Some(narration.into());
        self
    }
}

/// Named numeric slots a decision uses to remember things across ticks.
///
/// Unset slots read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scratch {
    slots: BTreeMap<String, i64>,
}

impl Scratch {
    /// Read a slot.
    #[must_use]
    pub fn get(&self, slot: &str) -> i64 {
        self.slots.get(slot).copied().unwrap_or(0)
    }

    /// Write a slot.
    pub fn set(&mut self, slot: &str, value: i64) {
        self.slots.insert(slot.to_string(), value);
    }

    /// Add to a slot and return the new value.
    pub fn add(&mut self, slot: &str, delta: i64) -> i64 {
        let value = self.slots.entry(slot.to_string()).or_insert(0);
        *value += delta;
        *value
    }

    /// Reset a slot to zero.
    pub fn clear(&mut self, slot: &str) {
        self.slots.remove(slot);
    }

    /// Whether a slot holds a nonzero value.
    #[must_use]
    pub fn is_set(&self, slot: &str) -> bool {
        self.get(slot) != 0
    }
}

/// Per-tick AI for a non-player combatant.
pub trait Decision: Send + Sync {
    /// Choose an update, or `None` to keep the default behavior.
    fn decide(
        &self,
        ctx: &DecisionContext<'_>,
        scratch: &mut Scratch,
        rng: &mut dyn RandomSource,
    ) -> Option<DecisionUpdate>;
}

impl<F> Decision for F
where
    F: Fn(&DecisionContext<'_>, &mut Scratch, &mut dyn RandomSource) -> Option<DecisionUpdate>
        + Send
        + Sync,
{
    fn decide(
        &self,
        ctx: &DecisionContext<'_>,
        scratch: &mut Scratch,
        rng: &mut dyn RandomSource,
    ) -> Option<DecisionUpdate> {
        self(ctx, scratch, rng)
    }
}

/// Apply a decision's update to a combatant and return its narration.
///
/// When the old action completed, omitted fields fall back to the defaults:
/// the unarmed attack, `default_countdown`, and [`Stance::Fight`]. When it
/// did not, omitted fields are left untouched so a multi-tick windup stays
/// in flight.
pub fn apply_decision(
    combatant: &mut Combatant,
    update: Option<DecisionUpdate>,
    old_action_done: bool,
    default_countdown: i32,
) -> Option<String> {
    let update = update.unwrap_or_default();
    if old_action_done {
        combatant.stance = update.stance.unwrap_or(Stance::Fight);
        combatant.countdown = update.countdown.unwrap_or(default_countdown);
        combatant.next_attack = update.attack;
    } else {
        if let Some(stance) = update.stance {
            combatant.stance = stance;
        }
        if let Some(countdown) = update.countdown {
            combatant.countdown = countdown;
        }
        if let Some(attack) = update.attack {
            combatant.next_attack = Some(attack);
        }
    }
    update.narration
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::MonsterSpec;
    use crate::combatant::CombatantId;
    use crate::stats::StatBlock;

    fn monster() -> Combatant {
        let base = StatBlock {
            hp: 10,
            off: 5,
            def: 5,
            psy: 5,
            ..StatBlock::ZERO
        };
        Combatant::monster(CombatantId(1), &MonsterSpec::new("Mite", base, 5))
    }

    fn windup(monster: &mut Combatant) {
        monster.stance = Stance::Duck;
        monster.countdown = 7;
        monster.next_attack = Some(Attack::unarmed().with_narration("Swipe!"));
    }

    #[test]
    fn test_none_on_completion_resets_to_defaults() {
        let mut m = monster();
        windup(&mut m);
        let narration = apply_decision(&mut m, None, true, 10);
        assert_eq!(narration, None);
        assert_eq!(m.stance(), Stance::Fight);
        assert_eq!(m.countdown(), 10);
        assert!(m.next_attack().is_none());
    }

    #[test]
    fn test_none_mid_action_changes_nothing() {
        let mut m = monster();
        windup(&mut m);
        apply_decision(&mut m, None, false, 10);
        assert_eq!(m.stance(), Stance::Duck);
        assert_eq!(m.countdown(), 7);
        assert!(m.next_attack().is_some());
    }

    #[test]
    fn test_partial_update_mid_action_keeps_omitted_fields() {
        let mut m = monster();
        windup(&mut m);
        let update = DecisionUpdate::default()
            .with_stance(Stance::Guard)
            .with_narration("The mite hunkers down.");
        let narration = apply_decision(&mut m, Some(update), false, 10);
        assert_eq!(narration.as_deref(), Some("The mite hunkers down."));
        assert_eq!(m.stance(), Stance::Guard);
        assert_eq!(m.countdown(), 7);
        assert!(m.next_attack().is_some());
    }

    #[test]
    fn test_partial_update_on_completion_defaults_omitted_fields() {
        let mut m = monster();
        windup(&mut m);
        let update = DecisionUpdate::default().with_countdown(3);
        apply_decision(&mut m, Some(update), true, 10);
        assert_eq!(m.stance(), Stance::Fight);
        assert_eq!(m.countdown(), 3);
        assert!(m.next_attack().is_none());
    }

    #[test]
    fn test_scratch_slots() {
        let mut scratch = Scratch::default();
        assert_eq!(scratch.get("windup"), 0);
        assert!(!scratch.is_set("windup"));
        scratch.set("windup", 1);
        assert!(scratch.is_set("windup"));
        assert_eq!(scratch.add("count", 2), 2);
        assert_eq!(scratch.add("count", 3), 5);
        scratch.clear("windup");
        assert_eq!(scratch.get("windup"), 0);
    }
}
