//! Battle-local combatants.
//!
//! A [`Combatant`] is a snapshot owned by a battle: the player's copy is
//! taken when the battle starts and handed back when it ends, monsters are
//! built from their [`MonsterSpec`]. Current stats are always derived from
//! base stats plus the active modifier set.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::attack::Attack;
use crate::battle::MonsterSpec;
use crate::decision::{Decision, Scratch};
use crate::error::BattleError;
use crate::stats::{apply_modifiers, ResourcePool, StatBlock, StatsMod, Status};

/// Countdown a combatant starts with and returns to after acting.
pub const DEFAULT_COUNTDOWN: i32 = 10;

/// Tactical posture.
///
/// Affects both the effectiveness of the combatant's own attacks and of
/// attacks against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    /// Squared up, ready to strike.
    #[default]
    Fight,
    /// Braced behind a guard.
    Guard,
    /// Stepped to the left.
    Left,
    /// Stepped to the right.
    Right,
    /// Backed off.
    Back,
    /// Low to the ground.
    Duck,
}

impl Stance {
    /// All stances in menu order.
    pub const ALL: [Stance; 6] = [
        Stance::Fight,
        Stance::Guard,
        Stance::Left,
        Stance::Right,
        Stance::Back,
        Stance::Duck,
    ];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Stance::Fight => "fight",
            Stance::Guard => "guard",
            Stance::Left => "left",
            Stance::Right => "right",
            Stance::Back => "back",
            Stance::Duck => "duck",
        }
    }

    /// Narration for the player moving into this stance.
    #[must_use]
    pub const fn player_narration(self) -> &'static str {
        match self {
            Stance::Fight => "You assume a fighting position.",
            Stance::Guard => "You assume a guarding position.",
            Stance::Left => "You move to the left.",
            Stance::Right => "You move to the right.",
            Stance::Back => "You move back.",
            Stance::Duck => "You get low to the ground.",
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stance {
    type Err = BattleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stance::ALL
            .iter()
            .copied()
            .find(|stance| stance.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BattleError::UnknownStance(s.to_string()))
    }
}

/// Stable identifier of a combatant within one battle.
///
/// The player is always [`CombatantId::PLAYER`]; monsters are numbered from
/// 1 in template order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(pub u32);

impl CombatantId {
    /// The player's id.
    pub const PLAYER: Self = Self(0);
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which side a combatant fights on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatantKind {
    /// The player character.
    Player,
    /// A monster.
    Monster,
}

/// A participant in a battle.
#[derive(Clone)]
pub struct Combatant {
    id: CombatantId,
    name: String,
    kind: CombatantKind,
    base: StatBlock,
    modifiers: Vec<StatsMod>,
    statuses: Vec<Status>,
    stats: StatBlock,
    resources: ResourcePool,
    pub(crate) stance: Stance,
    pub(crate) countdown: i32,
    pub(crate) next_attack: Option<Attack>,
    pub(crate) decision: Option<Arc<dyn Decision>>,
    pub(crate) scratch: Scratch,
    experience: u32,
}

impl fmt::Debug for Combatant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Combatant")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("stats", &self.stats)
            .field("resources", &self.resources)
            .field("stance", &self.stance)
            .field("countdown", &self.countdown)
            .field("next_attack", &self.next_attack.as_ref().map(|a| &a.name))
            .field("has_decision", &self.decision.is_some())
            .finish_non_exhaustive()
    }
}

impl Combatant {
    /// Build the player's battle snapshot.
    ///
    /// `modifiers` are persistent modifiers such as worn equipment;
    /// `statuses` are removable status effects. Resources are clamped to the
    /// calculated capacities.
    pub fn player(
        name: impl Into<String>,
        base: StatBlock,
        modifiers: Vec<StatsMod>,
        statuses: Vec<Status>,
        resources: ResourcePool,
    ) -> Self {
        let mut combatant = Self {
            id: CombatantId::PLAYER,
            name: name.into(),
            kind: CombatantKind::Player,
            base,
            modifiers,
            statuses,
            stats: base,
            resources,
            stance: Stance::Fight,
            countdown: DEFAULT_COUNTDOWN,
            next_attack: None,
            decision: None,
            scratch: Scratch::default(),
            experience: 0,
        };
        combatant.recalculate();
        combatant
    }

    /// Build a monster from its spec, at full resources.
    #[must_use]
    pub fn monster(id: CombatantId, spec: &MonsterSpec) -> Self {
        let stats = apply_modifiers(spec.base, spec.statuses.iter().map(|s| &s.modifier));
        Self {
            id,
            name: spec.name.clone(),
            kind: CombatantKind::Monster,
            base: spec.base,
            modifiers: Vec::new(),
            statuses: spec.statuses.clone(),
            stats,
            resources: stats.capacity(),
            stance: Stance::Fight,
            countdown: DEFAULT_COUNTDOWN,
            next_attack: None,
            decision: spec.decision.clone(),
            scratch: Scratch::default(),
            experience: spec.experience,
        }
    }

    /// Recompute current stats from base and modifiers, then lower resources
    /// that exceed the new capacities.
    pub fn recalculate(&mut self) {
        let mods = self
            .modifiers
            .iter()
            .chain(self.statuses.iter().map(|s| &s.modifier));
        self.stats = apply_modifiers(self.base, mods);
        self.resources.clamp_to(&self.stats);
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

    /// Identifier within the battle.
    #[must_use]
    pub const fn id(&self) -> CombatantId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: CombatantId) {
        self.id = id;
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Player or monster.
    #[must_use]
    pub const fn kind(&self) -> CombatantKind {
        self.kind
    }

    /// Base stats.
    #[must_use]
    pub const fn base(&self) -> &StatBlock {
        &self.base
    }

    /// Current (calculated) stats.
    #[must_use]
    pub const fn stats(&self) -> &StatBlock {
        &self.stats
    }

    /// Current resources.
    #[must_use]
    pub const fn resources(&self) -> &ResourcePool {
        &self.resources
    }

    pub(crate) fn resources_mut(&mut self) -> &mut ResourcePool {
        &mut self.resources
    }

    /// Active status effects.
    #[must_use]
    pub fn statuses(&self) -> &[Status] {
        &self.statuses
    }

    /// Current stance.
    #[must_use]
    pub const fn stance(&self) -> Stance {
        self.stance
    }

    /// Ticks until this combatant next acts.
    #[must_use]
    pub const fn countdown(&self) -> i32 {
        self.countdown
    }

    /// The queued attack, `None` meaning the default unarmed attack.
    #[must_use]
    pub const fn next_attack(&self) -> Option<&Attack> {
        self.next_attack.as_ref()
    }

    /// Scratch slots owned by this combatant's decision.
    #[must_use]
    pub const fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    /// Experience yielded when defeated (monsters only).
    #[must_use]
    pub const fn experience(&self) -> u32 {
        self.experience
    }

    /// Whether hit points remain.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.resources.is_defeated()
    }
}
