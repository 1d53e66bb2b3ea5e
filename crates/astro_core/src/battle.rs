//! The tick-driven battle orchestrator.
//!
//! A [`Battle`] owns the player's snapshot and every monster. The enclosing
//! application calls [`Battle::tick`] once per world-clock tick; between
//! ticks it may only read state or go through the mutation entry points
//! ([`Battle::set_player_stance`], [`Battle::set_target`]), which take
//! effect on the next tick's attacks.
//!
//! # Tick Order
//!
//! 1. **Player** - count down; at zero attack the current target
//! 2. **Monsters** - for each living monster: count down, decide, and at
//!    zero attack the player and decide again with the action completed
//! 3. **Removal** - remove dead monsters and tally their experience
//! 4. **Terminal check** - player dead is a loss, no monsters is a win
//! 5. **Retarget** - if the target was removed, target the first monster
//!
//! # Example
//!
//! ```
//! use astro_core::battle::{Battle, BattleConfig, BattleTemplate, MonsterSpec};
//! use astro_core::progression::PlayerRecord;
//! use astro_core::rng::GameRng;
//! use astro_core::stats::StatBlock;
//!
//! let mite = StatBlock { hp: 20, off: 8, def: 4, psy: 4, dmg_phy: 1, ..StatBlock::ZERO };
//! let template = BattleTemplate::new(vec![MonsterSpec::new("Bore Mite", mite, 50)]);
//! let player = PlayerRecord::new("Vela");
//! let mut rng = GameRng::new(7);
//!
//! let mut battle = Battle::new(player.combatant(), template, BattleConfig::default(), &mut rng)?;
//! while battle.is_active() {
//!     let report = battle.tick(&mut rng)?;
//!     for line in &report.narration {
//!         println!("{line}");
//!     }
//! }
//! let conclusion = battle.finish()?;
//! println!("{:?}", conclusion.outcome.result);
//! # Ok::<(), astro_core::error::BattleError>(())
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::attack::{resolve_attack, Attack, AttackOutcome, AttackRound, RoundSide, Special};
use crate::combatant::{Combatant, CombatantId, Stance, DEFAULT_COUNTDOWN};
use crate::decision::{apply_decision, Decision, DecisionContext};
use crate::error::{BattleError, Result};
use crate::rng::RandomSource;
use crate::stats::{ResourcePool, StatBlock, Status};

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Countdown every combatant starts with and returns to after acting.
    pub default_countdown: i32,
    /// Append the damage breakdown to attack narration.
    pub debug_narration: bool,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            default_countdown: DEFAULT_COUNTDOWN,
            debug_narration: false,
        }
    }
}

/// A monster entry in a battle template.
#[derive(Clone)]
pub struct MonsterSpec {
    /// Display name (duplicates get letter suffixes in battle).
    pub name: String,
    /// Base stats.
    pub base: StatBlock,
    /// Experience yielded when defeated.
    pub experience: u32,
    /// Status effects the monster starts with.
    pub statuses: Vec<Status>,
    /// AI hook; `None` always uses the default behavior.
    pub decision: Option<Arc<dyn Decision>>,
}

impl fmt::Debug for MonsterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonsterSpec")
            .field("name", &self.name)
            .field("base", &self.base)
            .field("experience", &self.experience)
            .field("statuses", &self.statuses)
            .field("has_decision", &self.decision.is_some())
            .finish()
    }
}

impl MonsterSpec {
    /// Create a monster with default behavior.
    pub fn new(name: impl Into<String>, base: StatBlock, experience: u32) -> Self {
        Self {
            name: name.into(),
            base,
            experience,
            statuses: Vec::new(),
            decision: None,
        }
    }

    /// Builder method to set the AI hook.
    #[must_use]
    pub fn with_decision(mut self, decision: Arc<dyn Decision>) -> Self {
        self.decision = Some(decision);
        self
    }

    /// Builder method to add a starting status effect.
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.statuses.push(status);
        self
    }
}

/// What the world layer should do after a win/lose hook runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookAction {
    /// Narration to display.
    pub narration: Option<String>,
    /// Whether the world's targets and actions need refreshing.
    pub updated: bool,
}

/// Win or lose callback supplied by whoever started the battle.
pub type BattleHook = Arc<dyn Fn(&BattleOutcome) -> HookAction + Send + Sync>;

/// Everything needed to start a battle.
#[derive(Clone)]
pub struct BattleTemplate {
    /// Monsters, in order. Must not be empty.
    pub monsters: Vec<MonsterSpec>,
    /// Experience added to the tally on a win.
    pub bonus_experience: u32,
    /// Runs when the battle is won.
    pub on_win: Option<BattleHook>,
    /// Runs when the battle is lost.
    pub on_lose: Option<BattleHook>,
}

impl fmt::Debug for BattleTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BattleTemplate")
            .field("monsters", &self.monsters)
            .field("bonus_experience", &self.bonus_experience)
            .field("on_win", &self.on_win.is_some())
            .field("on_lose", &self.on_lose.is_some())
            .finish()
    }
}

impl BattleTemplate {
    /// Create a template with no bonus or hooks.
    #[must_use]
    pub fn new(monsters: Vec<MonsterSpec>) -> Self {
        Self {
            monsters,
            bonus_experience: 0,
            on_win: None,
            on_lose: None,
        }
    }

    /// Builder method to set bonus experience.
    #[must_use]
    pub fn with_bonus_experience(mut self, bonus: u32) -> Self {
        self.bonus_experience = bonus;
        self
    }

    /// Builder method to set the win hook.
    #[must_use]
    pub fn on_win(mut self, hook: impl Fn(&BattleOutcome) -> HookAction + Send + Sync + 'static) -> Self {
        self.on_win = Some(Arc::new(hook));
        self
    }

    /// Builder method to set the lose hook.
    #[must_use]
    pub fn on_lose(mut self, hook: impl Fn(&BattleOutcome) -> HookAction + Send + Sync + 'static) -> Self {
        self.on_lose = Some(Arc::new(hook));
        self
    }
}

/// How a finished battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleResult {
    /// Every monster was defeated.
    Win,
    /// The player was defeated.
    Lose,
}

/// Lifecycle of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleState {
    /// Still being fought.
    Active,
    /// Ended in a win.
    Won,
    /// Ended in a loss.
    Lost,
}

impl BattleState {
    /// The result, if terminal.
    #[must_use]
    pub const fn result(self) -> Option<BattleResult> {
        match self {
            BattleState::Active => None,
            BattleState::Won => Some(BattleResult::Win),
            BattleState::Lost => Some(BattleResult::Lose),
        }
    }
}

/// What the world layer receives when a battle ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleOutcome {
    /// Win or lose.
    pub result: BattleResult,
    /// Experience tally, including the bonus on a win.
    pub experience: u32,
    /// The player's ending resources.
    pub resources: ResourcePool,
    /// Ticks the battle lasted.
    pub ticks: u64,
}

/// The outcome plus whatever the matching hook asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleConclusion {
    /// The battle outcome.
    pub outcome: BattleOutcome,
    /// Result of the win or lose hook, if one was supplied.
    pub action: Option<HookAction>,
}

/// Structured record of something that happened in battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// An attack was resolved.
    Attack {
        /// Who attacked.
        attacker: CombatantId,
        /// Who was attacked.
        defender: CombatantId,
        /// Resolution details.
        outcome: AttackOutcome,
    },
    /// A monster was removed from the battle.
    MonsterDefeated {
        /// The monster.
        id: CombatantId,
        /// Its display name.
        name: String,
        /// Experience it yielded.
        experience: u32,
    },
    /// The player changed stance.
    StanceChanged {
        /// The new stance.
        stance: Stance,
    },
    /// The player's target changed.
    TargetChanged {
        /// The new target.
        target: CombatantId,
    },
    /// The battle reached a terminal state.
    Ended {
        /// How it ended.
        result: BattleResult,
    },
}

/// Outbound signals accumulated since they were last taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BattleSignals {
    /// Human-readable event log lines.
    pub narration: Vec<String>,
    /// Structured events.
    pub events: Vec<BattleEvent>,
    /// Whether the target list or action menu needs redrawing.
    pub redraw: bool,
}

impl BattleSignals {
    fn narrate(&mut self, line: impl Into<String>) {
        self.narration.push(line.into());
    }
}

/// Everything the UI needs after a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// The tick just processed (1-based).
    pub tick: u64,
    /// Narration lines, oldest first.
    pub narration: Vec<String>,
    /// Structured events, oldest first.
    pub events: Vec<BattleEvent>,
    /// Whether the target list or action menu needs redrawing.
    pub redraw: bool,
    /// The player's resources after the tick.
    pub player_resources: ResourcePool,
    /// Battle state after the tick.
    pub state: BattleState,
}

/// A live encounter.
pub struct Battle {
    config: BattleConfig,
    player: Combatant,
    monsters: Vec<Combatant>,
    target: CombatantId,
    experience: u32,
    bonus_experience: u32,
    on_win: Option<BattleHook>,
    on_lose: Option<BattleHook>,
    state: BattleState,
    tick: u64,
    unarmed: Attack,
    signals: BattleSignals,
}

impl fmt::Debug for Battle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Battle")
            .field("tick", &self.tick)
            .field("state", &self.state)
            .field("player", &self.player)
            .field("monsters", &self.monsters)
            .field("target", &self.target)
            .field("experience", &self.experience)
            .finish_non_exhaustive()
    }
}

impl Battle {
    /// Start a battle.
    ///
    /// Each monster's decision runs once with the action completed to seed
    /// its opening stance, attack and countdown. Repeated monster names are
    /// made unique (see [`dedupe_names`]). The first monster is targeted.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::NoMonsters`] if the template is empty.
    pub fn new(
        player: Combatant,
        template: BattleTemplate,
        config: BattleConfig,
        rng: &mut dyn RandomSource,
    ) -> Result<Self> {
        if template.monsters.is_empty() {
            return Err(BattleError::NoMonsters);
        }

        let mut player = player;
        player.set_id(CombatantId::PLAYER);
        player.stance = Stance::Fight;
        player.countdown = config.default_countdown;
        player.next_attack = None;

        let mut monsters: Vec<Combatant> = template
            .monsters
            .iter()
            .zip(1u32..)
            .map(|(spec, id)| Combatant::monster(CombatantId(id), spec))
            .collect();

        let mut names: Vec<String> = monsters.iter().map(|m| m.name().to_string()).collect();
        dedupe_names(&mut names);
        for (monster, name) in monsters.iter_mut().zip(names) {
            monster.set_name(name);
        }

        let target = monsters[0].id();
        let mut battle = Self {
            config,
            player,
            monsters,
            target,
            experience: 0,
            bonus_experience: template.bonus_experience,
            on_win: template.on_win,
            on_lose: template.on_lose,
            state: BattleState::Active,
            tick: 0,
            unarmed: Attack::unarmed(),
            signals: BattleSignals::default(),
        };

        for index in 0..battle.monsters.len() {
            if let Some(line) = battle.run_decision(index, true, rng) {
                battle.signals.narrate(line);
            }
        }
        battle.signals.redraw = true;

        info!(
            monsters = battle.monsters.len(),
            bonus_experience = battle.bonus_experience,
            "Battle started"
        );
        Ok(battle)
    }

    /// Advance the battle by one tick.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::BattleOver`] once the battle is terminal.
    pub fn tick(&mut self, rng: &mut dyn RandomSource) -> Result<TickReport> {
        if self.state != BattleState::Active {
            return Err(BattleError::BattleOver);
        }
        self.tick += 1;
        trace!(tick = self.tick, "Battle tick");

        self.player.countdown -= 1;
        if self.player.countdown <= 0 {
            self.player_attack(rng);
            self.player.countdown = self.config.default_countdown;
        }

        for index in 0..self.monsters.len() {
            if !self.monsters[index].is_alive() {
                continue;
            }
            self.monsters[index].countdown -= 1;
            if let Some(line) = self.run_decision(index, false, rng) {
                self.signals.narrate(line);
            }
            if self.monsters[index].countdown <= 0 {
                self.monster_attack(index, rng);
                if let Some(line) = self.run_decision(index, true, rng) {
                    self.signals.narrate(line);
                }
            }
        }

        self.remove_dead();

        if !self.player.is_alive() {
            self.end(BattleResult::Lose);
        } else if self.monsters.is_empty() {
            self.end(BattleResult::Win);
        } else if !self.monsters.iter().any(|m| m.id() == self.target) {
            self.target = self.monsters[0].id();
            self.signals.events.push(BattleEvent::TargetChanged {
                target: self.target,
            });
            self.signals.redraw = true;
        }

        let signals = self.take_signals();
        Ok(TickReport {
            tick: self.tick,
            narration: signals.narration,
            events: signals.events,
            redraw: signals.redraw,
            player_resources: *self.player.resources(),
            state: self.state,
        })
    }

    /// Change the player's stance.
    ///
    /// Returns `false` without emitting anything if the player already holds
    /// that stance.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::BattleOver`] once the battle is terminal.
    pub fn set_player_stance(&mut self, stance: Stance) -> Result<bool> {
        self.ensure_active()?;
        if self.player.stance == stance {
            return Ok(false);
        }
        self.player.stance = stance;
        self.signals.narrate(stance.player_narration());
        self.signals.events.push(BattleEvent::StanceChanged { stance });
        self.signals.redraw = true;
        Ok(true)
    }

    /// Point the player's attacks at another monster.
    ///
    /// Returns `false` if that monster is already the target.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::InvalidTarget`] if `target` is not a living
    /// monster in this battle, or [`BattleError::BattleOver`] once the
    /// battle is terminal.
    pub fn set_target(&mut self, target: CombatantId) -> Result<bool> {
        self.ensure_active()?;
        let valid = self
            .monsters
            .iter()
            .any(|m| m.id() == target && m.is_alive());
        if !valid {
            return Err(BattleError::InvalidTarget(target));
        }
        if self.target == target {
            return Ok(false);
        }
        self.target = target;
        self.signals.events.push(BattleEvent::TargetChanged { target });
        self.signals.redraw = true;
        Ok(true)
    }

    /// Drain the signals accumulated since the last tick.
    pub fn take_signals(&mut self) -> BattleSignals {
        std::mem::take(&mut self.signals)
    }

    /// Signals accumulated since the last tick, without draining them.
    #[must_use]
    pub fn pending_signals(&self) -> &BattleSignals {
        &self.signals
    }

    /// The outcome, once terminal.
    #[must_use]
    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.state.result().map(|result| BattleOutcome {
            result,
            experience: self.experience,
            resources: *self.player.resources(),
            ticks: self.tick,
        })
    }

    /// End the battle: consume it, run the matching hook and return the
    /// outcome for the world layer.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::NotFinished`] while the battle is active.
    pub fn finish(self) -> Result<BattleConclusion> {
        let outcome = self.outcome().ok_or(BattleError::NotFinished)?;
        let hook = match outcome.result {
            BattleResult::Win => self.on_win.as_ref(),
            BattleResult::Lose => self.on_lose.as_ref(),
        };
        let action = hook.map(|hook| hook(&outcome));
        Ok(BattleConclusion { outcome, action })
    }

    /// Whether the battle is still being fought.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == BattleState::Active
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> BattleState {
        self.state
    }

    /// Ticks processed so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// The player's battle snapshot.
    #[must_use]
    pub const fn player(&self) -> &Combatant {
        &self.player
    }

    /// Monsters still in the battle, in template order.
    #[must_use]
    pub fn monsters(&self) -> &[Combatant] {
        &self.monsters
    }

    /// Look up a monster by id.
    #[must_use]
    pub fn monster(&self, id: CombatantId) -> Option<&Combatant> {
        self.monsters.iter().find(|m| m.id() == id)
    }

    /// The monster the player's attacks land on.
    #[must_use]
    pub const fn target(&self) -> CombatantId {
        self.target
    }

    /// Experience tallied so far.
    #[must_use]
    pub const fn experience(&self) -> u32 {
        self.experience
    }

    /// Hash of everything that evolves tick to tick.
    ///
    /// Two battles built from the same inputs and driven by the same draws
    /// hash identically after every tick.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.state.hash(&mut hasher);
        self.experience.hash(&mut hasher);
        self.target.hash(&mut hasher);
        for combatant in std::iter::once(&self.player).chain(&self.monsters) {
            combatant.id().hash(&mut hasher);
            combatant.resources().hash(&mut hasher);
            combatant.stance.hash(&mut hasher);
            combatant.countdown.hash(&mut hasher);
            combatant.next_attack.as_ref().map(|a| &a.name).hash(&mut hasher);
            combatant.scratch.hash(&mut hasher);
        }
        hasher.finish()
    }

    fn ensure_active(&self) -> Result<()> {
        if self.state == BattleState::Active {
            Ok(())
        } else {
            Err(BattleError::BattleOver)
        }
    }

    fn run_decision(
        &mut self,
        index: usize,
        old_action_done: bool,
        rng: &mut dyn RandomSource,
    ) -> Option<String> {
        let update = match self.monsters[index].decision.clone() {
            Some(decision) => {
                let mut scratch = std::mem::take(&mut self.monsters[index].scratch);
                let ctx = DecisionContext {
                    me: &self.monsters[index],
                    player: &self.player,
                    monsters: &self.monsters,
                    tick: self.tick,
                    old_action_done,
                };
                let update = decision.decide(&ctx, &mut scratch, rng);
                self.monsters[index].scratch = scratch;
                update
            }
            None => None,
        };
        apply_decision(
            &mut self.monsters[index],
            update,
            old_action_done,
            self.config.default_countdown,
        )
    }

    fn player_attack(&mut self, rng: &mut dyn RandomSource) {
        let Some(index) = self.monsters.iter().position(|m| m.id() == self.target) else {
            return;
        };
        let attack = self.player.next_attack.as_ref().unwrap_or(&self.unarmed);
        let outcome = {
            let target = &self.monsters[index];
            resolve_attack(
                &AttackRound {
                    attacker: RoundSide {
                        stats: self.player.stats(),
                        stance: self.player.stance,
                    },
                    attack,
                    defender: RoundSide {
                        stats: target.stats(),
                        stance: target.stance,
                    },
                },
                rng,
            )
        };
        let flavor = attack.narration.clone();

        self.monsters[index]
            .resources_mut()
            .take_damage(outcome.effective);

        let target = &self.monsters[index];
        debug!(
            attacker = %self.player.name(),
            defender = %target.name(),
            total = outcome.base.total,
            effective = outcome.effective,
            special = ?outcome.special,
            "Player attack resolved"
        );
        let line = match outcome.special {
            None => format!(
                "You attack {} and deliver {} damage!",
                target.name(),
                outcome.effective
            ),
            Some(Special::Miss) => format!("You attack {}, but miss!", target.name()),
            Some(Special::NoAct) => "You cannot attack from where you are.".to_string(),
        };
        let defender = target.id();
        self.narrate_attack(line, &outcome, flavor);
        self.signals.events.push(BattleEvent::Attack {
            attacker: CombatantId::PLAYER,
            defender,
            outcome,
        });
    }

    fn monster_attack(&mut self, index: usize, rng: &mut dyn RandomSource) {
        let monster = &self.monsters[index];
        let attack = monster.next_attack.as_ref().unwrap_or(&self.unarmed);
        let outcome = resolve_attack(
            &AttackRound {
                attacker: RoundSide {
                    stats: monster.stats(),
                    stance: monster.stance,
                },
                attack,
                defender: RoundSide {
                    stats: self.player.stats(),
                    stance: self.player.stance,
                },
            },
            rng,
        );
        let flavor = attack.narration.clone();
        let name = monster.name().to_string();
        let attacker = monster.id();

        self.player.resources_mut().take_damage(outcome.effective);

        debug!(
            attacker = %name,
            defender = %self.player.name(),
            total = outcome.base.total,
            effective = outcome.effective,
            special = ?outcome.special,
            "Monster attack resolved"
        );
        let line = match outcome.special {
            None => format!("{name} attacks and delivers {} damage!", outcome.effective),
            Some(Special::Miss) => format!("{name} attacks, but misses!"),
            Some(Special::NoAct) => format!("{name} hesitates."),
        };
        self.narrate_attack(line, &outcome, flavor);
        self.signals.events.push(BattleEvent::Attack {
            attacker,
            defender: CombatantId::PLAYER,
            outcome,
        });
    }

    fn narrate_attack(&mut self, line: String, outcome: &AttackOutcome, flavor: Option<String>) {
        let line = if self.config.debug_narration {
            format!("{line} {}", describe_outcome(outcome))
        } else {
            line
        };
        self.signals.narrate(line);
        if outcome.special != Some(Special::NoAct) {
            if let Some(flavor) = flavor {
                self.signals.narrate(flavor);
            }
        }
    }

    fn remove_dead(&mut self) {
        let (living, dead): (Vec<Combatant>, Vec<Combatant>) = std::mem::take(&mut self.monsters)
            .into_iter()
            .partition(Combatant::is_alive);
        self.monsters = living;

        for monster in dead {
            self.experience += monster.experience();
            self.signals.narrate(format!("{} dies!", monster.name()));
            self.signals.events.push(BattleEvent::MonsterDefeated {
                id: monster.id(),
                name: monster.name().to_string(),
                experience: monster.experience(),
            });
            self.signals.redraw = true;
        }
    }

    fn end(&mut self, result: BattleResult) {
        match result {
            BattleResult::Win => {
                self.experience += self.bonus_experience;
                self.state = BattleState::Won;
                self.signals.narrate("You are victorious!");
            }
            BattleResult::Lose => {
                self.state = BattleState::Lost;
                self.signals.narrate("You have been defeated.");
            }
        }
        self.signals.events.push(BattleEvent::Ended { result });
        self.signals.redraw = true;
        info!(
            ?result,
            ticks = self.tick,
            experience = self.experience,
            hp = self.player.resources().hp,
            "Battle ended"
        );
    }
}

fn describe_outcome(outcome: &AttackOutcome) -> String {
    format!(
        "(phy {} / ele {} / mys {} / psy {} = {}, in {:?}, against {:?}, preliminary {})",
        outcome.base.phy,
        outcome.base.ele,
        outcome.base.mys,
        outcome.base.psy,
        outcome.base.total,
        outcome.power_in,
        outcome.power_against,
        outcome.preliminary,
    )
}

/// Letter suffix for the `n`th duplicate: A..Z, then AA, AB, ...
fn letter_suffix(mut n: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(char::from(b'A' + (n % 26) as u8));
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Make repeated names unique.
///
/// The first occurrence of a name keeps it bare. Later occurrences are
/// lettered from the back: the last one gets `A`, the one before it `B`,
/// and so on. `["Bat", "Bat", "Bat"]` becomes `["Bat", "Bat B", "Bat A"]`.
/// A suffixed name that is already in the list is skipped, so
/// `["Bat", "Bat", "Bat A"]` becomes `["Bat", "Bat B", "Bat A"]`.
pub fn dedupe_names(names: &mut [String]) {
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    for (index, name) in names.iter().enumerate() {
        first_seen.entry(name.clone()).or_insert(index);
    }
    let mut taken: HashSet<String> = first_seen.keys().cloned().collect();

    let mut lettered: HashMap<String, usize> = HashMap::new();
    for index in (0..names.len()).rev() {
        let first = first_seen.get(&names[index]).copied().unwrap_or(index);
        if first == index {
            continue;
        }
        let count = lettered.entry(names[index].clone()).or_insert(0);
        let renamed = loop {
            let candidate = format!("{} {}", names[index], letter_suffix(*count));
            *count += 1;
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        taken.insert(renamed.clone());
        names[index] = renamed;
    }
}
