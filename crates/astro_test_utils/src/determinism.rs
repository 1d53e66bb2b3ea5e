//! Replay checks for battles.
//!
//! A battle rebuilt from the same template, player snapshot and seed has to
//! narrate and end the same way every time. Saved games and headless
//! balance numbers both depend on that.
//!
//! Things that would break it, and what rules them out here:
//!
//! - Float drift in damage rolls: formulas run on [`astro_core::math::Fixed`].
//! - Unordered containers: monsters stay in template order and decision
//!   scratch slots live in a `BTreeMap`.
//! - Ambient randomness: every draw comes from an injected
//!   [`astro_core::rng::RandomSource`].
//!
//! The helpers below cover single-process replays, tick-by-tick divergence
//! hunting and replays on separate threads. Proptest strategies for the
//! engine's inputs live in [`strategies`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use astro_core::battle::Battle;
use astro_core::rng::GameRng;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the battle was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance the state by one tick
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// A battle together with the generator driving it.
#[derive(Debug)]
pub struct SeededBattle {
    /// The battle.
    pub battle: Battle,
    /// The generator every draw comes from.
    pub rng: GameRng,
}

impl SeededBattle {
    /// Tick once if the battle is still active.
    pub fn step(&mut self) {
        if self.battle.is_active() {
            // Only fails on a finished battle, which is checked above.
            let _ = self.battle.tick(&mut self.rng);
        }
    }

    /// Battle state hash.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.battle.state_hash()
    }
}

/// Run the same seeded battle twice and check the final hashes match.
pub fn verify_battle_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> SeededBattle,
{
    verify_determinism(2, num_ticks, &setup_fn, SeededBattle::step, SeededBattle::state_hash)
        .is_deterministic
}

/// Compare two battle runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs are identical, `Some(tick)` if they diverge at that
/// tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> SeededBattle,
{
    let mut run1 = setup_fn();
    let mut run2 = setup_fn();

    if run1.state_hash() != run2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        run1.step();
        run2.step();

        if run1.state_hash() != run2.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Run N battles on scoped threads and collect their final hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_battles<F>(setup_fn: F, num_battles: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> SeededBattle + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_battles)
            .map(|_| {
                s.spawn(|| {
                    let mut run = setup_fn();
                    for _ in 0..num_ticks {
                        run.step();
                    }
                    run.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for engine inputs.
///
/// These strategies generate random but reproducible stat blocks and
/// stances for property-based testing.
pub mod strategies {
    use astro_core::combatant::Stance;
    use astro_core::stats::{StatBlock, StatsMod};
    use proptest::prelude::*;

    /// Any of the six stances.
    pub fn arb_stance() -> impl Strategy<Value = Stance> {
        prop::sample::select(Stance::ALL.to_vec())
    }

    /// A plausible combatant stat block.
    ///
    /// Resources and core attributes are positive; damage ratings are
    /// non-negative; resistances may be negative (vulnerability).
    pub fn arb_stat_block() -> impl Strategy<Value = StatBlock> {
        (
            (1i32..2000, 0i32..300, 0i32..200),
            (1i32..40, 1i32..40, 1i32..40),
            (0i32..20, 0i32..20, 0i32..20, 0i32..20),
            (-10i32..10, -10i32..10, -10i32..10, -10i32..10),
        )
            .prop_map(
                |((hp, mp, pp), (off, def, psy), (dp, de, dm, ds), (rp, re, rm, rs))| StatBlock {
                    hp,
                    mp,
                    pp,
                    off,
                    def,
                    psy,
                    dmg_phy: dp,
                    dmg_ele: de,
                    dmg_mys: dm,
                    dmg_psy: ds,
                    res_phy: rp,
                    res_ele: re,
                    res_mys: rm,
                    res_psy: rs,
                },
            )
    }

    /// Any stat block, including values no clamped block can hold.
    pub fn arb_wild_stat_block() -> impl Strategy<Value = StatBlock> {
        prop::collection::vec(-1000i32..1000, 14).prop_map(|v| StatBlock {
            hp: v[0],
            mp: v[1],
            pp: v[2],
            off: v[3],
            def: v[4],
            psy: v[5],
            dmg_phy: v[6],
            dmg_ele: v[7],
            dmg_mys: v[8],
            dmg_psy: v[9],
            res_phy: v[10],
            res_ele: v[11],
            res_mys: v[12],
            res_psy: v[13],
        })
    }

    /// A stat modifier with optional percentage and flat parts.
    pub fn arb_stats_mod() -> impl Strategy<Value = StatsMod> {
        (
            prop::option::of(arb_wild_stat_block()),
            prop::option::of(arb_wild_stat_block()),
        )
            .prop_map(|(add_percent, add)| StatsMod { add_percent, add })
    }

    /// A uniform draw in `[0, 1)`.
    pub fn arb_draw() -> impl Strategy<Value = f64> {
        0.0f64..1.0
    }

    /// A short script of uniform draws.
    pub fn arb_draws() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(arb_draw(), 1..16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{level_one_player, plain_monster};
    use astro_core::battle::{BattleConfig, BattleTemplate};
    use astro_core::bestiary::{gnasher, row_house_hole};
    use proptest::prelude::*;

    fn row_house(seed: u64) -> SeededBattle {
        let mut rng = GameRng::new(seed);
        let battle = Battle::new(level_one_player(), row_house_hole(), BattleConfig::default(), &mut rng)
            .expect("template has monsters");
        SeededBattle { battle, rng }
    }

    fn gnasher_den(seed: u64) -> SeededBattle {
        let mut rng = GameRng::new(seed);
        let template = BattleTemplate::new(vec![gnasher(), plain_monster("Rat", 12)]);
        let battle = Battle::new(level_one_player(), template, BattleConfig::default(), &mut rng)
            .expect("template has monsters");
        SeededBattle { battle, rng }
    }

    #[test]
    fn test_row_house_is_deterministic() {
        assert!(verify_battle_determinism(|| row_house(42), 300));
    }

    #[test]
    fn test_no_divergence_with_windups() {
        assert_eq!(find_first_divergence(|| gnasher_den(7), 300), None);
    }

    #[test]
    fn test_parallel_battles_match() {
        let result = run_parallel_battles(|| row_house(1234), 4, 300);
        result.assert_deterministic();
        assert_eq!(result.unique_hashes().len(), 1);
    }

    #[test]
    fn test_different_seeds_usually_differ() {
        let hashes: Vec<u64> = (0..8)
            .map(|seed| {
                let mut run = row_house(seed);
                for _ in 0..60 {
                    run.step();
                }
                run.state_hash()
            })
            .collect();
        let result = DeterminismResult {
            is_deterministic: false,
            hashes,
            ticks: 60,
        };
        assert!(result.unique_hashes().len() > 1);
    }

    #[test]
    fn test_compute_hash_is_stable() {
        assert_eq!(compute_hash(&(1u32, "mite")), compute_hash(&(1u32, "mite")));
    }

    proptest! {
        /// Any seed replays identically.
        #[test]
        fn prop_any_seed_is_replayable(seed in any::<u64>()) {
            prop_assert!(verify_battle_determinism(|| gnasher_den(seed), 120));
        }
    }
}
