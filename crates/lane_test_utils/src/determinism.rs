//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! Two matches built from the same seed, config and spawn script must hash
//! identically after every tick. Sources of non-determinism include:
//!
//! - **Floating-point math**: the simulation uses fixed-point arithmetic via
//!   [`lane_core::math::Fixed`]; floats only appear in snapshots.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Units are always processed in sorted id order.
//!
//! - **System randomness**: spawn jitter and bot decisions draw from the
//!   match's seeded [`lane_core::rng::SimRng`].
//!
//! - **Wall clock**: cooldowns and channels compare tick counters only.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use lane_core::components::{PlayerId, Tick};
use lane_core::simulation::Match;

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
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
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

/// One scripted spawn request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnOrder {
    /// Tick before which the request is issued.
    pub tick: Tick,
    /// Requesting player.
    pub player: PlayerId,
    /// Archetype name as a client would send it.
    pub archetype: String,
}

impl SpawnOrder {
    /// Create an order.
    pub fn new(tick: Tick, player: &str, archetype: &str) -> Self {
        Self {
            tick,
            player: PlayerId::from(player),
            archetype: archetype.to_string(),
        }
    }
}

/// Issue the orders due at the current tick, then advance one tick.
///
/// Rejected orders are ignored, as the server does.
pub fn step_with_script(game: &mut Match, script: &[SpawnOrder]) {
    let now = game.current_tick();
    for order in script.iter().filter(|order| order.tick == now) {
        let _ = game.request_spawn(&order.player, &order.archetype);
    }
    game.tick();
}

/// Run `setup` several times and verify the final states match.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of ticks per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance by one tick
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

/// Run a scripted match twice and compare the final hashes.
///
/// # Example
///
/// ```ignore
/// use lane_test_utils::determinism::{verify_match_determinism, SpawnOrder};
/// use lane_test_utils::fixtures::human_duel;
///
/// let script = vec![SpawnOrder::new(0, "left", "soldier")];
/// verify_match_determinism(|| human_duel(7), &script, 600).assert_deterministic();
/// ```
pub fn verify_match_determinism<F>(setup_fn: F, script: &[SpawnOrder], ticks: u64) -> DeterminismResult
where
    F: Fn() -> Match,
{
    verify_determinism(
        2,
        ticks,
        setup_fn,
        |game| step_with_script(game, script),
        Match::state_hash,
    )
}

/// Run N matches on scoped threads and collect their final hashes.
///
/// Catches non-determinism that only shows up under different memory
/// layouts or hasher seeds.
pub fn run_parallel_matches<F>(setup_fn: F, num_matches: usize, ticks: u64) -> DeterminismResult
where
    F: Fn() -> Match + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_matches)
            .map(|_| {
                s.spawn(|| {
                    let mut game = setup_fn();
                    for _ in 0..ticks {
                        game.tick();
                    }
                    game.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("match thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks,
    }
}

/// Compare two scripted runs tick by tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree, `Some(tick)` if they diverge at that tick.
pub fn find_first_divergence<F>(setup_fn: F, script: &[SpawnOrder], ticks: u64) -> Option<u64>
where
    F: Fn() -> Match,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for tick in 1..=ticks {
        step_with_script(&mut first, script);
        step_with_script(&mut second, script);

        if first.state_hash() != second.state_hash() {
            tracing::warn!(tick, "matches diverged");
            return Some(tick);
        }
    }

    None
}

/// Verify that a serialization round-trip preserves match state exactly,
/// and that the restored match keeps evolving identically.
pub fn verify_serialization_determinism<F>(setup_fn: F, ticks: u64) -> bool
where
    F: Fn() -> Match,
{
    let mut game = setup_fn();
    for _ in 0..ticks {
        game.tick();
    }

    let Ok(bytes) = game.serialize() else {
        return false;
    };
    let Ok(mut restored) = Match::deserialize(&bytes) else {
        return false;
    };
    if restored.state_hash() != game.state_hash() {
        return false;
    }

    for _ in 0..ticks {
        game.tick();
        restored.tick();
    }
    restored.state_hash() == game.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for scripted matches.
pub mod strategies {
    use lane_core::archetype::ArchetypeId;
    use lane_core::components::Tick;
    use proptest::prelude::*;

    use super::SpawnOrder;

    /// Any archetype.
    pub fn arb_archetype() -> impl Strategy<Value = ArchetypeId> {
        proptest::sample::select(ArchetypeId::ALL.to_vec())
    }

    /// A spawn order from one of the fixture players within `max_tick`.
    pub fn arb_spawn_order(max_tick: Tick) -> impl Strategy<Value = SpawnOrder> {
        (
            0..max_tick,
            prop_oneof![Just("left"), Just("right")],
            arb_archetype(),
        )
            .prop_map(|(tick, player, archetype)| SpawnOrder::new(tick, player, archetype.name()))
    }

    /// A script of up to `max_len` orders.
    pub fn arb_script(max_len: usize, max_tick: Tick) -> impl Strategy<Value = Vec<SpawnOrder>> {
        prop::collection::vec(arb_spawn_order(max_tick), 0..max_len)
    }

    /// A match seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{bot_duel, human_duel};

    #[test]
    fn scripted_duel_is_deterministic() {
        let script = vec![
            SpawnOrder::new(0, "left", "soldier"),
            SpawnOrder::new(0, "right", "archer"),
            SpawnOrder::new(100, "left", "healer"),
            SpawnOrder::new(150, "right", "mage"),
        ];
        verify_match_determinism(|| human_duel(11), &script, 400).assert_deterministic();
        assert_eq!(find_first_divergence(|| human_duel(11), &script, 400), None);
    }

    #[test]
    fn parallel_bot_matches_agree() {
        run_parallel_matches(|| bot_duel(5), 4, 300).assert_deterministic();
    }

    #[test]
    fn serialization_round_trip_keeps_evolving() {
        assert!(verify_serialization_determinism(|| bot_duel(9), 200));
    }

    #[test]
    fn seeds_change_outcomes() {
        let a = verify_determinism(1, 500, || bot_duel(1), |g| { g.tick(); }, Match::state_hash);
        let b = verify_determinism(1, 500, || bot_duel(2), |g| { g.tick(); }, Match::state_hash);
        assert_ne!(a.hashes, b.hashes);
    }
}
