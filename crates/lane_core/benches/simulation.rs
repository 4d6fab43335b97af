//! Simulation benchmarks for lane_core.
//!
//! Run with: `cargo bench -p lane_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use lane_core::archetype::ArchetypeId;
use lane_core::bot::Difficulty;
use lane_core::components::Side;
use lane_core::math::Vec2Fixed;
use lane_core::simulation::{Match, PlayerSetup};

fn bot_match(seed: u64) -> Match {
    let mut game = Match::with_defaults(
        "bench",
        vec![
            PlayerSetup::bot("left", Side::Left, Difficulty::Hard),
            PlayerSetup::bot("right", Side::Right, Difficulty::Hard),
        ],
        seed,
    )
    .expect("bench match");
    game.start();
    game
}

/// A crowded lane: every archetype on both sides, close enough to fight.
fn melee_crowd() -> Match {
    let mut game = bot_match(1);
    for (i, archetype) in ArchetypeId::ALL.iter().enumerate() {
        let y = 120 + 16 * i as i32;
        game.place_unit(Side::Left, *archetype, Vec2Fixed::from_ints(440, y));
        game.place_unit(Side::Right, *archetype, Vec2Fixed::from_ints(560, y));
    }
    game
}

/// Runs simulation benchmarks for the lane_core crate.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("bot_vs_bot_1000_ticks", |b| {
        b.iter_batched(
            || bot_match(7),
            |mut game| {
                for _ in 0..1000 {
                    black_box(game.tick());
                }
                game
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("crowded_lane_tick", |b| {
        b.iter_batched(
            melee_crowd,
            |mut game| black_box(game.tick()),
            BatchSize::SmallInput,
        )
    });

    let mut game = bot_match(3);
    for _ in 0..2000 {
        game.tick();
    }
    c.bench_function("state_hash", |b| b.iter(|| black_box(game.state_hash())));
    c.bench_function("take_snapshot", |b| {
        b.iter_batched(
            || game.clone(),
            |mut g| black_box(g.take_snapshot()),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
