//! Headless match runner for balance testing and CI verification.
//!
//! Plays bot-vs-bot matches with no network attached:
//!
//! - **Single games**: one seed, a JSON summary on stdout
//! - **Batches**: many seeds in parallel, aggregated win rates
//! - **Determinism checks**: the same seed several times, hashes compared
//!
//! # Example
//!
//! ```bash
//! cargo run -p lane_headless -- run --seed 7 --left hard --right easy
//! cargo run -p lane_headless -- batch --count 200 --output results/batch.json
//! cargo run -p lane_headless -- verify --seed 12345 --runs 5
//! ```

pub mod batch;
pub mod metrics;
pub mod runner;
