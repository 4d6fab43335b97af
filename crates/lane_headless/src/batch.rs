//! Many seeds at once, for balance checks.
//!
//! Games are independent, so each seed runs on its own rayon worker and the
//! results are gathered back in seed order.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use lane_core::bot::Difficulty;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, GameMetrics};
use crate::runner::{run_game, GameConfig, DEFAULT_MAX_TICKS};

/// What to play.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Games in the batch.
    pub game_count: u32,
    /// Worker threads; 0 leaves rayon's choice.
    pub parallel_games: u32,
    /// Starting seed; game `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Tick limit per game.
    pub max_ticks: u64,
    /// Left bot difficulty.
    pub left: Difficulty,
    /// Right bot difficulty.
    pub right: Difficulty,
    /// Results file, if any.
    pub output: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            parallel_games: 0,
            seed_start: 0,
            max_ticks: DEFAULT_MAX_TICKS,
            left: Difficulty::Normal,
            right: Difficulty::Normal,
            output: None,
        }
    }
}

impl BatchConfig {
    /// `game_count` games with default settings.
    pub fn new(game_count: u32) -> Self {
        Self {
            game_count,
            ..Default::default()
        }
    }

    /// First seed of the batch.
    pub fn starting_at(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Bot difficulties for both sides.
    pub fn with_difficulties(mut self, left: Difficulty, right: Difficulty) -> Self {
        self.left = left;
        self.right = right;
        self
    }

    fn game_config(&self, seed: u64) -> GameConfig {
        GameConfig {
            seed,
            max_ticks: self.max_ticks,
            left: self.left,
            right: self.right,
            ..GameConfig::default()
        }
    }
}

/// A game that could not be played.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Seed of the failed game
    pub seed: u64,
    /// What went wrong
    pub message: String,
}

/// Everything a batch produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Settings the batch ran with.
    pub config: BatchConfig,
    /// Per-game metrics in seed order.
    pub games: Vec<GameMetrics>,
    /// Win rates and durations.
    pub summary: BatchSummary,
    /// Wall-clock time.
    pub duration_seconds: f64,
    /// Games that failed to start.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Write pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = std::io::BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer_pretty(file, self).map_err(std::io::Error::other)
    }

    /// Read results written by [`BatchResults::save`].
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let file = std::io::BufReader::new(std::fs::File::open(path)?);
        serde_json::from_reader(file).map_err(std::io::Error::other)
    }
}

/// Play every game of the batch.
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let clock = Instant::now();
    let finished = AtomicU32::new(0);

    info!(
        games = config.game_count,
        left = %config.left,
        right = %config.right,
        "starting batch"
    );

    if config.parallel_games > 0 {
        // The global pool can only be built once per process.
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
        {
            debug!(error = %e, "keeping existing thread pool");
        }
    }

    let outcomes: Vec<Result<GameMetrics, BatchError>> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            let outcome = run_game(&config.game_config(seed))
                .map(|result| result.metrics)
                .map_err(|e| BatchError {
                    seed,
                    message: e.to_string(),
                });

            let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 10 == 0 {
                debug!(done, total = config.game_count, "batch progress");
            }
            if let Err(e) = &outcome {
                warn!(seed, error = %e.message, "game failed");
            }
            outcome
        })
        .collect();

    let mut games = Vec::with_capacity(outcomes.len());
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(metrics) => games.push(metrics),
            Err(error) => errors.push(error),
        }
    }

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = clock.elapsed().as_secs_f64();
    info!(
        played = games.len(),
        failed = errors.len(),
        secs = format!("{duration_seconds:.1}"),
        "batch finished"
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Verify determinism by running the same seed several times.
pub fn verify_determinism(seed: u64, runs: u32, max_ticks: u64) -> bool {
    let config = GameConfig {
        seed,
        max_ticks,
        ..GameConfig::default()
    };
    let hashes: Vec<u64> = (0..runs)
        .into_par_iter()
        .filter_map(|_| run_game(&config).ok())
        .map(|result| result.metrics.final_state_hash)
        .collect();

    hashes.len() == runs as usize && hashes.windows(2).all(|w| w[0] == w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_batch() -> BatchConfig {
        BatchConfig {
            max_ticks: 1500,
            ..BatchConfig::new(6).starting_at(100)
        }
    }

    #[test]
    fn batch_runs_every_seed_in_order() {
        let played = run_batch(small_batch());
        assert_eq!(played.errors.len(), 0);
        let seeds: Vec<u64> = played.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, (100..106).collect::<Vec<_>>());
        let s = &played.summary;
        assert_eq!(s.total_games, 6);
        assert_eq!(s.left_wins + s.right_wins + s.draws, 6);
    }

    #[test]
    fn batches_are_reproducible() {
        let a = run_batch(small_batch());
        let b = run_batch(small_batch());
        assert_eq!(a.games, b.games);
    }

    #[test]
    fn saved_results_load_back() {
        let scratch = tempfile::tempdir().unwrap();
        let file = scratch.path().join("nested").join("batch.json");
        let played = run_batch(BatchConfig {
            max_ticks: 200,
            ..BatchConfig::new(2)
        });
        played.save(&file).unwrap();
        assert_eq!(BatchResults::load(&file).unwrap().games, played.games);
    }

    #[test]
    fn difficulties_reach_every_game() {
        let played = run_batch(BatchConfig {
            max_ticks: 100,
            ..BatchConfig::new(3).with_difficulties(Difficulty::Hard, Difficulty::Easy)
        });
        assert!(played
            .games
            .iter()
            .all(|g| g.left.difficulty == Difficulty::Hard && g.right.difficulty == Difficulty::Easy));
    }

    #[test]
    fn determinism_check_passes() {
        assert!(verify_determinism(77, 3, 1000));
    }
}
