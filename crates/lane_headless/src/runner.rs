//! Single bot-vs-bot game runner.

use lane_core::archetype::ArchetypeTable;
use lane_core::bot::Difficulty;
use lane_core::components::Side;
use lane_core::config::MatchConfig;
use lane_core::error::Result;
use lane_core::simulation::{Match, PlayerSetup};
use tracing::{debug, info};

use crate::metrics::GameMetrics;

/// Default tick limit: 30 minutes of game time.
pub const DEFAULT_MAX_TICKS: u64 = 30 * 60 * lane_core::simulation::TICK_RATE as u64;

/// Configuration for one game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Match seed.
    pub seed: u64,
    /// Tick limit; the game is a draw when reached.
    pub max_ticks: u64,
    /// Left bot difficulty.
    pub left: Difficulty,
    /// Right bot difficulty.
    pub right: Difficulty,
    /// Match geometry and economy.
    pub match_config: MatchConfig,
    /// Archetype balance table.
    pub table: ArchetypeTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_ticks: DEFAULT_MAX_TICKS,
            left: Difficulty::Normal,
            right: Difficulty::Normal,
            match_config: MatchConfig::default(),
            table: ArchetypeTable::standard(),
        }
    }
}

/// Outcome of one game.
#[derive(Debug, Clone)]
pub struct GameResult {
    /// Collected metrics.
    pub metrics: GameMetrics,
    /// The match in its final state.
    pub game: Match,
}

/// Play one game to a win or the tick limit.
///
/// # Errors
///
/// Fails only if the match cannot be created from the config.
pub fn run_game(config: &GameConfig) -> Result<GameResult> {
    let game_id = format!("game_{}", config.seed);
    let mut game = Match::new(
        game_id.clone(),
        vec![
            PlayerSetup::bot("left_bot", Side::Left, config.left),
            PlayerSetup::bot("right_bot", Side::Right, config.right),
        ],
        config.match_config,
        config.table.clone(),
        config.seed,
    )?;
    game.start();

    let mut metrics = GameMetrics::new(game_id, config.seed);
    metrics.left.difficulty = config.left;
    metrics.right.difficulty = config.right;

    while game.current_tick() < config.max_ticks {
        let events = game.tick();
        // Nothing renders headless games.
        game.drain_events();
        for id in &events.spawned {
            if let Some(unit) = game.field().unit(*id) {
                metrics.side_mut(unit.side).record_spawn(unit.archetype.name());
            }
        }
        if events.winner.is_some() {
            break;
        }
    }

    metrics.duration_ticks = game.current_tick();
    metrics.winner = game.winner();
    for side in Side::BOTH {
        let health = game.field().base(side).health;
        metrics.side_mut(side).absorb(game.stats().side(side), health);
    }
    metrics.final_state_hash = game.state_hash();

    match metrics.winner {
        Some(winner) => info!(seed = config.seed, %winner, ticks = metrics.duration_ticks, "game finished"),
        None => debug!(seed = config.seed, ticks = metrics.duration_ticks, "tick limit reached"),
    }

    Ok(GameResult { metrics, game })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_game() {
        let config = GameConfig {
            seed: 21,
            max_ticks: 3000,
            ..GameConfig::default()
        };
        let a = run_game(&config).unwrap();
        let b = run_game(&config).unwrap();
        assert_eq!(a.metrics, b.metrics);
    }

    #[test]
    fn spawns_match_the_counters() {
        let config = GameConfig {
            seed: 5,
            max_ticks: 4000,
            left: Difficulty::Hard,
            right: Difficulty::Hard,
            ..GameConfig::default()
        };
        let result = run_game(&config).unwrap();
        for side in [&result.metrics.left, &result.metrics.right] {
            let counted: u32 = side.spawns_by_archetype.values().sum();
            assert_eq!(counted, side.units_spawned);
        }
        assert!(result.metrics.duration_ticks <= 4000);
    }

    #[test]
    fn visual_events_do_not_pile_up() {
        let config = GameConfig {
            seed: 8,
            max_ticks: 3000,
            left: Difficulty::Hard,
            right: Difficulty::Hard,
            ..GameConfig::default()
        };
        let result = run_game(&config).unwrap();
        assert!(result.metrics.left.units_spawned > 0);
        assert!(result.game.field().pending_events().is_empty());
    }

    #[test]
    fn tick_limit_is_a_draw() {
        let config = GameConfig {
            max_ticks: 10,
            ..GameConfig::default()
        };
        let result = run_game(&config).unwrap();
        assert_eq!(result.metrics.duration_ticks, 10);
        assert_eq!(result.metrics.winner, None);
        assert_eq!(result.metrics.left.final_base_health, 1000);
    }
}
