//! Game metrics collection for balance analysis.

use std::collections::BTreeMap;

use lane_core::bot::Difficulty;
use lane_core::components::Side;
use lane_core::stats::SideStats;
use serde::{Deserialize, Serialize};

/// Per-side results of one game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideMetrics {
    /// Bot difficulty driving the side.
    pub difficulty: Difficulty,
    /// Units placed on the field.
    pub units_spawned: u32,
    /// Units killed.
    pub units_lost: u32,
    /// Damage dealt to the enemy base.
    pub base_damage_dealt: i64,
    /// Own base health at the end.
    pub final_base_health: i32,
    /// Units spawned per archetype name.
    pub spawns_by_archetype: BTreeMap<String, u32>,
}

impl SideMetrics {
    /// Copy the match counters in.
    pub fn absorb(&mut self, stats: &SideStats, final_base_health: i32) {
        self.units_spawned = stats.units_spawned;
        self.units_lost = stats.units_lost;
        self.base_damage_dealt = stats.base_damage_dealt;
        self.final_base_health = final_base_health;
    }

    /// Record one spawned unit.
    pub fn record_spawn(&mut self, archetype: &str) {
        *self.spawns_by_archetype.entry(archetype.to_string()).or_insert(0) += 1;
    }
}

/// Complete metrics for a single game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Random seed used.
    pub seed: u64,
    /// Total game duration in ticks.
    pub duration_ticks: u64,
    /// Winning side (None = tick limit reached).
    pub winner: Option<Side>,
    /// Left side.
    pub left: SideMetrics,
    /// Right side.
    pub right: SideMetrics,
    /// Final state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Create a new game metrics instance.
    #[must_use]
    pub fn new(game_id: impl Into<String>, seed: u64) -> Self {
        Self {
            game_id: game_id.into(),
            seed,
            ..Default::default()
        }
    }

    /// Metrics of one side.
    pub fn side_mut(&mut self, side: Side) -> &mut SideMetrics {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// Aggregate over a batch of games.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total games played.
    pub total_games: u32,
    /// Games won by the left side.
    pub left_wins: u32,
    /// Games won by the right side.
    pub right_wins: u32,
    /// Games that hit the tick limit.
    pub draws: u32,
    /// Left win rate.
    pub left_win_rate: f64,
    /// Right win rate.
    pub right_win_rate: f64,
    /// Average game duration in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest game.
    pub min_duration_ticks: u64,
    /// Longest game.
    pub max_duration_ticks: u64,
    /// Average units spawned per game, left.
    pub avg_left_units: f64,
    /// Average units spawned per game, right.
    pub avg_right_units: f64,
}

impl BatchSummary {
    /// Calculate summary from a list of game metrics.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let total = games.len() as f64;
        let mut summary = Self {
            total_games: games.len() as u32,
            min_duration_ticks: u64::MAX,
            ..Default::default()
        };

        let mut duration_sum = 0u64;
        let mut left_units = 0u64;
        let mut right_units = 0u64;
        for game in games {
            match game.winner {
                Some(Side::Left) => summary.left_wins += 1,
                Some(Side::Right) => summary.right_wins += 1,
                None => summary.draws += 1,
            }
            duration_sum += game.duration_ticks;
            summary.min_duration_ticks = summary.min_duration_ticks.min(game.duration_ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(game.duration_ticks);
            left_units += u64::from(game.left.units_spawned);
            right_units += u64::from(game.right.units_spawned);
        }

        summary.left_win_rate = f64::from(summary.left_wins) / total;
        summary.right_win_rate = f64::from(summary.right_wins) / total;
        summary.avg_duration_ticks = duration_sum as f64 / total;
        summary.avg_left_units = left_units as f64 / total;
        summary.avg_right_units = right_units as f64 / total;
        summary
    }
}
