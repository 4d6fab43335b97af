//! Test fixtures and helpers.
//!
//! Pre-built matches and unit placements for consistent testing. Fixture
//! players are named after their side: `"left"` and `"right"`.

use fixed::types::I32F32;
use lane_core::archetype::{ArchetypeId, ArchetypeTable};
use lane_core::bot::Difficulty;
use lane_core::components::{PlayerId, Side, UnitId};
use lane_core::config::MatchConfig;
use lane_core::math::Vec2Fixed;
use lane_core::simulation::{Match, PlayerSetup};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Position from integer coordinates.
#[must_use]
pub fn pos(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// Id of the fixture player on `side`.
#[must_use]
pub fn player_on(side: Side) -> PlayerId {
    PlayerId::from(match side {
        Side::Left => "left",
        Side::Right => "right",
    })
}

/// Builder for test matches.
#[derive(Debug, Clone)]
pub struct MatchBuilder {
    seed: u64,
    config: MatchConfig,
    table: ArchetypeTable,
    left: Option<Difficulty>,
    right: Option<Difficulty>,
    start: bool,
}

impl Default for MatchBuilder {
    fn default() -> Self {
        Self {
            seed: 0,
            config: MatchConfig::default(),
            table: ArchetypeTable::standard(),
            left: None,
            right: None,
            start: true,
        }
    }
}

impl MatchBuilder {
    /// Two humans, default config, started.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Replace the config.
    #[must_use]
    pub fn config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the archetype table.
    #[must_use]
    pub fn table(mut self, table: ArchetypeTable) -> Self {
        self.table = table;
        self
    }

    /// Seat a bot on `side` instead of a human.
    #[must_use]
    pub fn bot(mut self, side: Side, difficulty: Difficulty) -> Self {
        match side {
            Side::Left => self.left = Some(difficulty),
            Side::Right => self.right = Some(difficulty),
        }
        self
    }

    /// Leave the match waiting.
    #[must_use]
    pub fn unstarted(mut self) -> Self {
        self.start = false;
        self
    }

    /// Build the match.
    ///
    /// # Panics
    ///
    /// Panics if the config is invalid.
    #[must_use]
    pub fn build(self) -> Match {
        let setups = [(Side::Left, self.left), (Side::Right, self.right)]
            .into_iter()
            .map(|(side, bot)| {
                let id = player_on(side).0;
                match bot {
                    Some(difficulty) => PlayerSetup::bot(id, side, difficulty),
                    None => PlayerSetup::human(id, side),
                }
            })
            .collect();
        let mut game = Match::new("test", setups, self.config, self.table, self.seed)
            .expect("fixture match should be valid");
        if self.start {
            game.start();
        }
        game
    }
}

/// Started match between two humans.
#[must_use]
pub fn human_duel(seed: u64) -> Match {
    MatchBuilder::new().seed(seed).build()
}

/// Started match between two hard bots.
#[must_use]
pub fn bot_duel(seed: u64) -> Match {
    MatchBuilder::new()
        .seed(seed)
        .bot(Side::Left, Difficulty::Hard)
        .bot(Side::Right, Difficulty::Hard)
        .build()
}

/// Place a unit at integer coordinates.
pub fn place(game: &mut Match, side: Side, archetype: ArchetypeId, x: i32, y: i32) -> UnitId {
    game.place_unit(side, archetype, pos(x, y))
}

/// Current health of a unit, or `None` once it has been swept.
#[must_use]
pub fn health_of(game: &Match, id: UnitId) -> Option<i32> {
    game.field().unit(id).map(|unit| unit.health)
}

/// Tick until `done` holds or `limit` ticks pass. Returns the ticks run.
pub fn tick_until(game: &mut Match, limit: u64, mut done: impl FnMut(&Match) -> bool) -> u64 {
    for ran in 0..limit {
        if done(game) {
            return ran;
        }
        game.tick();
    }
    limit
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_core::victory::MatchStatus;

    #[test]
    fn builder_seats_both_sides() {
        let game = MatchBuilder::new().bot(Side::Right, Difficulty::Easy).build();
        assert_eq!(game.status(), MatchStatus::Active);
        assert_eq!(game.players().len(), 2);
        assert!(game.player(&player_on(Side::Right)).unwrap().is_bot());
        assert!(!game.player(&player_on(Side::Left)).unwrap().is_bot());
    }

    #[test]
    fn unstarted_builder_waits() {
        let game = MatchBuilder::new().unstarted().build();
        assert_eq!(game.status(), MatchStatus::Waiting);
    }

    #[test]
    fn place_puts_unit_where_asked() {
        let mut game = human_duel(0);
        let id = place(&mut game, Side::Left, ArchetypeId::Knight, 400, 210);
        assert_eq!(game.field().unit(id).unwrap().position, pos(400, 210));
        assert_eq!(health_of(&game, id), Some(320));
    }
}
