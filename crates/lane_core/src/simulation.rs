//! The match: players, battlefield and the fixed-order tick.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::archetype::{ArchetypeId, ArchetypeSpec, ArchetypeTable};
use crate::battlefield::Battlefield;
use crate::behavior;
use crate::bot::{BotController, Difficulty};
use crate::components::{PlayerId, Side, Tick, Unit, UnitAction, UnitId, UnitState};
use crate::config::MatchConfig;
use crate::economy::{check_spawn, commit_spawn, Controller, Player, PlayerEconomy};
use crate::error::{GameError, Result, SpawnRejection};
use crate::events::{TickEvents, VisualEvent};
use crate::math::{Fixed, Vec2Fixed};
use crate::projectile;
use crate::rng::SimRng;
use crate::snapshot::Snapshot;
use crate::stats::MatchStats;
use crate::victory::MatchStatus;

/// Simulation ticks per second.
pub const TICK_RATE: u32 = 20;

/// Length of one tick in milliseconds.
pub const TICK_MILLIS: u64 = 1000 / TICK_RATE as u64;

/// A player as announced by the lobby when the match starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Lobby id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Lane side.
    pub side: Side,
    /// Lobby color.
    pub color: String,
    /// Difficulty for bots, `None` for humans.
    pub bot: Option<Difficulty>,
}

impl PlayerSetup {
    /// A human player with an empty color.
    pub fn human(id: impl Into<String>, side: Side) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id: PlayerId(id),
            side,
            color: String::new(),
            bot: None,
        }
    }

    /// A bot player with an empty color.
    pub fn bot(id: impl Into<String>, side: Side, difficulty: Difficulty) -> Self {
        Self {
            bot: Some(difficulty),
            ..Self::human(id, side)
        }
    }
}

/// One running match.
///
/// Each tick runs, in order:
/// 1. **Sweep**: units that died last tick are removed.
/// 2. **Economy**: every player earns its per-tick income.
/// 3. **Bots**: each bot rolls for a spawn.
/// 4. **Units**: every living unit acts, in ascending id order.
/// 5. **Projectiles**: every projectile advances and may resolve.
/// 6. **Win check**: a fallen base ends the match.
///
/// Damage lands immediately: a unit killed earlier in the pass does not act
/// later in it. Once a base falls, the rest of the pass is skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    id: String,
    status: MatchStatus,
    players: Vec<Player>,
    field: Battlefield,
    rng: SimRng,
}

impl Match {
    /// Create a waiting match.
    ///
    /// # Errors
    ///
    /// Fails when a side has no player, a player id repeats, or the config
    /// is invalid.
    pub fn new(
        id: impl Into<String>,
        setups: Vec<PlayerSetup>,
        config: MatchConfig,
        table: ArchetypeTable,
        seed: u64,
    ) -> Result<Self> {
        config.validate()?;
        for side in Side::BOTH {
            if !setups.iter().any(|setup| setup.side == side) {
                return Err(GameError::MissingSide(side));
            }
        }
        let mut seen = HashSet::new();
        for setup in &setups {
            if !seen.insert(setup.id.clone()) {
                return Err(GameError::InvalidState(format!(
                    "player '{}' seated twice",
                    setup.id
                )));
            }
        }

        let players = setups
            .into_iter()
            .map(|setup| {
                let (controller, income) = match setup.bot {
                    Some(difficulty) => (
                        Controller::Bot(BotController::new(difficulty)),
                        difficulty.income_per_tick(),
                    ),
                    None => (Controller::Human, config.human_regen_per_tick),
                };
                Player::new(
                    setup.id,
                    setup.name,
                    setup.side,
                    setup.color,
                    controller,
                    PlayerEconomy::new(config.starting_resource, config.resource_capacity, income),
                )
            })
            .collect();

        Ok(Self {
            id: id.into(),
            status: MatchStatus::Waiting,
            players,
            field: Battlefield::new(config, table),
            rng: SimRng::new(seed),
        })
    }

    /// Create a match with the default config and archetype table.
    ///
    /// # Errors
    ///
    /// See [`Match::new`].
    pub fn with_defaults(id: impl Into<String>, setups: Vec<PlayerSetup>, seed: u64) -> Result<Self> {
        Self::new(id, setups, MatchConfig::default(), ArchetypeTable::standard(), seed)
    }

    /// Start the clock. Only a waiting match can start.
    pub fn start(&mut self) {
        if self.status == MatchStatus::Waiting {
            self.status = MatchStatus::Active;
            info!(match_id = %self.id, players = self.players.len(), "match started");
        }
    }

    /// Match id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> MatchStatus {
        self.status
    }

    /// Current tick.
    #[must_use]
    pub const fn current_tick(&self) -> Tick {
        self.field.now
    }

    /// Battlefield state.
    #[must_use]
    pub const fn field(&self) -> &Battlefield {
        &self.field
    }

    /// Seated players in lobby order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Player by id.
    #[must_use]
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| &player.id == id)
    }

    /// Human players, the snapshot recipients.
    pub fn humans(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|player| !player.is_bot())
    }

    /// A player's current resource.
    #[must_use]
    pub fn resource_of(&self, id: &PlayerId) -> Option<Fixed> {
        self.player(id).map(|player| player.economy.resource)
    }

    /// Winner once the match has ended.
    #[must_use]
    pub const fn winner(&self) -> Option<Side> {
        match self.status {
            MatchStatus::Ended { winner } => Some(winner),
            _ => None,
        }
    }

    /// Per-side counters.
    #[must_use]
    pub const fn stats(&self) -> &MatchStats {
        self.field.stats()
    }

    /// Advance one tick. A match that is not active does nothing.
    pub fn tick(&mut self) -> TickEvents {
        if !self.status.is_active() {
            return TickEvents::default();
        }

        self.field.now += 1;
        self.field.tick_log = TickEvents::default();

        let removed = self.field.registry.remove_dead();
        self.field.tick_log.removed = removed.iter().map(|unit| unit.id).collect();

        for player in &mut self.players {
            player.economy.regenerate();
        }

        self.run_bots();

        for id in self.field.registry.sorted_ids() {
            if self.field.is_over() {
                break;
            }
            behavior::act(&mut self.field, id);
        }

        projectile::advance_all(&mut self.field);

        if let Some(winner) = self.field.winner {
            self.status = MatchStatus::Ended { winner };
            info!(match_id = %self.id, tick = self.field.now, %winner, "match ended");
        }

        #[cfg(feature = "debug-validation")]
        self.validate_invariants();

        if tracing::enabled!(tracing::Level::TRACE) {
            trace!(match_id = %self.id, tick = self.field.now, hash = self.state_hash(), "tick");
        }

        std::mem::take(&mut self.field.tick_log)
    }

    fn run_bots(&mut self) {
        for index in 0..self.players.len() {
            let (bot, economy) = match &self.players[index] {
                Player {
                    controller: Controller::Bot(bot),
                    economy,
                    ..
                } => (*bot, *economy),
                _ => continue,
            };
            let Some(archetype) = bot.decide(&economy, &self.field.table, &mut self.rng) else {
                continue;
            };
            match self.spawn_for(index, archetype) {
                Ok(ids) => self.field.tick_log.spawned.extend(ids),
                Err(reason) => trace!(match_id = %self.id, %reason, "bot spawn rejected"),
            }
        }
    }

    /// Handle a spawn request from a connected human.
    ///
    /// Rejections leave the match untouched.
    ///
    /// # Errors
    ///
    /// Returns the [`SpawnRejection`] that refused the request.
    pub fn request_spawn(
        &mut self,
        player_id: &PlayerId,
        archetype: &str,
    ) -> std::result::Result<Vec<UnitId>, SpawnRejection> {
        let result = self.try_request_spawn(player_id, archetype);
        if let Err(reason) = &result {
            debug!(match_id = %self.id, player = %player_id, archetype, %reason, "spawn rejected");
        }
        result
    }

    fn try_request_spawn(
        &mut self,
        player_id: &PlayerId,
        archetype: &str,
    ) -> std::result::Result<Vec<UnitId>, SpawnRejection> {
        if !self.status.is_active() {
            return Err(SpawnRejection::MatchNotActive);
        }
        let index = self
            .players
            .iter()
            .position(|player| &player.id == player_id)
            .ok_or(SpawnRejection::UnknownPlayer)?;
        if self.players[index].is_bot() {
            return Err(SpawnRejection::BotControlled);
        }
        let archetype = ArchetypeId::from_name(archetype).ok_or(SpawnRejection::UnknownArchetype)?;
        self.spawn_for(index, archetype)
    }

    /// Gate, pay for and place one batch.
    fn spawn_for(
        &mut self,
        index: usize,
        archetype: ArchetypeId,
    ) -> std::result::Result<Vec<UnitId>, SpawnRejection> {
        let now = self.field.now;
        let spec = *self.field.table.get(archetype);
        let player = self
            .players
            .get_mut(index)
            .ok_or(SpawnRejection::UnknownPlayer)?;
        let side = player.side;

        let population = self.field.registry.population(side, archetype);
        let batch = check_spawn(player, &spec, population, now)?;
        if !commit_spawn(player, &spec, now) {
            return Err(SpawnRejection::InsufficientResource(archetype));
        }

        let ids: Vec<UnitId> = (0..batch)
            .map(|slot| {
                let position = self.spawn_position(side, slot);
                self.insert_unit(side, &spec, position)
            })
            .collect();

        self.field.stats.side_mut(side).units_spawned += batch;
        debug!(match_id = %self.id, tick = now, %side, %archetype, batch, "spawned");
        Ok(ids)
    }

    /// Spawn point for the `slot`-th unit of a batch: in front of the base,
    /// staggered toward the enemy, with seeded lateral jitter.
    fn spawn_position(&mut self, side: Side, slot: u32) -> Vec2Fixed {
        let config = self.field.config;
        let base = config.base_position(side);
        let offset =
            config.base_radius + config.spawn_gap + config.spawn_stagger * Fixed::from_num(slot);
        let jitter = self.rng.next_range(-config.spawn_jitter, config.spawn_jitter);
        Vec2Fixed::new(
            base.x + offset * side.facing(),
            config.lane_center_y + Fixed::from_num(jitter),
        )
        .clamp(config.field_min(), config.field_max())
    }

    fn insert_unit(&mut self, side: Side, spec: &ArchetypeSpec, position: Vec2Fixed) -> UnitId {
        self.field.registry.insert_unit(Unit {
            id: 0,
            archetype: spec.id,
            side,
            position,
            health: spec.health,
            last_attack: None,
            action: UnitAction::Idle,
            stunned_until: 0,
            state: UnitState::for_behavior(&spec.behavior),
        })
    }

    /// Place a unit directly, bypassing the spawn gate and economy.
    ///
    /// Scenario tooling and tests use this to set up exact positions.
    pub fn place_unit(&mut self, side: Side, archetype: ArchetypeId, position: Vec2Fixed) -> UnitId {
        let spec = *self.field.table.get(archetype);
        let position = self.field.clamp_to_field(position);
        let id = self.insert_unit(side, &spec, position);
        self.field.stats.side_mut(side).units_spawned += 1;
        id
    }

    /// Build a snapshot and drain the pending visual events into it.
    pub fn take_snapshot(&mut self) -> Snapshot {
        let events = std::mem::take(&mut self.field.pending_events);
        Snapshot::capture(&self.id, &self.field, events)
    }

    /// Take the visual events queued since the last snapshot.
    pub fn drain_events(&mut self) -> Vec<VisualEvent> {
        std::mem::take(&mut self.field.pending_events)
    }

    /// Deterministic hash of the full match state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.field.now.hash(&mut hasher);
        self.status.hash(&mut hasher);
        self.rng.hash(&mut hasher);
        for base in &self.field.bases {
            base.hash(&mut hasher);
        }
        for player in &self.players {
            player.hash(&mut hasher);
        }

        let units = self.field.registry.sorted_units();
        units.len().hash(&mut hasher);
        for unit in units {
            unit.hash(&mut hasher);
        }

        let projectiles = self.field.registry.projectiles();
        projectiles.len().hash(&mut hasher);
        for projectile in projectiles {
            projectile.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Serialize the match with bincode.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize match: {e}")))
    }

    /// Restore a match from [`Match::serialize`] output.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize match: {e}")))
    }

    #[cfg(feature = "debug-validation")]
    fn validate_invariants(&self) {
        for player in &self.players {
            debug_assert!(player.economy.resource >= Fixed::ZERO);
            debug_assert!(player.economy.resource <= player.economy.capacity);
        }
        for side in Side::BOTH {
            for spec in self.field.table.iter() {
                debug_assert!(self.field.registry.population(side, spec.id) <= spec.population_cap);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duel() -> Match {
        let mut game = Match::with_defaults(
            "m1",
            vec![
                PlayerSetup::human("alice", Side::Left),
                PlayerSetup::human("bob", Side::Right),
            ],
            7,
        )
        .unwrap();
        game.start();
        game
    }

    fn alice() -> PlayerId {
        PlayerId::from("alice")
    }

    #[test]
    fn new_match_waits() {
        let game = Match::with_defaults(
            "m1",
            vec![
                PlayerSetup::human("alice", Side::Left),
                PlayerSetup::human("bob", Side::Right),
            ],
            0,
        )
        .unwrap();
        assert_eq!(game.status(), MatchStatus::Waiting);
        assert_eq!(game.current_tick(), 0);
    }

    #[test]
    fn missing_side_is_rejected() {
        let err = Match::with_defaults("m1", vec![PlayerSetup::human("alice", Side::Left)], 0)
            .unwrap_err();
        assert!(matches!(err, GameError::MissingSide(Side::Right)));
    }

    #[test]
    fn duplicate_player_is_rejected() {
        let result = Match::with_defaults(
            "m1",
            vec![
                PlayerSetup::human("alice", Side::Left),
                PlayerSetup::human("alice", Side::Right),
            ],
            0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn waiting_match_does_not_tick_or_spawn() {
        let mut game = Match::with_defaults(
            "m1",
            vec![
                PlayerSetup::human("alice", Side::Left),
                PlayerSetup::human("bob", Side::Right),
            ],
            0,
        )
        .unwrap();
        game.tick();
        assert_eq!(game.current_tick(), 0);
        assert_eq!(
            game.request_spawn(&alice(), "soldier"),
            Err(SpawnRejection::MatchNotActive)
        );
    }

    #[test]
    fn spawn_places_batch_in_front_of_own_base() {
        let mut game = duel();
        let ids = game.request_spawn(&alice(), "soldier").unwrap();
        assert_eq!(ids.len(), 4);

        for id in ids {
            let unit = game.field().unit(id).unwrap();
            assert_eq!(unit.side, Side::Left);
            assert!(unit.position.x > Fixed::from_num(100));
            assert!(unit.position.x < Fixed::from_num(200));
            let offset = (unit.position.y - Fixed::from_num(200)).abs();
            assert!(offset <= Fixed::from_num(60));
        }
        assert_eq!(game.resource_of(&alice()), Some(Fixed::from_num(20)));
        assert_eq!(game.stats().left.units_spawned, 4);
    }

    #[test]
    fn rejections_leave_state_untouched() {
        let mut game = duel();
        let before = game.state_hash();

        assert_eq!(
            game.request_spawn(&alice(), "dragon"),
            Err(SpawnRejection::UnknownArchetype)
        );
        assert_eq!(
            game.request_spawn(&PlayerId::from("mallory"), "soldier"),
            Err(SpawnRejection::UnknownPlayer)
        );
        assert_eq!(
            game.request_spawn(&alice(), "cannon"),
            Err(SpawnRejection::InsufficientResource(ArchetypeId::Cannon))
        );
        assert_eq!(game.state_hash(), before);
    }

    #[test]
    fn bots_cannot_be_driven_externally() {
        let mut game = Match::with_defaults(
            "m1",
            vec![
                PlayerSetup::human("alice", Side::Left),
                PlayerSetup::bot("cpu", Side::Right, Difficulty::Hard),
            ],
            0,
        )
        .unwrap();
        game.start();
        assert_eq!(
            game.request_spawn(&PlayerId::from("cpu"), "soldier"),
            Err(SpawnRejection::BotControlled)
        );
        assert_eq!(game.humans().count(), 1);
    }

    #[test]
    fn empty_tick_only_regenerates() {
        let mut game = duel();
        game.tick();
        assert_eq!(game.current_tick(), 1);
        assert_eq!(game.resource_of(&alice()), Some(Fixed::from_num(50.25)));
        assert_eq!(game.field().base(Side::Left).health, 1000);
        assert_eq!(game.field().base(Side::Right).health, 1000);
    }

    #[test]
    fn snapshot_drains_events_once() {
        let mut game = duel();
        game.place_unit(Side::Left, ArchetypeId::Healer, Vec2Fixed::from_ints(300, 200));
        let wounded = game.place_unit(Side::Left, ArchetypeId::Soldier, Vec2Fixed::from_ints(310, 200));
        game.field.registry.get_mut(wounded).unwrap().health = 10;
        game.tick();

        let first = game.take_snapshot();
        assert_eq!(first.events.len(), 1);
        assert_eq!(first.units.len(), 2);
        let second = game.take_snapshot();
        assert!(second.events.is_empty());
    }

    #[test]
    fn serialization_preserves_state() {
        let mut game = duel();
        game.request_spawn(&alice(), "archer").unwrap();
        for _ in 0..40 {
            game.tick();
        }
        let bytes = game.serialize().unwrap();
        let restored = Match::deserialize(&bytes).unwrap();
        assert_eq!(restored.state_hash(), game.state_hash());
    }
}
