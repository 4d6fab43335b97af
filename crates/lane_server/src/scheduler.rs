//! The match scheduler.
//!
//! One task owns every running match. It alternates between the tick timer
//! and the command channel, so a command is always handled to completion
//! between two ticks and matches never need locks.
//!
//! Lifecycle of a match:
//! - `StartMatch` creates and starts it.
//! - Humans `Connect` with their player id and receive snapshots.
//! - A fallen base broadcasts `match_ended`; the match lingers for the
//!   teardown delay so late frames are ignored, then it is removed.
//! - A human disconnecting mid-match broadcasts `match_aborted` and removes
//!   the match at once.
//! - A match with human seats that nobody joins within the connect grace
//!   period is removed.

use std::collections::HashMap;

use lane_core::archetype::ArchetypeTable;
use lane_core::components::PlayerId;
use lane_core::config::MatchConfig;
use lane_core::simulation::{Match, PlayerSetup};
use lane_core::snapshot::SnapshotSchedule;
use lane_core::victory::MatchStatus;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::config::{ServerConfig, WireFormat};
use crate::protocol::{Frame, MatchStartRequest, ServerMessage};

/// Match id as assigned by the lobby.
pub type MatchId = String;

/// Per-connection id, used to ignore stale disconnects.
pub type ConnectionId = u64;

/// Outbound sink of one connection.
pub trait Outbox {
    /// Queue a frame without waiting. Returns false when the frame was
    /// dropped.
    fn deliver(&self, frame: Frame) -> bool;
}

impl Outbox for mpsc::Sender<Frame> {
    fn deliver(&self, frame: Frame) -> bool {
        self.try_send(frame).is_ok()
    }
}

/// Why a match could not be started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StartError {
    /// The id is already running.
    #[error("match '{0}' already exists")]
    Duplicate(MatchId),
    /// The player list was rejected.
    #[error("invalid match: {0}")]
    Invalid(String),
}

/// Why a connection was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    /// No such match.
    #[error("unknown match")]
    UnknownMatch,
    /// The player is not a human seated in the match.
    #[error("player is not seated as a human")]
    NotSeated,
    /// The match already finished.
    #[error("match already ended")]
    Ended,
}

/// Requests handled by the scheduler task.
#[derive(Debug)]
pub enum Command<O = mpsc::Sender<Frame>> {
    /// Match-started signal.
    StartMatch {
        /// Lobby request.
        request: MatchStartRequest,
        /// Outcome.
        reply: oneshot::Sender<Result<(), StartError>>,
    },
    /// A human opened a connection.
    Connect {
        /// Match id.
        match_id: MatchId,
        /// Player id.
        player_id: PlayerId,
        /// Connection id.
        connection: ConnectionId,
        /// Outbound sink.
        outbox: O,
        /// Outcome.
        reply: oneshot::Sender<Result<(), ConnectError>>,
    },
    /// Spawn request from a connected human.
    Spawn {
        /// Match id.
        match_id: MatchId,
        /// Player id.
        player_id: PlayerId,
        /// Archetype wire name.
        archetype: String,
    },
    /// A connection closed.
    Disconnect {
        /// Match id.
        match_id: MatchId,
        /// Player id.
        player_id: PlayerId,
        /// Connection id.
        connection: ConnectionId,
    },
}

struct Connection<O> {
    id: ConnectionId,
    outbox: O,
}

struct Entry<O> {
    game: Match,
    connections: HashMap<PlayerId, Connection<O>>,
    remove_at: Option<u64>,
    /// Scheduler tick after which the match is dropped if no human has
    /// connected yet. `None` once someone joins, and for all-bot matches.
    abandon_at: Option<u64>,
}

impl<O> Entry<O> {
    fn expired(&self, clock: u64) -> Expiry {
        if self.remove_at.is_some_and(|at| clock >= at) {
            Expiry::Finished
        } else if self.connections.is_empty() && self.abandon_at.is_some_and(|at| clock >= at) {
            Expiry::Abandoned
        } else {
            Expiry::Live
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expiry {
    Live,
    Finished,
    Abandoned,
}

/// Settings the scheduler needs from the server config.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Which ticks are broadcast.
    pub snapshots: SnapshotSchedule,
    /// Ticks a finished match lingers.
    pub teardown_delay_ticks: u64,
    /// Ticks a match waits for its first human.
    pub connect_grace_ticks: u64,
    /// Frame encoding.
    pub wire_format: WireFormat,
    /// Archetype table for new matches.
    pub archetypes: ArchetypeTable,
    /// Config for new matches.
    pub match_config: MatchConfig,
}

impl From<&ServerConfig> for SchedulerSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            snapshots: config.snapshots,
            teardown_delay_ticks: config.teardown_delay_ticks,
            connect_grace_ticks: config.connect_grace_ticks,
            wire_format: config.wire_format,
            archetypes: config.archetypes.clone(),
            match_config: config.match_config,
        }
    }
}

/// Owner of all running matches.
pub struct Scheduler<O: Outbox = mpsc::Sender<Frame>> {
    settings: SchedulerSettings,
    matches: HashMap<MatchId, Entry<O>>,
    clock: u64,
    next_seed: u64,
}

impl<O: Outbox> Scheduler<O> {
    /// Create an empty scheduler.
    pub fn new(settings: SchedulerSettings) -> Self {
        Self {
            settings,
            matches: HashMap::new(),
            clock: 0,
            next_seed: 0x5EED,
        }
    }

    /// Scheduler ticks elapsed.
    pub const fn clock(&self) -> u64 {
        self.clock
    }

    /// Number of matches held, including finished ones awaiting removal.
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// A held match.
    pub fn game(&self, match_id: &str) -> Option<&Match> {
        self.matches.get(match_id).map(|entry| &entry.game)
    }

    /// Handle one command to completion.
    pub fn handle(&mut self, command: Command<O>) {
        match command {
            Command::StartMatch { request, reply } => {
                let _ = reply.send(self.start_match(request));
            }
            Command::Connect {
                match_id,
                player_id,
                connection,
                outbox,
                reply,
            } => {
                let _ = reply.send(self.connect(&match_id, player_id, connection, outbox));
            }
            Command::Spawn {
                match_id,
                player_id,
                archetype,
            } => self.spawn(&match_id, &player_id, &archetype),
            Command::Disconnect {
                match_id,
                player_id,
                connection,
            } => self.disconnect(&match_id, &player_id, connection),
        }
    }

    /// Create and start a match.
    ///
    /// # Errors
    ///
    /// Fails for duplicate ids and invalid player lists.
    pub fn start_match(&mut self, request: MatchStartRequest) -> Result<(), StartError> {
        if self.matches.contains_key(&request.match_id) {
            return Err(StartError::Duplicate(request.match_id));
        }
        if request.players.is_empty() {
            return Err(StartError::Invalid("empty player list".into()));
        }

        let seed = request.seed.unwrap_or_else(|| {
            self.next_seed = self.next_seed.wrapping_add(0x9E37_79B9);
            self.next_seed
        });
        let setups: Vec<PlayerSetup> = request.players.into_iter().map(Into::into).collect();
        let mut game = Match::new(
            request.match_id.clone(),
            setups,
            self.settings.match_config,
            self.settings.archetypes.clone(),
            seed,
        )
        .map_err(|e| StartError::Invalid(e.to_string()))?;
        game.start();

        let abandon_at = game
            .humans()
            .next()
            .map(|_| self.clock + self.settings.connect_grace_ticks);
        info!(match_id = %request.match_id, seed, "match registered");
        self.matches.insert(
            request.match_id,
            Entry {
                game,
                connections: HashMap::new(),
                remove_at: None,
                abandon_at,
            },
        );
        Ok(())
    }

    /// Attach a human's outbound sink to a match.
    ///
    /// # Errors
    ///
    /// Refuses unknown matches, non-human players and finished matches.
    pub fn connect(
        &mut self,
        match_id: &str,
        player_id: PlayerId,
        connection: ConnectionId,
        outbox: O,
    ) -> Result<(), ConnectError> {
        let entry = self
            .matches
            .get_mut(match_id)
            .ok_or(ConnectError::UnknownMatch)?;
        if entry.remove_at.is_some() {
            return Err(ConnectError::Ended);
        }
        match entry.game.player(&player_id) {
            Some(player) if !player.is_bot() => {}
            _ => return Err(ConnectError::NotSeated),
        }
        debug!(%match_id, player = %player_id, connection, "player connected");
        entry.abandon_at = None;
        entry.connections.insert(
            player_id,
            Connection {
                id: connection,
                outbox,
            },
        );
        Ok(())
    }

    /// Forward a spawn request. Rejections are silent.
    pub fn spawn(&mut self, match_id: &str, player_id: &PlayerId, archetype: &str) {
        let Some(entry) = self.matches.get_mut(match_id) else {
            warn!(%match_id, "spawn for unknown match ignored");
            return;
        };
        if !entry.connections.contains_key(player_id) {
            debug!(%match_id, player = %player_id, "spawn from unconnected player ignored");
            return;
        }
        let _ = entry.game.request_spawn(player_id, archetype);
    }

    /// Handle a closed connection. A live match is torn down and the other
    /// humans are told why.
    pub fn disconnect(&mut self, match_id: &str, player_id: &PlayerId, connection: ConnectionId) {
        let Some(entry) = self.matches.get_mut(match_id) else {
            debug!(%match_id, "disconnect for unknown match ignored");
            return;
        };
        match entry.connections.get(player_id) {
            Some(current) if current.id == connection => {}
            _ => return,
        }
        entry.connections.remove(player_id);

        if entry.remove_at.is_some() {
            return;
        }

        let message = ServerMessage::MatchAborted {
            match_id: match_id.to_string(),
            player_id: player_id.clone(),
        };
        broadcast(entry, &message, self.settings.wire_format);
        info!(%match_id, player = %player_id, tick = entry.game.current_tick(), "match aborted on disconnect");
        self.matches.remove(match_id);
    }

    /// Advance every live match one tick, broadcast snapshots and results,
    /// then remove matches whose teardown delay has run out.
    pub fn tick_all(&mut self) {
        self.clock += 1;
        let clock = self.clock;
        let format = self.settings.wire_format;

        let mut ids: Vec<MatchId> = self.matches.keys().cloned().collect();
        ids.sort_unstable();

        for id in ids {
            let Some(entry) = self.matches.get_mut(&id) else {
                continue;
            };
            if entry.game.status() != MatchStatus::Active {
                continue;
            }

            let events = entry.game.tick();
            let tick = entry.game.current_tick();

            if events.winner.is_some() || self.settings.snapshots.should_send(tick) {
                send_snapshots(entry, format);
            }

            if let Some(winner) = events.winner {
                let message = ServerMessage::MatchEnded {
                    match_id: id.clone(),
                    winner,
                };
                broadcast(entry, &message, format);
                entry.remove_at = Some(clock + self.settings.teardown_delay_ticks);
                info!(match_id = %id, %winner, tick, "match finished");
            }
        }

        self.matches.retain(|id, entry| match entry.expired(clock) {
            Expiry::Live => true,
            Expiry::Finished => {
                info!(match_id = %id, "match torn down");
                false
            }
            Expiry::Abandoned => {
                info!(match_id = %id, tick = entry.game.current_tick(), "match abandoned; nobody connected");
                false
            }
        });
    }
}

impl Scheduler<mpsc::Sender<Frame>> {
    /// Run until the command channel closes.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        tick_interval: std::time::Duration,
    ) {
        let mut interval = tokio::time::interval(tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => self.tick_all(),
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        info!("command channel closed; scheduler exiting");
                        break;
                    }
                },
            }
        }
    }
}

fn send_snapshots<O: Outbox>(entry: &mut Entry<O>, format: WireFormat) {
    let snapshot = entry.game.take_snapshot();
    for (player_id, connection) in &entry.connections {
        let Some(resource) = entry.game.resource_of(player_id) else {
            continue;
        };
        let message = ServerMessage::State(snapshot.for_player(resource));
        match message.encode(format) {
            Ok(frame) => {
                if !connection.outbox.deliver(frame) {
                    trace!(player = %player_id, "snapshot dropped");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode snapshot"),
        }
    }
}

fn broadcast<O: Outbox>(entry: &Entry<O>, message: &ServerMessage, format: WireFormat) {
    let frame = match message.encode(format) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "failed to encode message");
            return;
        }
    };
    for (player_id, connection) in &entry.connections {
        if !connection.outbox.deliver(frame.clone()) {
            warn!(player = %player_id, "frame dropped");
        }
    }
}
