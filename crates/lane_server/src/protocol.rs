//! Wire messages between the server, clients and the lobby service.

use lane_core::bot::Difficulty;
use lane_core::components::{PlayerId, Side};
use lane_core::simulation::PlayerSetup;
use lane_core::snapshot::PlayerSnapshot;
use serde::{Deserialize, Serialize};

use crate::config::WireFormat;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Periodic world state with the recipient's resource.
    State(PlayerSnapshot),
    /// A base fell.
    MatchEnded {
        /// Match id.
        match_id: String,
        /// Side whose base survived.
        winner: Side,
    },
    /// A player disconnected and the match was torn down.
    MatchAborted {
        /// Match id.
        match_id: String,
        /// Player whose connection closed.
        player_id: PlayerId,
    },
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Spawn one batch of an archetype.
    Spawn {
        /// Archetype wire name.
        archetype: String,
    },
}

/// One seat in a match-start request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    /// Lobby player id.
    pub id: PlayerId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Lane side.
    pub side: Side,
    /// Lobby color.
    #[serde(default)]
    pub color: String,
    /// Whether the server drives this seat.
    #[serde(default)]
    pub is_bot: bool,
    /// Bot difficulty; ignored for humans.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

impl From<PlayerEntry> for PlayerSetup {
    fn from(entry: PlayerEntry) -> Self {
        let name = if entry.name.is_empty() {
            entry.id.to_string()
        } else {
            entry.name
        };
        Self {
            id: entry.id,
            name,
            side: entry.side,
            color: entry.color,
            bot: entry.is_bot.then(|| entry.difficulty.unwrap_or_default()),
        }
    }
}

/// Match-started signal from the lobby service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStartRequest {
    /// Id the lobby assigned to the match.
    pub match_id: String,
    /// Authoritative player list.
    pub players: Vec<PlayerEntry>,
    /// Optional seed; the server picks one otherwise.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// JSON error body for rejected HTTP requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub error: String,
}

/// An encoded server frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Text frame.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
}

/// Encoding failure.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// JSON encoding failed.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// bincode encoding failed.
    #[error("bincode: {0}")]
    Bincode(#[from] bincode::Error),
}

impl ServerMessage {
    /// Encode in the configured wire format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self, format: WireFormat) -> Result<Frame, EncodeError> {
        Ok(match format {
            WireFormat::Json => Frame::Text(serde_json::to_string(self)?),
            WireFormat::Bincode => Frame::Binary(bincode::serialize(self)?),
        })
    }
}

impl ClientMessage {
    /// Decode a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed frames.
    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Decode a bincode binary frame.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed frames.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
