//! Error types for the battle simulation.

use thiserror::Error;

use crate::archetype::ArchetypeId;
use crate::components::Side;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for simulation and configuration failures.
#[derive(Debug, Error)]
pub enum GameError {
    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or label) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Archetype table is missing an entry or contains nonsense values.
    #[error("Invalid archetype table: {0}")]
    InvalidArchetypeTable(String),

    /// Player id is not part of the match.
    #[error("Unknown player: {0}")]
    UnknownPlayer(String),

    /// A match must seat exactly one player per side.
    #[error("Side {0:?} has no player")]
    MissingSide(Side),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

/// Reasons the spawn gate refuses a request.
///
/// Rejections never change match state. The network layer swallows them;
/// they are typed so tests and logs can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpawnRejection {
    /// Match is not accepting spawns (waiting or ended).
    #[error("match is not active")]
    MatchNotActive,

    /// Requesting player is not seated in this match.
    #[error("unknown player")]
    UnknownPlayer,

    /// Bots are driven by the bot controller, not by external requests.
    #[error("player is bot controlled")]
    BotControlled,

    /// Archetype name does not exist in the table.
    #[error("unknown archetype")]
    UnknownArchetype,

    /// Resource below the archetype cost.
    #[error("insufficient resource for {0}")]
    InsufficientResource(ArchetypeId),

    /// Side already fields the maximum number of live units of this archetype.
    #[error("population cap reached for {0}")]
    PopulationCapReached(ArchetypeId),

    /// Requester is still inside the archetype's post-spawn cooldown.
    #[error("{0} is cooling down")]
    CoolingDown(ArchetypeId),
}
