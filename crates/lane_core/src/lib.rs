//! # Lane Core
//!
//! Deterministic simulation core for a two-lane autobattler.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math in the simulation (uses fixed-point)
//!
//! Given the same seed, config and spawn requests in the same order, two
//! matches produce identical states tick for tick. The server relies on this
//! for reproducible bugs, the headless runner for batch statistics.
//!
//! ## Crate Structure
//!
//! - [`simulation`] - The match and its tick
//! - [`archetype`] - Unit archetypes and the balance table
//! - [`behavior`] - Per-archetype decision making
//! - [`combat`], [`projectile`], [`victory`] - Damage resolution
//! - [`economy`], [`bot`] - Resources, spawn gate, scripted opponents
//! - [`snapshot`] - Client-facing state views
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod archetype;
pub mod battlefield;
pub mod behavior;
pub mod bot;
pub mod combat;
pub mod components;
pub mod config;
pub mod economy;
pub mod error;
pub mod events;
pub mod math;
pub mod projectile;
pub mod registry;
pub mod rng;
pub mod simulation;
pub mod snapshot;
pub mod stats;
pub mod targeting;
pub mod victory;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::archetype::{ArchetypeId, ArchetypeSpec, ArchetypeTable, Behavior};
    pub use crate::battlefield::Battlefield;
    pub use crate::bot::Difficulty;
    pub use crate::components::*;
    pub use crate::config::MatchConfig;
    pub use crate::economy::{Player, PlayerEconomy};
    pub use crate::error::{GameError, Result, SpawnRejection};
    pub use crate::events::{TickEvents, VisualEvent};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::simulation::{Match, PlayerSetup, TICK_MILLIS, TICK_RATE};
    pub use crate::snapshot::{PlayerSnapshot, Snapshot, SnapshotSchedule};
    pub use crate::stats::MatchStats;
    pub use crate::victory::MatchStatus;
}
