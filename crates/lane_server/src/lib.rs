//! # Lane Server
//!
//! Authoritative match server.
//!
//! A single scheduler task owns every running [`lane_core::simulation::Match`]
//! and ticks them on a fixed timer. Clients connect over WebSocket, send spawn
//! requests and receive snapshots every few ticks; the lobby service starts
//! matches over HTTP.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod error;
pub mod net;
pub mod protocol;
pub mod scheduler;
pub mod server;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
