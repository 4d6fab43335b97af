//! Runtime configuration read from the environment.
//!
//! Gameplay data (archetypes, match geometry) lives in optional RON files;
//! everything else is a plain environment variable with a default.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use lane_core::archetype::ArchetypeTable;
use lane_core::config::MatchConfig;
use lane_core::snapshot::SnapshotSchedule;

use crate::error::{Result, ServerError};

/// Encoding of server-to-client frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// JSON text frames.
    #[default]
    Json,
    /// bincode binary frames.
    Bincode,
}

impl FromStr for WireFormat {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "bincode" => Ok(Self::Bincode),
            other => Err(ServerError::Config(format!("unknown WIRE_FORMAT '{other}'"))),
        }
    }
}

/// Server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub address: SocketAddr,
    /// Simulation tick period.
    pub tick_interval: Duration,
    /// Which ticks are broadcast.
    pub snapshots: SnapshotSchedule,
    /// Ticks a finished match lingers before removal.
    pub teardown_delay_ticks: u64,
    /// Ticks a new match waits for its first human before it is dropped.
    pub connect_grace_ticks: u64,
    /// Per-connection outbound queue length.
    pub outbound_capacity: usize,
    /// Scheduler command queue length.
    pub command_capacity: usize,
    /// Frame encoding.
    pub wire_format: WireFormat,
    /// Archetype balance table.
    pub archetypes: ArchetypeTable,
    /// Match geometry and economy.
    pub match_config: MatchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let tick_interval = Duration::from_millis(lane_core::simulation::TICK_MILLIS);
        Self {
            address: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3001),
            tick_interval,
            snapshots: SnapshotSchedule::default(),
            teardown_delay_ticks: ticks_for(Duration::from_millis(3000), tick_interval),
            connect_grace_ticks: ticks_for(Duration::from_millis(30_000), tick_interval),
            outbound_capacity: 64,
            command_capacity: 1024,
            wire_format: WireFormat::Json,
            archetypes: ArchetypeTable::standard(),
            match_config: MatchConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Fails on malformed values or unreadable data files.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let host = match env::var("LANE_SERVER_HOST") {
            Ok(value) => value
                .parse::<IpAddr>()
                .map_err(|e| ServerError::Config(format!("LANE_SERVER_HOST: {e}")))?,
            Err(_) => defaults.address.ip(),
        };
        let port = parsed("LANE_SERVER_PORT", defaults.address.port())?;
        let tick_interval = Duration::from_millis(parsed(
            "TICK_INTERVAL_MS",
            lane_core::simulation::TICK_MILLIS,
        )?);
        if tick_interval.is_zero() {
            return Err(ServerError::Config("TICK_INTERVAL_MS must be positive".into()));
        }
        let teardown_delay = Duration::from_millis(parsed("TEARDOWN_DELAY_MS", 3000)?);
        let connect_grace = Duration::from_millis(parsed("CONNECT_GRACE_MS", 30_000)?);

        let wire_format = match env::var("WIRE_FORMAT") {
            Ok(value) => value.parse()?,
            Err(_) => WireFormat::Json,
        };

        let archetypes = match env::var("ARCHETYPES_PATH") {
            Ok(path) => {
                let path = PathBuf::from(path);
                let source = read(&path)?;
                ArchetypeTable::from_ron_str(&source, &path.display().to_string())?
            }
            Err(_) => defaults.archetypes,
        };
        let match_config = match env::var("MATCH_CONFIG_PATH") {
            Ok(path) => {
                let path = PathBuf::from(path);
                let source = read(&path)?;
                MatchConfig::from_ron_str(&source, &path.display().to_string())?
            }
            Err(_) => defaults.match_config,
        };

        Ok(Self {
            address: SocketAddr::new(host, port),
            tick_interval,
            snapshots: SnapshotSchedule::every(parsed("SNAPSHOT_EVERY", defaults.snapshots.stride())?),
            teardown_delay_ticks: ticks_for(teardown_delay, tick_interval),
            connect_grace_ticks: ticks_for(connect_grace, tick_interval),
            outbound_capacity: parsed("OUTBOUND_CAPACITY", defaults.outbound_capacity)?.max(1),
            command_capacity: parsed("COMMAND_CAPACITY", defaults.command_capacity)?.max(1),
            wire_format,
            archetypes,
            match_config,
        })
    }
}

/// Whole ticks covering `delay`, rounded up.
fn ticks_for(delay: Duration, tick_interval: Duration) -> u64 {
    let tick = tick_interval.as_millis().max(1);
    delay.as_millis().div_ceil(tick) as u64
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| ServerError::Config(format!("{key}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn read(path: &PathBuf) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ServerError::Io {
        path: path.display().to_string(),
        source,
    })
}
