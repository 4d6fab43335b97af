//! Server startup errors.

use lane_core::error::GameError;
use thiserror::Error;

/// Result alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that stop the server from starting or serving.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Malformed environment value.
    #[error("configuration error: {0}")]
    Config(String),

    /// A data file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A data file could not be parsed.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Binding the listener failed.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Requested address.
        address: std::net::SocketAddr,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an error.
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}
