//! Runtime bootstrap: logging, router, scheduler task.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::net::{start_match_handler, ws_handler, AppState};
use crate::scheduler::{Scheduler, SchedulerSettings};

/// Load `.env`, install the tracing subscriber and the panic hook.
pub fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Build the HTTP router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/matches", post(start_match_handler))
        .with_state(state)
}

/// Spawn the scheduler and serve on `listener` until the server stops.
///
/// # Errors
///
/// Returns an error if serving fails.
pub async fn run(listener: TcpListener, config: ServerConfig) -> Result<()> {
    let address = listener.local_addr()?;

    let (commands, command_rx) = mpsc::channel(config.command_capacity);
    let scheduler: Scheduler = Scheduler::new(SchedulerSettings::from(&config));
    tokio::spawn(scheduler.run(command_rx, config.tick_interval));

    let state = Arc::new(AppState::new(commands, config.outbound_capacity));
    let app = router(state);

    tracing::info!(
        %address,
        tick_ms = config.tick_interval.as_millis(),
        snapshot_every = config.snapshots.stride(),
        wire = ?config.wire_format,
        "listening"
    );

    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })?;
    Ok(())
}

/// Read the environment, bind and serve.
///
/// # Errors
///
/// Returns an error for bad configuration, bind failures or serve errors.
pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let config = ServerConfig::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
    })?;
    let address = config.address;

    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| ServerError::Bind { address, source })
        .inspect_err(|e| {
            tracing::error!(error = %e, "failed to bind");
        })?;

    run(listener, config).await
}
