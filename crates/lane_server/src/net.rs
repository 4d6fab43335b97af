//! HTTP and WebSocket adapter in front of the scheduler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use futures_util::{SinkExt, StreamExt};
use lane_core::components::PlayerId;
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::protocol::{ClientMessage, ErrorResponse, Frame, MatchStartRequest};
use crate::scheduler::{Command, ConnectionId, StartError};

/// Shared handler state.
#[derive(Debug)]
pub struct AppState {
    /// Scheduler command channel.
    pub commands: mpsc::Sender<Command>,
    /// Per-connection outbound queue length.
    pub outbound_capacity: usize,
    next_connection: AtomicU64,
}

impl AppState {
    /// Create handler state.
    pub fn new(commands: mpsc::Sender<Command>, outbound_capacity: usize) -> Self {
        Self {
            commands,
            outbound_capacity,
            next_connection: AtomicU64::new(1),
        }
    }

    fn connection_id(&self) -> ConnectionId {
        self.next_connection.fetch_add(1, Ordering::Relaxed)
    }
}

/// Identity of a WebSocket connection.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Match to join.
    pub match_id: String,
    /// Player seated in that match.
    pub player_id: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// `POST /matches`: the lobby's match-started signal.
pub async fn start_match_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MatchStartRequest>,
) -> impl IntoResponse {
    let match_id = request.match_id.clone();
    let (reply, outcome) = oneshot::channel();
    if state
        .commands
        .send(Command::StartMatch { request, reply })
        .await
        .is_err()
    {
        return error(StatusCode::SERVICE_UNAVAILABLE, "scheduler stopped");
    }

    match outcome.await {
        Ok(Ok(())) => {
            info!(%match_id, "match accepted");
            StatusCode::ACCEPTED.into_response()
        }
        Ok(Err(e @ StartError::Duplicate(_))) => error(StatusCode::CONFLICT, e.to_string()),
        Ok(Err(e @ StartError::Invalid(_))) => error(StatusCode::BAD_REQUEST, e.to_string()),
        Err(_) => error(StatusCode::SERVICE_UNAVAILABLE, "scheduler stopped"),
    }
}

/// `GET /ws?match_id=..&player_id=..`: a player's game connection.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        let connection = state.connection_id();
        let span = info_span!("conn", connection, match_id = %query.match_id, player = %query.player_id);
        handle_socket(socket, state, query, connection).instrument(span)
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    query: ConnectQuery,
    connection: ConnectionId,
) {
    let player_id = PlayerId(query.player_id);
    let match_id = query.match_id;

    let (outbox, mut frames) = mpsc::channel::<Frame>(state.outbound_capacity);
    let (reply, outcome) = oneshot::channel();
    let connect = Command::Connect {
        match_id: match_id.clone(),
        player_id: player_id.clone(),
        connection,
        outbox,
        reply,
    };
    if state.commands.send(connect).await.is_err() {
        warn!("scheduler stopped; closing connection");
        return;
    }
    match outcome.await {
        Ok(Ok(())) => debug!("connection accepted"),
        Ok(Err(e)) => {
            info!(reason = %e, "connection refused");
            return;
        }
        Err(_) => return,
    }

    let (mut sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            let message = match frame {
                Frame::Text(text) => Message::Text(text.into()),
                Frame::Binary(bytes) => Message::Binary(bytes.into()),
            };
            if sink.send(message).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    loop {
        tokio::select! {
            _ = &mut writer => break,
            incoming = stream.next() => {
                let message = match incoming {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        debug!(error = %e, "socket error");
                        break;
                    }
                    None => break,
                };
                let parsed = match message {
                    Message::Text(text) => ClientMessage::from_text(&text).map_err(|e| e.to_string()),
                    Message::Binary(bytes) => ClientMessage::from_binary(&bytes).map_err(|e| e.to_string()),
                    Message::Close(_) => break,
                    _ => continue,
                };
                match parsed {
                    Ok(ClientMessage::Spawn { archetype }) => {
                        let command = Command::Spawn {
                            match_id: match_id.clone(),
                            player_id: player_id.clone(),
                            archetype,
                        };
                        if state.commands.send(command).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => debug!(error = %e, "malformed client frame dropped"),
                }
            }
        }
    }

    // The scheduler drops our outbox when it tears the match down, which also
    // ends the writer.
    let _ = state
        .commands
        .send(Command::Disconnect {
            match_id,
            player_id,
            connection,
        })
        .await;
    writer.abort();
    debug!("connection closed");
}
