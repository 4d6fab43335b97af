//! End-to-end: HTTP match start, WebSocket spawn and snapshots, disconnect.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use lane_server::ServerConfig;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

type Socket =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<TcpStream>>;

async fn start_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let config = ServerConfig {
        tick_interval: Duration::from_millis(10),
        ..ServerConfig::default()
    };
    tokio::spawn(async move {
        lane_server::server::run(listener, config)
            .await
            .expect("server failed");
    });
    addr
}

async fn post_json(addr: SocketAddr, path: &str, body: &Value) -> String {
    let body = body.to_string();
    let request = format!(
        "POST {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream.write_all(request.as_bytes()).await.expect("write request");
    let mut response = String::new();
    stream.read_to_string(&mut response).await.expect("read response");
    response
}

async fn connect(addr: SocketAddr, match_id: &str, player_id: &str) -> Socket {
    let url = format!("ws://{addr}/ws?match_id={match_id}&player_id={player_id}");
    let (socket, _) = tokio_tungstenite::connect_async(url)
        .await
        .expect("websocket handshake");
    socket
}

/// Read text frames until one of the given type arrives.
async fn next_of_type(socket: &mut Socket, kind: &str) -> Value {
    timeout(Duration::from_secs(5), async {
        loop {
            let message = socket
                .next()
                .await
                .expect("socket closed")
                .expect("socket error");
            let Ok(text) = message.to_text() else {
                continue;
            };
            let Ok(value) = serde_json::from_str::<Value>(text) else {
                continue;
            };
            if value["type"] == kind {
                return value;
            }
        }
    })
    .await
    .expect("timed out waiting for frame")
}

fn start_request(match_id: &str) -> Value {
    json!({
        "match_id": match_id,
        "players": [
            { "id": "alice", "name": "Alice", "side": "left", "color": "#e33" },
            { "id": "bob", "name": "Bob", "side": "right", "color": "#33e" }
        ]
    })
}

#[tokio::test]
async fn match_lifecycle_over_the_wire() {
    let addr = start_server().await;

    let response = post_json(addr, "/matches", &start_request("m1")).await;
    assert!(response.starts_with("HTTP/1.1 202"), "{response}");

    let duplicate = post_json(addr, "/matches", &start_request("m1")).await;
    assert!(duplicate.starts_with("HTTP/1.1 409"), "{duplicate}");

    let mut alice = connect(addr, "m1", "alice").await;
    let mut bob = connect(addr, "m1", "bob").await;

    let first = next_of_type(&mut alice, "state").await;
    assert_eq!(first["data"]["state"]["match_id"], "m1");

    alice
        .send(Message::text(
            json!({ "type": "spawn", "data": { "archetype": "soldier" } }).to_string(),
        ))
        .await
        .expect("send spawn");
    alice
        .send(Message::text("not json".to_string()))
        .await
        .expect("send garbage");

    let spawned = timeout(Duration::from_secs(5), async {
        loop {
            let state = next_of_type(&mut alice, "state").await;
            let units = state["data"]["state"]["units"].as_array().cloned().unwrap_or_default();
            if !units.is_empty() {
                return (state["data"]["resource"].as_f64().unwrap_or_default(), units);
            }
        }
    })
    .await
    .expect("spawned units never appeared");
    assert_eq!(spawned.1.len(), 4);
    assert!(spawned.1.iter().all(|u| u["side"] == "left"));
    assert!(spawned.0 <= 100.0);

    bob.close(None).await.expect("close bob");
    let aborted = next_of_type(&mut alice, "match_aborted").await;
    assert_eq!(aborted["data"]["player_id"], "bob");
}

#[tokio::test]
async fn unknown_match_connection_is_closed() {
    let addr = start_server().await;
    let mut socket = connect(addr, "nope", "alice").await;
    let next = timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("server never closed the socket");
    assert!(matches!(next, None | Some(Ok(Message::Close(_))) | Some(Err(_))));
}

#[tokio::test]
async fn invalid_start_request_is_rejected() {
    let addr = start_server().await;
    let one_sided = json!({
        "match_id": "m2",
        "players": [{ "id": "alice", "side": "left" }]
    });
    let response = post_json(addr, "/matches", &one_sided).await;
    assert!(response.starts_with("HTTP/1.1 400"), "{response}");
}
