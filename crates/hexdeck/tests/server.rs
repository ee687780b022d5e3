//! Integration tests for the HexDeck server, handler, and full connection flow.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use hexdeck::prelude::*;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = HexdeckServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

fn system(data: Value) -> Message {
    envelope("System", data)
}

fn game(data: Value) -> Message {
    envelope("Game", data)
}

fn envelope(kind: &str, data: Value) -> Message {
    let frame = json!({
        "seq": 1,
        "timestamp": 0,
        "payload": { "type": kind, "data": data },
    });
    Message::text(frame.to_string())
}

/// Next frame's payload as `(kind, data)`.
async fn next_payload(ws: &mut ClientWs) -> (String, Value) {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("stream ended")
        .expect("receive failed");
    let frame: Value = serde_json::from_slice(&msg.into_data()).expect("frame is JSON");
    let payload = &frame["payload"];
    (
        payload["type"].as_str().unwrap_or_default().to_string(),
        payload["data"].clone(),
    )
}

/// Reads frames until one has the given payload kind and data type.
async fn expect_message(ws: &mut ClientWs, kind: &str, ty: &str) -> Value {
    for _ in 0..32 {
        let (k, data) = next_payload(ws).await;
        if k == kind && data["type"] == ty {
            return data;
        }
    }
    panic!("no {kind}/{ty} frame arrived");
}

/// Drains frames until the server closes the socket. Returns `false` if it
/// stayed open for two seconds.
async fn wait_for_close(ws: &mut ClientWs) -> bool {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await
    .is_ok()
}

/// Creates a room as `name` and returns `(RoomJoined, join code)`.
async fn create_room(ws: &mut ClientWs, name: &str) -> (Value, String) {
    ws.send(system(json!({ "type": "CreateRoom", "username": name })))
        .await
        .unwrap();
    let joined = expect_message(ws, "System", "RoomJoined").await;
    expect_message(ws, "System", "HandshakeAck").await;
    let info = expect_message(ws, "Game", "RoomInfo").await;
    let code = info["join_code"].as_str().unwrap().to_string();
    (joined, code)
}

async fn join_room(ws: &mut ClientWs, code: &str, name: &str) -> Value {
    ws.send(system(json!({ "type": "JoinRoom", "join_code": code, "username": name })))
        .await
        .unwrap();
    let joined = expect_message(ws, "System", "RoomJoined").await;
    expect_message(ws, "System", "HandshakeAck").await;
    joined
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_create_room_attaches_host() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(system(json!({ "type": "CreateRoom", "username": "Ann" })))
        .await
        .unwrap();

    let joined = expect_message(&mut ws, "System", "RoomJoined").await;
    assert_eq!(joined["username"], "Ann");
    assert!(!joined["session_token"].as_str().unwrap().is_empty());

    let ack = expect_message(&mut ws, "System", "HandshakeAck").await;
    assert_eq!(ack["player_id"], joined["player_id"]);
    assert_eq!(ack["room_id"], joined["room_id"]);

    let info = expect_message(&mut ws, "Game", "RoomInfo").await;
    assert_eq!(info["players"][0]["username"], "Ann");
    assert_eq!(info["players"][0]["is_connected"], true);
}

#[tokio::test]
async fn test_join_start_and_out_of_turn_draw() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let mut guest = connect(&addr).await;

    let (_, code) = create_room(&mut host, "Ann").await;
    join_room(&mut guest, &code, "Bob").await;

    host.send(game(json!({ "type": "StartGame" }))).await.unwrap();
    let cards = expect_message(&mut guest, "Game", "OwnCards").await;
    assert!(!cards["cards"].as_array().unwrap().is_empty());

    // The host sits in seat 0 and moves first.
    guest.send(game(json!({ "type": "DrawCard" }))).await.unwrap();
    let status = expect_message(&mut guest, "Game", "Status").await;
    assert_eq!(status["status_code"], "player_not_active");
    assert_eq!(status["is_error"], true);
}

#[tokio::test]
async fn test_non_host_cannot_start() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let mut guest = connect(&addr).await;

    let (_, code) = create_room(&mut host, "Ann").await;
    join_room(&mut guest, &code, "Bob").await;

    guest.send(game(json!({ "type": "StartGame" }))).await.unwrap();
    let status = expect_message(&mut guest, "Game", "Status").await;
    assert_eq!(status["status_code"], "insufficient_permission");
}

#[tokio::test]
async fn test_heartbeat_before_session() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(system(json!({ "type": "Heartbeat", "client_time": 12345 })))
        .await
        .unwrap();
    let ack = expect_message(&mut ws, "System", "HeartbeatAck").await;
    assert_eq!(ack["client_time"], 12345);
}

#[tokio::test]
async fn test_check_join_code() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let mut lookup = connect(&addr).await;
    let (_, code) = create_room(&mut host, "Ann").await;

    lookup
        .send(system(json!({ "type": "CheckJoinCode", "join_code": code })))
        .await
        .unwrap();
    let checked = expect_message(&mut lookup, "System", "JoinCodeChecked").await;
    assert_eq!(checked["valid"], true);

    lookup
        .send(system(json!({ "type": "CheckJoinCode", "join_code": "not-a-code" })))
        .await
        .unwrap();
    let checked = expect_message(&mut lookup, "System", "JoinCodeChecked").await;
    assert_eq!(checked["valid"], false);
    assert_eq!(checked["join_code"], "not-a-code");
}

#[tokio::test]
async fn test_join_unknown_code() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(system(json!({ "type": "JoinRoom", "join_code": "000000" })))
        .await
        .unwrap();
    let status = expect_message(&mut ws, "System", "Status").await;
    assert_eq!(status["status_code"], "invalid_join_code");
}

#[tokio::test]
async fn test_check_session_and_stats() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let (joined, _) = create_room(&mut host, "Ann").await;

    let mut lookup = connect(&addr).await;
    lookup
        .send(system(json!({
            "type": "CheckSession",
            "session_token": joined["session_token"],
        })))
        .await
        .unwrap();
    let checked = expect_message(&mut lookup, "System", "SessionChecked").await;
    assert_eq!(checked["valid"], true);

    lookup.send(system(json!({ "type": "GetStats" }))).await.unwrap();
    let stats = expect_message(&mut lookup, "System", "Stats").await;
    assert_eq!(stats["running_games"], 1);
    assert_eq!(stats["online_player_count"], 1);
}

#[tokio::test]
async fn test_handshake_with_unknown_token() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(system(json!({
        "type": "Handshake",
        "version": PROTOCOL_VERSION,
        "session_token": "nobody",
    })))
    .await
    .unwrap();
    let status = expect_message(&mut ws, "System", "Status").await;
    assert_eq!(status["status_code"], "invalid_session");
}

#[tokio::test]
async fn test_handshake_version_mismatch() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(system(json!({
        "type": "Handshake",
        "version": 999,
        "session_token": "whatever",
    })))
    .await
    .unwrap();
    let status = expect_message(&mut ws, "System", "Status").await;
    assert_eq!(status["status_code"], "version_mismatch");
    assert!(status["message"].as_str().unwrap().contains("got 999"));

    // The server gives up on the socket after a foreign version.
    assert!(wait_for_close(&mut ws).await, "socket should close");
}

#[tokio::test]
async fn test_game_event_before_session() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(game(json!({ "type": "DrawCard" }))).await.unwrap();
    let status = expect_message(&mut ws, "System", "Status").await;
    assert_eq!(status["status_code"], "invalid_session");
}

#[tokio::test]
async fn test_reconnect_replaces_old_socket() {
    let addr = start_server().await;
    let mut first = connect(&addr).await;
    let (joined, _) = create_room(&mut first, "Ann").await;

    let mut second = connect(&addr).await;
    second
        .send(system(json!({
            "type": "Handshake",
            "version": PROTOCOL_VERSION,
            "session_token": joined["session_token"],
        })))
        .await
        .unwrap();
    let ack = expect_message(&mut second, "System", "HandshakeAck").await;
    assert_eq!(ack["player_id"], joined["player_id"]);

    let status = expect_message(&mut first, "System", "Status").await;
    assert_eq!(status["status_code"], "connection_from_different_socket");

    assert!(wait_for_close(&mut first).await, "old socket should be closed");
}

#[tokio::test]
async fn test_invalid_frame_ignored() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::text("not json")).await.unwrap();
    ws.send(system(json!({ "type": "Heartbeat", "client_time": 999 })))
        .await
        .unwrap();

    let ack = expect_message(&mut ws, "System", "HeartbeatAck").await;
    assert_eq!(ack["client_time"], 999);
}

#[tokio::test]
async fn test_leave_room_closes_socket() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    let (joined, _) = create_room(&mut ws, "Ann").await;

    ws.send(system(json!({ "type": "LeaveRoom" }))).await.unwrap();
    assert!(wait_for_close(&mut ws).await, "socket should close after leaving");

    let mut lookup = connect(&addr).await;
    lookup
        .send(system(json!({
            "type": "CheckSession",
            "session_token": joined["session_token"],
        })))
        .await
        .unwrap();
    let checked = expect_message(&mut lookup, "System", "SessionChecked").await;
    assert_eq!(checked["valid"], false);
}
