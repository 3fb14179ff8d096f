//! End-to-end tests for `RoomClient` against a loopback relay.
//!
//! A bare `tokio-tungstenite` server plays the relay and speaks the JSON
//! wire format by hand.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use polyroom::prelude::*;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

// =========================================================================
// Relay stub helpers
// =========================================================================

async fn relay_listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have addr");
    (listener, format!("ws://{addr}"))
}

async fn accept(listener: &TcpListener) -> ServerWs {
    let (stream, _) = listener.accept().await.expect("should accept");
    tokio_tungstenite::accept_async(stream)
        .await
        .expect("handshake should succeed")
}

/// Reads the next text frame as JSON. `None` once the client is gone.
async fn next_event(ws: &mut ServerWs) -> Option<Value> {
    loop {
        match ws.next().await? {
            Ok(Message::Text(text)) => {
                return Some(serde_json::from_str(text.as_str()).expect("client sent JSON"));
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}

async fn send_event(ws: &mut ServerWs, event: Value) {
    ws.send(Message::Text(event.to_string().into()))
        .await
        .expect("relay send should succeed");
}

fn client_for(url: &str) -> RoomClient {
    RoomClient::builder()
        .relay_url(url)
        .join_timeout(Duration::from_secs(5))
        .build()
}

fn alice() -> JoinRequest {
    JoinRequest::new("ABC123", "u1", "Alice", "Spanish")
}

// =========================================================================
// Join, deltas, and leave
// =========================================================================

#[tokio::test]
async fn test_join_receives_peer_and_leaves_on_close() {
    let (listener, url) = relay_listener().await;
    let (subscribed_tx, subscribed_rx) = tokio::sync::oneshot::channel::<()>();

    let relay = tokio::spawn(async move {
        let mut ws = accept(&listener).await;

        let join = next_event(&mut ws).await.expect("join-room");
        assert_eq!(join["event"], "join-room");
        assert_eq!(join["data"]["roomCode"], "ABC123");
        assert_eq!(join["data"]["userId"], "u1");
        assert_eq!(join["data"]["language"], "Spanish");

        send_event(
            &mut ws,
            json!({
                "event": "joined-room",
                "data": {
                    "roomCode": "ABC123",
                    "userId": "u1",
                    "users": [{ "id": "u1", "name": "Alice", "language": "Spanish" }]
                }
            }),
        )
        .await;

        let list = next_event(&mut ws).await.expect("get-recordings");
        assert_eq!(list["event"], "get-recordings");

        subscribed_rx.await.expect("test subscribed");
        send_event(
            &mut ws,
            json!({
                "event": "peer-joined",
                "data": { "userId": "u2", "name": "Bob", "language": "French" }
            }),
        )
        .await;

        let mut seen = Vec::new();
        while let Some(event) = next_event(&mut ws).await {
            seen.push(event["event"].as_str().unwrap_or_default().to_string());
        }
        seen
    });

    let session = client_for(&url).join(alice()).await.expect("should join");
    assert_eq!(session.state(), SessionState::Joined);
    assert_eq!(session.room_code().as_str(), "ABC123");

    let mut updates = session.subscribe();
    subscribed_tx.send(()).expect("relay waiting");
    let update = tokio::time::timeout(Duration::from_secs(5), updates.recv())
        .await
        .expect("delta should arrive")
        .expect("channel open");
    assert!(matches!(
        update,
        SessionUpdate::Delta(StateDelta::ParticipantJoined(ref id)) if id.as_str() == "u2"
    ));

    let snapshot = session.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.participants.len(), 2);
    assert_eq!(
        snapshot.participant(&UserId::from("u2")).map(|p| p.language.as_str()),
        Some("French")
    );

    session.close().await;
    assert_eq!(session.state(), SessionState::Closed);

    let seen = relay.await.expect("relay task");
    assert_eq!(seen, vec!["leave-room".to_string()]);
}

#[tokio::test]
async fn test_join_room_full_is_rejection() {
    let (listener, url) = relay_listener().await;

    let relay = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        let _join = next_event(&mut ws).await.expect("join-room");
        send_event(
            &mut ws,
            json!({ "event": "room-full", "data": { "roomCode": "ABC123" } }),
        )
        .await;
        // The client closes the socket after a rejection.
        next_event(&mut ws).await
    });

    let err = client_for(&url).join(alice()).await.unwrap_err();
    assert!(err.is_rejection(), "unexpected error: {err}");
    assert!(err.to_string().contains("ABC123"));

    assert!(relay.await.expect("relay task").is_none());
}

#[tokio::test]
async fn test_join_unreachable_relay_fails() {
    let (listener, url) = relay_listener().await;
    drop(listener);

    let err = client_for(&url).join(alice()).await.unwrap_err();
    assert!(matches!(err, PolyroomError::Session(_)));
}

#[tokio::test]
async fn test_relay_hang_up_reports_disconnect() {
    let (listener, url) = relay_listener().await;
    let (subscribed_tx, subscribed_rx) = tokio::sync::oneshot::channel::<()>();

    let relay = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        let _join = next_event(&mut ws).await.expect("join-room");
        send_event(
            &mut ws,
            json!({
                "event": "joined-room",
                "data": { "roomCode": "ABC123", "userId": "u1", "users": [] }
            }),
        )
        .await;
        let _list = next_event(&mut ws).await;
        subscribed_rx.await.expect("test subscribed");
        ws.close(None).await.ok();
    });

    let session = client_for(&url).join(alice()).await.expect("should join");
    let mut updates = session.subscribe();
    subscribed_tx.send(()).expect("relay waiting");

    let disconnected = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match updates.recv().await {
                Ok(SessionUpdate::Disconnected { .. }) => return true,
                Ok(_) => continue,
                Err(_) => return false,
            }
        }
    })
    .await
    .expect("disconnect should be reported");
    assert!(disconnected);

    session.closed().await;
    assert_eq!(session.state(), SessionState::Closed);
    relay.await.expect("relay task");
}
