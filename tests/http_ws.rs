//! Full server round trip: REST mutations observed over a WebSocket.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_test::assert_ok;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use disaster_hub::api;
use disaster_hub::app_state::AppState;
use disaster_hub::hub::EventHub;
use disaster_hub::location::LocationResolver;
use disaster_hub::persistence::InMemoryStorage;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> SocketAddr {
    let hub = EventHub::new(32, Duration::from_secs(30));
    let state = AppState::new(
        Arc::new(InMemoryStorage::new()),
        LocationResolver::offline(),
        hub,
        50.0,
    );
    let listener = assert_ok!(tokio::net::TcpListener::bind("127.0.0.1:0").await);
    let addr = assert_ok!(listener.local_addr());
    tokio::spawn(async move {
        let _ = axum::serve(listener, api::build_app(state)).await;
    });
    addr
}

/// Reads text frames until one of `msg_type` arrives.
async fn next_of_type(socket: &mut Socket, msg_type: &str) -> Value {
    let read = async {
        while let Some(frame) = socket.next().await {
            let frame = assert_ok!(frame);
            let Ok(text) = frame.to_text() else {
                continue;
            };
            let Ok(value) = serde_json::from_str::<Value>(text) else {
                continue;
            };
            if value["type"] == msg_type {
                return value;
            }
        }
        panic!("socket closed before a `{msg_type}` message");
    };
    let Ok(value) = tokio::time::timeout(Duration::from_secs(5), read).await else {
        panic!("timed out waiting for a `{msg_type}` message");
    };
    value
}

async fn command(socket: &mut Socket, id: &str, payload: Value) -> Value {
    let text = json!({
        "id": id,
        "type": "command",
        "timestamp": chrono::Utc::now(),
        "payload": payload,
    })
    .to_string();
    assert_ok!(socket.send(Message::text(text)).await);
    next_of_type(socket, "response").await
}

#[tokio::test]
async fn room_member_sees_rest_update_as_event() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}/api/v1");

    let created = assert_ok!(
        client
            .post(format!("{base}/disasters"))
            .header("x-user-id", "citizen1")
            .json(&json!({
                "title": "NYC Flood",
                "description": "Heavy flooding in Manhattan",
                "tags": ["flood"],
            }))
            .send()
            .await
    );
    assert_eq!(created.status(), reqwest::StatusCode::CREATED);
    let body: Value = assert_ok!(created.json().await);
    let id = body["disaster"]["id"].clone();
    assert!(id.is_string());

    let (mut socket, _) = assert_ok!(tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await);
    let joined = command(
        &mut socket,
        "join-1",
        json!({"command": "join_disaster", "disaster_id": id}),
    )
    .await;
    assert_eq!(joined["id"], "join-1");
    assert_eq!(joined["payload"]["joined"], true);

    let updated = assert_ok!(
        client
            .put(format!("{base}/disasters/{}", id.as_str().unwrap_or_default()))
            .header("x-user-id", "citizen1")
            .json(&json!({"description": "Flooding spreading to Brooklyn"}))
            .send()
            .await
    );
    assert_eq!(updated.status(), reqwest::StatusCode::OK);

    let event = next_of_type(&mut socket, "event").await;
    assert_eq!(event["payload"]["event_type"], "disaster.updated");
    assert_eq!(event["payload"]["disaster_id"], id);
    assert_eq!(event["payload"]["payload"]["changes"], json!(["description"]));
}

#[tokio::test]
async fn requests_without_identity_are_rejected() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let anonymous = assert_ok!(
        client
            .post(format!("http://{addr}/api/v1/disasters"))
            .json(&json!({"title": "Fire", "description": "Brush fire"}))
            .send()
            .await
    );
    assert_eq!(anonymous.status(), reqwest::StatusCode::UNAUTHORIZED);

    let stranger = assert_ok!(
        client
            .get(format!("http://{addr}/api/v1/disasters"))
            .header("x-user-id", "nobody")
            .send()
            .await
    );
    assert_eq!(stranger.status(), reqwest::StatusCode::UNAUTHORIZED);

    let health = assert_ok!(client.get(format!("http://{addr}/health")).send().await);
    assert_eq!(health.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn urgent_alert_over_rest_reaches_idle_socket() {
    let addr = spawn_server().await;
    let (mut socket, _) = assert_ok!(tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await);

    // The subscriber registers once the upgrade task runs; a health probe
    // gives it a moment.
    let client = reqwest::Client::new();
    let mut subscribers = 0;
    for _ in 0..50 {
        let health: Value = assert_ok!(
            assert_ok!(client.get(format!("http://{addr}/health")).send().await)
                .json()
                .await
        );
        subscribers = health["subscribers"].as_u64().unwrap_or_default();
        if subscribers > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(subscribers, 1);

    let sent = assert_ok!(
        client
            .post(format!("http://{addr}/api/v1/alerts"))
            .header("x-user-id", "netrunnerX")
            .json(&json!({"message": "Evacuate low-lying areas"}))
            .send()
            .await
    );
    assert!(sent.status().is_success());

    let event = next_of_type(&mut socket, "event").await;
    assert_eq!(event["payload"]["event_type"], "urgent_alert");
    assert_eq!(event["payload"]["payload"]["message"], "Evacuate low-lying areas");
}
