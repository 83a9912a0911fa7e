//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands to the hub and forwarding the events
//! queued for this subscriber.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;

use super::messages::{WsCommand, WsMessage};
use crate::domain::EventType;
use crate::hub::{EventHub, SubscriberId, Subscription};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Registers the connection as a hub subscriber.
/// - Reads commands from the client and dispatches them.
/// - Forwards events queued for the subscriber to the client.
/// - On close, removes the subscriber from every room and stops the
///   monitoring sessions it started.
pub async fn run_connection(socket: WebSocket, hub: EventHub) {
    let Subscription {
        id: subscriber,
        mut events,
    } = hub.connect().await;
    let (mut ws_tx, mut ws_rx) = socket.split();
    tracing::info!(%subscriber, "ws client connected");

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, subscriber, &hub).await;
                        if !send(&mut ws_tx, &reply).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(%subscriber, error = %e, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            // Event queued by the hub
            event = events.recv() => {
                match event {
                    Some(event) => {
                        if !send(&mut ws_tx, &WsMessage::event(&event)).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    hub.on_disconnect(subscriber).await;
    tracing::info!(%subscriber, "ws client disconnected");
}

async fn send<S>(ws_tx: &mut S, msg: &WsMessage) -> bool
where
    S: futures_util::Sink<Message> + Unpin,
{
    match serde_json::to_string(msg) {
        Ok(json) => ws_tx.send(Message::text(json)).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize ws message");
            true
        }
    }
}

/// Parses one client message and runs its command.
async fn handle_text_message(text: &str, subscriber: SubscriberId, hub: &EventHub) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error("", 400, "malformed JSON");
    };
    match serde_json::from_value::<WsCommand>(msg.payload) {
        Ok(command) => WsMessage::response(msg.id, dispatch(command, subscriber, hub).await),
        Err(e) => WsMessage::error(msg.id, 400, format!("invalid command: {e}")),
    }
}

/// Runs `command` for `subscriber` and returns the response payload.
pub async fn dispatch(command: WsCommand, subscriber: SubscriberId, hub: &EventHub) -> serde_json::Value {
    match command {
        WsCommand::JoinDisaster { disaster_id } => {
            let joined = hub.join(subscriber, disaster_id).await;
            json!({
                "command": "join_disaster",
                "disaster_id": disaster_id,
                "joined": joined,
                "message": format!("Joined disaster {disaster_id} updates"),
            })
        }
        WsCommand::LeaveDisaster { disaster_id } => {
            let left = hub.leave(subscriber, disaster_id).await;
            json!({
                "command": "leave_disaster",
                "disaster_id": disaster_id,
                "left": left,
            })
        }
        WsCommand::StartMonitoring {
            disaster_id,
            keywords,
        } => {
            let status = hub.start_monitoring(disaster_id, keywords, subscriber).await;
            json!({
                "command": "start_monitoring",
                "disaster_id": disaster_id,
                "status": status,
                "message": status.message(),
            })
        }
        WsCommand::StopMonitoring { disaster_id } => {
            let status = hub.stop_monitoring(disaster_id).await;
            json!({
                "command": "stop_monitoring",
                "disaster_id": disaster_id,
                "status": status,
                "message": status.message(),
            })
        }
        WsCommand::UrgentAlert {
            disaster_id,
            message,
            location,
        } => {
            let delivered = hub
                .publish_global(
                    disaster_id,
                    json!({
                        "message": message,
                        "location": location,
                        "source": subscriber,
                    }),
                )
                .await;
            tracing::warn!(%subscriber, delivered, "urgent alert broadcast");
            json!({ "command": "urgent_alert", "delivered": delivered })
        }
        WsCommand::ReportUpdate {
            disaster_id,
            reports,
        } => {
            let delivered = hub
                .publish_to_room(disaster_id, EventType::ReportsUpdated, json!({ "reports": reports }))
                .await;
            json!({ "command": "report_update", "disaster_id": disaster_id, "delivered": delivered })
        }
        WsCommand::ResourceUpdate {
            disaster_id,
            resources,
        } => {
            let delivered = hub
                .publish_to_room(
                    disaster_id,
                    EventType::ResourcesUpdated,
                    json!({ "resources": resources }),
                )
                .await;
            json!({ "command": "resource_update", "disaster_id": disaster_id, "delivered": delivered })
        }
    }
}
