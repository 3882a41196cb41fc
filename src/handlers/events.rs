//! WebSocket bridge from the contract event bus.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::contract::{EventBus, EventStream};

/// Streams every contract event to the client as a JSON text frame.
pub async fn event_socket(ws: WebSocketUpgrade, State(events): State<EventBus>) -> Response {
    // Subscribe before the upgrade completes so nothing published after the
    // handshake response is missed
    let stream = events.stream();
    ws.on_upgrade(move |socket| forward_events(socket, stream))
}

async fn forward_events(socket: WebSocket, mut events: EventStream) {
    let (mut sender, mut receiver) = socket.split();
    debug!("event socket opened");

    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else { break };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "failed to encode contract event");
                        continue;
                    }
                };
                if sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    debug!("event socket closed");
}
