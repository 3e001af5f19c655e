//! WebSocket handling for the live status feed.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;

const OUTBOUND_BUFFER: usize = 32;

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One observer connection: registered on open, fed by the broadcaster
/// through the gateway, removed on close or error. The feed is push-only;
/// inbound frames other than close are ignored.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::now_v7().to_string();
    let (tx, mut rx) = mpsc::channel::<Message>(OUTBOUND_BUFFER);

    state.gateway.register(&connection_id, tx).await;
    if let Err(e) = state.registry.on_connect(&connection_id).await {
        warn!(connection_id = %connection_id, error = %e, "Failed to register connection");
        state.gateway.deregister(&connection_id).await;
        return;
    }
    info!(connection_id = %connection_id, "WebSocket connection established");

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(message) => {
                    if sink.send(message).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Close(_))) | None => {
                    info!(connection_id = %connection_id, "WebSocket connection closed");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                    break;
                }
            },
        }
    }

    state.gateway.deregister(&connection_id).await;
    if let Err(e) = state.registry.on_disconnect(&connection_id).await {
        warn!(connection_id = %connection_id, error = %e, "Failed to remove connection");
    }
}
