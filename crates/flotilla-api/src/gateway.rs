//! In-process WebSocket transport gateway.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::Message;
use bytes::Bytes;
use flotilla_core::gateway::{Gateway, SendOutcome};
use tokio::sync::{RwLock, mpsc};

/// Routes payloads to open WebSocket connections by their ids.
///
/// Each socket task registers an outbound channel on open and deregisters on
/// close. An unknown id, or a channel whose socket task has ended, reports
/// the peer gone.
#[derive(Clone, Default)]
pub struct WsGateway {
    senders: Arc<RwLock<HashMap<String, mpsc::Sender<Message>>>>,
}

impl WsGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, connection_id: &str, sender: mpsc::Sender<Message>) {
        let mut senders = self.senders.write().await;
        senders.insert(connection_id.to_string(), sender);
    }

    pub async fn deregister(&self, connection_id: &str) {
        let mut senders = self.senders.write().await;
        senders.remove(connection_id);
    }
}

#[async_trait]
impl Gateway for WsGateway {
    async fn send(&self, connection_id: &str, payload: Bytes) -> flotilla_core::Result<SendOutcome> {
        let sender = {
            let senders = self.senders.read().await;
            senders.get(connection_id).cloned()
        };

        let Some(sender) = sender else {
            return Ok(SendOutcome::Gone);
        };

        let text = String::from_utf8(payload.to_vec())
            .map_err(|e| flotilla_core::Error::Transport(e.to_string()))?;
        match sender.send(Message::Text(text.into())).await {
            Ok(()) => Ok(SendOutcome::Delivered),
            // The socket task dropped its receiver: the peer is gone.
            Err(_) => Ok(SendOutcome::Gone),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_connection_is_gone() {
        let gateway = WsGateway::new();
        let outcome = gateway.send("missing", Bytes::from("{}")).await.unwrap();
        assert_eq!(outcome, SendOutcome::Gone);
    }

    #[tokio::test]
    async fn test_registered_connection_receives_payload() {
        let gateway = WsGateway::new();
        let (tx, mut rx) = mpsc::channel(4);
        gateway.register("conn-1", tx).await;

        let outcome = gateway
            .send("conn-1", Bytes::from(r#"{"state":"RUNNING"}"#))
            .await
            .unwrap();
        assert_eq!(outcome, SendOutcome::Delivered);

        match rx.recv().await.unwrap() {
            Message::Text(text) => assert!(text.contains("RUNNING")),
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dropped_receiver_reports_gone() {
        let gateway = WsGateway::new();
        let (tx, rx) = mpsc::channel(4);
        gateway.register("conn-1", tx).await;
        drop(rx);

        let outcome = gateway.send("conn-1", Bytes::from("{}")).await.unwrap();
        assert_eq!(outcome, SendOutcome::Gone);
    }
}
