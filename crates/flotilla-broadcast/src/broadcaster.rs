//! Change-feed fan-out to observer connections.

use std::sync::Arc;

use bytes::Bytes;
use flotilla_core::gateway::{Gateway, SendOutcome};
use flotilla_core::status::ChangeEvent;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::message::StatusMessage;
use crate::registry::ConnectionRegistry;

/// Per-batch fan-out limit; deliveries within a batch run concurrently up to
/// this many at a time.
const FAN_OUT_CONCURRENCY: usize = 16;

/// Pushes every status change to all live observer connections.
///
/// Delivery is best-effort, at-most-once per change per connection: each
/// destination fails independently, a gone peer is removed from the registry
/// on the spot, any other failure is logged and ignored. There is no retry,
/// no backoff, and no ordering guarantee between connections or between
/// successive change events.
pub struct Broadcaster {
    registry: ConnectionRegistry,
    gateway: Arc<dyn Gateway>,
}

impl Broadcaster {
    pub fn new(registry: ConnectionRegistry, gateway: Arc<dyn Gateway>) -> Self {
        Self { registry, gateway }
    }

    /// Handle one change-feed batch.
    ///
    /// Connections are listed once per batch; a scan racing a concurrent
    /// disconnect may produce one final delivery attempt to a just-removed
    /// connection, which the gateway reports as gone.
    pub async fn on_status_change(&self, events: &[ChangeEvent]) {
        if events.is_empty() {
            return;
        }

        let connection_ids = match self.registry.live_connections().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Failed to list connections");
                return;
            }
        };
        if connection_ids.is_empty() {
            debug!("No live observers");
            return;
        }

        for event in events {
            let message = StatusMessage::from(&event.record);
            let payload = match serde_json::to_vec(&message) {
                Ok(bytes) => Bytes::from(bytes),
                Err(e) => {
                    warn!(task_id = %event.record.task_id, error = %e, "Failed to serialize status update");
                    continue;
                }
            };

            futures::stream::iter(&connection_ids)
                .for_each_concurrent(FAN_OUT_CONCURRENCY, |connection_id| {
                    let payload = payload.clone();
                    async move { self.deliver(connection_id, payload).await }
                })
                .await;
        }
    }

    async fn deliver(&self, connection_id: &str, payload: Bytes) {
        match self.gateway.send(connection_id, payload).await {
            Ok(SendOutcome::Delivered) => {}
            Ok(SendOutcome::Gone) => {
                info!(connection_id, "Connection gone, removing");
                if let Err(e) = self.registry.on_disconnect(connection_id).await {
                    warn!(connection_id, error = %e, "Failed to remove gone connection");
                }
            }
            Err(e) => {
                warn!(connection_id, error = %e, "Failed to deliver status update");
            }
        }
    }
}
