//! Live observer connection tracking.

use std::sync::Arc;

use chrono::{Duration, Utc};
use flotilla_core::Result;
use flotilla_core::connection::ConnectionRecord;
use flotilla_db::ConnectionRepo;
use tracing::{debug, info};

/// Tracks observer connections with a fixed-duration expiry.
///
/// Per-connection lifecycle: connected, then removed on explicit disconnect,
/// on expiry, or when a delivery attempt reports the peer gone. The registry
/// tolerates concurrent insert/delete/scan without coordination beyond the
/// underlying store's per-key atomicity.
#[derive(Clone)]
pub struct ConnectionRegistry {
    repo: Arc<dyn ConnectionRepo>,
    ttl: Duration,
}

impl ConnectionRegistry {
    pub fn new(repo: Arc<dyn ConnectionRepo>, ttl_secs: u64) -> Self {
        Self {
            repo,
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    pub async fn on_connect(&self, connection_id: &str) -> Result<()> {
        let record = ConnectionRecord {
            connection_id: connection_id.to_string(),
            expires_at: Utc::now() + self.ttl,
        };
        self.repo.insert(&record).await?;
        info!(connection_id, "Observer connected");
        Ok(())
    }

    /// Idempotent removal; also used when a delivery reports the peer gone.
    pub async fn on_disconnect(&self, connection_id: &str) -> Result<()> {
        self.repo.delete(connection_id).await?;
        info!(connection_id, "Observer removed");
        Ok(())
    }

    /// Ids of all connections whose expiry is still in the future.
    pub async fn live_connections(&self) -> Result<Vec<String>> {
        Ok(self.repo.list_live(Utc::now()).await?)
    }

    /// Garbage-collect expired records.
    pub async fn sweep_expired(&self) -> Result<u64> {
        let dropped = self.repo.delete_expired(Utc::now()).await?;
        if dropped > 0 {
            debug!(dropped, "Swept expired connections");
        }
        Ok(dropped)
    }
}
