//! Observer connection records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One live observer connection.
///
/// Created on connect with a fixed-duration expiry, deleted on explicit
/// disconnect or when a delivery attempt reports the peer gone. No other
/// mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Opaque handle issued by the transport gateway.
    pub connection_id: String,
    /// Absolute expiry instant; eligible for garbage collection after this.
    pub expires_at: DateTime<Utc>,
}

impl ConnectionRecord {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
