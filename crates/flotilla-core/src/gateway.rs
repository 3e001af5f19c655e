//! Transport gateway abstraction for observer connections.

use async_trait::async_trait;
use bytes::Bytes;

use crate::Result;

/// Outcome of a delivery attempt to one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// The peer is no longer reachable. Treated as a registry-cleanup signal,
    /// not an error to surface.
    Gone,
}

/// Pushes payloads to observer connections by their opaque ids.
///
/// Any transport failure other than a gone peer surfaces as `Err` and is the
/// caller's to log and ignore.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn send(&self, connection_id: &str, payload: Bytes) -> Result<SendOutcome>;
}
