//! Event archive abstraction.

use async_trait::async_trait;

use crate::Result;
use crate::event::Envelope;

/// Durable, append-only archive of every ingested event, kept for audit and
/// replay over a fixed retention window. Write-only from the router's side.
#[async_trait]
pub trait EventArchive: Send + Sync {
    async fn record(&self, envelope: &Envelope) -> Result<()>;
}
