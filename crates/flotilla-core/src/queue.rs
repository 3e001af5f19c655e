//! Work queue abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::event::Envelope;

/// Approximate queue depth, sampled over the queue's averaging window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDepth {
    /// Messages delivered to no consumer yet.
    pub visible: u64,
    /// Messages delivered but not yet acknowledged.
    pub in_flight: u64,
}

impl QueueDepth {
    /// Total backlog: not-yet-delivered plus delivered-but-unacknowledged.
    pub fn backlog(&self) -> u64 {
        self.visible + self.in_flight
    }
}

/// The work queue feeding the (external) worker fleet.
///
/// `approx_depth` returns `None` when the depth metric produced no samples in
/// the averaging window; the autoscaler's two decision paths interpret that
/// absence differently, so it is not collapsed to zero here.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Enqueue a routed event for worker consumption.
    async fn enqueue(&self, envelope: &Envelope) -> Result<()>;

    /// Sample the approximate queue depth.
    async fn approx_depth(&self) -> Result<Option<QueueDepth>>;
}
