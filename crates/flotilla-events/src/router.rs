//! Event ingestion and routing.

use std::collections::HashSet;
use std::sync::Arc;

use flotilla_config::EventsConfig;
use flotilla_core::archive::EventArchive;
use flotilla_core::event::Envelope;
use flotilla_core::queue::WorkQueue;
use tracing::{debug, warn};

/// Allow-list of `(source, detail-type)` pairs copied onto the work queue.
/// Matching is exact-set membership; no wildcards, no content inspection.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    allow: HashSet<(String, String)>,
}

impl RouteTable {
    pub fn new<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            allow: pairs
                .into_iter()
                .map(|(source, detail_type)| (source.into(), detail_type.into()))
                .collect(),
        }
    }

    pub fn from_config(config: &EventsConfig) -> Self {
        Self::new(
            config
                .forward
                .iter()
                .map(|detail_type| (config.source.clone(), detail_type.clone())),
        )
    }

    pub fn allows(&self, envelope: &Envelope) -> bool {
        self.allow
            .contains(&(envelope.source.clone(), envelope.detail_type.clone()))
    }
}

/// What happened to an ingested event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Archived and copied onto the work queue.
    Forwarded,
    /// Archived only; the event did not match the allow-list (or the queue
    /// was unavailable).
    ArchivedOnly,
}

/// Ingests one event at a time: every event is archived for audit/replay,
/// allow-listed events are additionally forwarded to the work queue.
///
/// Fire-and-forget: the archive and forward attempts are independent, a
/// failure in either is logged and does not block the other, and there is no
/// read API. An unroutable event is archived without raising an alert.
pub struct EventRouter {
    archive: Arc<dyn EventArchive>,
    queue: Arc<dyn WorkQueue>,
    routes: RouteTable,
}

impl EventRouter {
    pub fn new(archive: Arc<dyn EventArchive>, queue: Arc<dyn WorkQueue>, routes: RouteTable) -> Self {
        Self {
            archive,
            queue,
            routes,
        }
    }

    pub async fn ingest(&self, envelope: Envelope) -> RouteOutcome {
        if let Err(e) = self.archive.record(&envelope).await {
            warn!(
                source = %envelope.source,
                detail_type = %envelope.detail_type,
                error = %e,
                "Failed to archive event"
            );
        }

        if !self.routes.allows(&envelope) {
            debug!(
                source = %envelope.source,
                detail_type = %envelope.detail_type,
                "Event archived only"
            );
            return RouteOutcome::ArchivedOnly;
        }

        match self.queue.enqueue(&envelope).await {
            Ok(()) => RouteOutcome::Forwarded,
            Err(e) => {
                warn!(
                    source = %envelope.source,
                    detail_type = %envelope.detail_type,
                    error = %e,
                    "Failed to enqueue event"
                );
                RouteOutcome::ArchivedOnly
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_db::memory::{MemoryEventArchive, MemoryWorkQueue};
    use serde_json::json;

    fn router(queue: &MemoryWorkQueue, archive: &MemoryEventArchive) -> EventRouter {
        EventRouter::new(
            Arc::new(archive.clone()),
            Arc::new(queue.clone()),
            RouteTable::new([
                ("flotilla.pipeline", "CatalogRequested"),
                ("flotilla.pipeline", "NoOp"),
            ]),
        )
    }

    #[tokio::test]
    async fn test_allow_listed_event_is_archived_and_forwarded() {
        let queue = MemoryWorkQueue::new();
        let archive = MemoryEventArchive::new();
        let outcome = router(&queue, &archive)
            .ingest(Envelope::new(
                "flotilla.pipeline",
                "CatalogRequested",
                json!({"taskId": "catalog-1"}),
            ))
            .await;

        assert_eq!(outcome, RouteOutcome::Forwarded);
        assert_eq!(archive.archived().len(), 1);
        assert_eq!(queue.pending_len(), 1);
    }

    #[tokio::test]
    async fn test_unmatched_event_is_archived_only() {
        let queue = MemoryWorkQueue::new();
        let archive = MemoryEventArchive::new();
        let outcome = router(&queue, &archive)
            .ingest(Envelope::new(
                "flotilla.pipeline",
                "ComputeNodeDirty",
                json!({}),
            ))
            .await;

        assert_eq!(outcome, RouteOutcome::ArchivedOnly);
        assert_eq!(archive.archived().len(), 1);
        assert_eq!(queue.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_matching_is_on_source_and_detail_type() {
        let queue = MemoryWorkQueue::new();
        let archive = MemoryEventArchive::new();
        // Right detail type, wrong source.
        let outcome = router(&queue, &archive)
            .ingest(Envelope::new("other.bus", "CatalogRequested", json!({})))
            .await;

        assert_eq!(outcome, RouteOutcome::ArchivedOnly);
        assert_eq!(queue.pending_len(), 0);
    }
}
