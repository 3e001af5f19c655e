//! The deduplicating status store and its change feed.

use std::sync::Arc;

use flotilla_core::TaskId;
use flotilla_core::status::{ChangeEvent, ChangeKind, JobState, JobType, StatusRecord};
use tokio::sync::broadcast;
use tracing::debug;

use crate::DbResult;
use crate::repo::StatusRepo;

const CHANGE_FEED_CAPACITY: usize = 256;

/// Outcome of a compare-and-suppress upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Written(ChangeKind),
    /// The new value was observationally identical to the stored one; neither
    /// a write nor a change event was produced. A deliberate no-op.
    Suppressed,
}

/// Status store: current-snapshot rows with last-write-wins semantics per
/// task, plus a change feed carrying the new image of every observable
/// mutation.
///
/// The feed is best-effort; a subscriber that lags past the channel capacity
/// loses events, which downstream consumers must tolerate (observers treat
/// every message as idempotent state, not a delta).
#[derive(Clone)]
pub struct StatusStore {
    repo: Arc<dyn StatusRepo>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl StatusStore {
    pub fn new(repo: Arc<dyn StatusRepo>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { repo, changes }
    }

    /// Subscribe to the change feed.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    /// Overwrite the current snapshot unconditionally. Emits exactly one
    /// change event.
    pub async fn put_current(&self, record: StatusRecord) -> DbResult<ChangeKind> {
        let kind = self.repo.put_current(&record).await?;
        // No subscribers is fine; the feed is fan-out, not a required sink.
        let _ = self.changes.send(ChangeEvent { kind, record });
        Ok(kind)
    }

    /// Overwrite the current snapshot unless both `state` and `message` are
    /// unchanged, in which case the write and its broadcast are suppressed.
    pub async fn upsert_if_changed(&self, record: StatusRecord) -> DbResult<UpsertOutcome> {
        if let Some(existing) = self.repo.get_current(&record.task_id).await? {
            if existing.state == record.state && existing.message == record.message {
                debug!(task_id = %record.task_id, state = %record.state, "Unchanged status write suppressed");
                return Ok(UpsertOutcome::Suppressed);
            }
        }
        let kind = self.put_current(record).await?;
        Ok(UpsertOutcome::Written(kind))
    }

    pub async fn get_current(&self, task_id: &TaskId) -> DbResult<Option<StatusRecord>> {
        self.repo.get_current(task_id).await
    }

    pub async fn list_by_state(&self, state: &JobState, limit: i64) -> DbResult<Vec<StatusRecord>> {
        self.repo.list_by_state(state, limit).await
    }

    pub async fn list_by_job_type(
        &self,
        job_type: &JobType,
        limit: i64,
    ) -> DbResult<Vec<StatusRecord>> {
        self.repo.list_by_job_type(job_type, limit).await
    }

    pub async fn find_active(&self, exclude: &[JobType]) -> DbResult<Option<StatusRecord>> {
        self.repo.find_active(exclude).await
    }

    pub async fn count_active(&self, job_type: &JobType) -> DbResult<u64> {
        self.repo.count_active(job_type).await
    }
}
