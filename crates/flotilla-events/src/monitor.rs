//! Container lifecycle monitoring.

use chrono::{DateTime, Utc};
use flotilla_core::event::ContainerNotification;
use flotilla_core::status::{CURRENT_SORT_KEY, JobState, JobType, StatusRecord};
use flotilla_core::{Result, TaskId};
use flotilla_db::{StatusStore, UpsertOutcome};
use tracing::{debug, info};

/// Detail type carried by container lifecycle events on the bus.
pub const CONTAINER_STATE_CHANGE: &str = "ContainerStateChange";

/// Consumes container state-change notifications and maintains both the
/// per-container current records and the aggregate active-worker count.
///
/// Container chatter is high-volume and highly repetitive, so two independent
/// dedup gates apply: repeated identical `(state, message)` pairs are not
/// written, and the aggregate metric is only written when the recomputed
/// count differs from the recorded one.
pub struct ContainerMonitor {
    store: StatusStore,
}

impl ContainerMonitor {
    pub fn new(store: StatusStore) -> Self {
        Self { store }
    }

    /// Handle one lifecycle notification.
    pub async fn observe(&self, notification: ContainerNotification) -> Result<()> {
        // Rule filtering normally happens upstream; this is the belt.
        if notification.task_arn.is_empty() || notification.group.is_empty() {
            debug!("Ignoring notification without task arn or group");
            return Ok(());
        }

        let task_id = TaskId::for_container(&notification.task_arn);
        let mut message = format!("Container {}", notification.last_status);
        if let Some(reason) = &notification.stopped_reason {
            message.push_str(": ");
            message.push_str(reason);
        }

        let now = Utc::now();
        let existing = self.store.get_current(&task_id).await?;
        let started_at = existing.map(|r| r.started_at).unwrap_or(now);

        let record = StatusRecord {
            task_id: task_id.clone(),
            sort_key: CURRENT_SORT_KEY.to_string(),
            // Platform lifecycle labels are opaque; carried verbatim.
            state: JobState::from_label(&notification.last_status),
            job_type: JobType::Container,
            processed: 0,
            total: 0,
            message,
            level: "INFO".to_string(),
            started_at,
            updated_at: now,
        };

        match self.store.upsert_if_changed(record).await? {
            UpsertOutcome::Suppressed => {
                debug!(task_id = %task_id, status = %notification.last_status, "Duplicate container status skipped");
            }
            UpsertOutcome::Written(_) => {
                info!(task_id = %task_id, status = %notification.last_status, "Container status recorded");
            }
        }

        // The count can change independently of whether this write landed,
        // so the aggregate is recomputed either way.
        self.refresh_active_count(now).await
    }

    /// Recompute the running-container count and write the synthetic metric
    /// record, unless the count matches the previously recorded value.
    async fn refresh_active_count(&self, now: DateTime<Utc>) -> Result<()> {
        let count = self.store.count_active(&JobType::Container).await?;
        let metric_id = TaskId::active_containers();
        let last = self.store.get_current(&metric_id).await?;

        if last.as_ref().map(|r| r.processed) == Some(count) {
            debug!(count, "Active-container metric unchanged, skipping");
            return Ok(());
        }

        let record = StatusRecord {
            task_id: metric_id,
            sort_key: CURRENT_SORT_KEY.to_string(),
            state: JobState::Running,
            job_type: JobType::Metric,
            processed: count,
            total: count,
            message: format!("Active containers: {}", count),
            level: "INFO".to_string(),
            started_at: last.map(|r| r.started_at).unwrap_or(now),
            updated_at: now,
        };
        self.store.put_current(record).await?;
        info!(count, "Active-container metric updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_core::status::ChangeEvent;
    use flotilla_db::memory::MemoryStatusRepo;
    use std::sync::Arc;
    use tokio::sync::broadcast;

    fn notification(arn: &str, status: &str, reason: Option<&str>) -> ContainerNotification {
        ContainerNotification {
            task_arn: arn.to_string(),
            last_status: status.to_string(),
            group: "service:flotilla-workers".to_string(),
            stopped_reason: reason.map(String::from),
        }
    }

    fn drain(feed: &mut broadcast::Receiver<ChangeEvent>) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = feed.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_duplicate_notification_writes_once() {
        let store = StatusStore::new(Arc::new(MemoryStatusRepo::new()));
        let monitor = ContainerMonitor::new(store.clone());
        let mut feed = store.subscribe();

        monitor
            .observe(notification("task/default/aaaabbbbcccc", "RUNNING", None))
            .await
            .unwrap();
        // One container record plus the first metric write (count 1).
        assert_eq!(drain(&mut feed).len(), 2);

        monitor
            .observe(notification("task/default/aaaabbbbcccc", "RUNNING", None))
            .await
            .unwrap();
        // Both gates suppress: no new events downstream.
        assert_eq!(drain(&mut feed).len(), 0);
    }

    #[tokio::test]
    async fn test_stopped_reason_changes_message() {
        let store = StatusStore::new(Arc::new(MemoryStatusRepo::new()));
        let monitor = ContainerMonitor::new(store.clone());

        monitor
            .observe(notification("task/default/aaaabbbbcccc", "STOPPED", None))
            .await
            .unwrap();
        monitor
            .observe(notification(
                "task/default/aaaabbbbcccc",
                "STOPPED",
                Some("Essential container exited"),
            ))
            .await
            .unwrap();

        let record = store
            .get_current(&TaskId::from("container-aaaabbbbcccc"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            record.message,
            "Container STOPPED: Essential container exited"
        );
    }

    #[tokio::test]
    async fn test_metric_tracks_running_count() {
        let store = StatusStore::new(Arc::new(MemoryStatusRepo::new()));
        let monitor = ContainerMonitor::new(store.clone());

        monitor
            .observe(notification("task/default/aaaabbbbcccc", "RUNNING", None))
            .await
            .unwrap();
        monitor
            .observe(notification("task/default/ddddeeeeffff", "RUNNING", None))
            .await
            .unwrap();

        let metric = store
            .get_current(&TaskId::active_containers())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(metric.processed, 2);
        assert_eq!(metric.job_type, JobType::Metric);
        assert_eq!(metric.message, "Active containers: 2");
    }

    #[tokio::test]
    async fn test_metric_suppressed_when_count_unchanged() {
        let store = StatusStore::new(Arc::new(MemoryStatusRepo::new()));
        let monitor = ContainerMonitor::new(store.clone());
        let mut feed = store.subscribe();

        // PENDING is not RUNNING: count stays 0, metric records 0.
        monitor
            .observe(notification("task/default/aaaabbbbcccc", "PENDING", None))
            .await
            .unwrap();
        assert_eq!(drain(&mut feed).len(), 2);

        // The container record changes (PENDING -> STOPPED) but the running
        // count is still 0, so only the container write goes downstream.
        monitor
            .observe(notification("task/default/aaaabbbbcccc", "STOPPED", None))
            .await
            .unwrap();
        assert_eq!(drain(&mut feed).len(), 1);
    }

    #[tokio::test]
    async fn test_notification_without_group_is_ignored() {
        let store = StatusStore::new(Arc::new(MemoryStatusRepo::new()));
        let monitor = ContainerMonitor::new(store.clone());

        let mut skipped = notification("task/default/aaaabbbbcccc", "RUNNING", None);
        skipped.group = String::new();
        monitor.observe(skipped).await.unwrap();

        assert!(
            store
                .get_current(&TaskId::from("container-aaaabbbbcccc"))
                .await
                .unwrap()
                .is_none()
        );
    }
}
