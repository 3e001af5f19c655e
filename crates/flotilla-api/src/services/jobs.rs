//! Job submission and active-job queries.

use std::sync::Arc;

use chrono::Utc;
use flotilla_core::event::Envelope;
use flotilla_core::status::{JobState, JobType, StatusRecord};
use flotilla_core::{Error, Result, TaskId};
use flotilla_db::StatusStore;
use flotilla_events::EventRouter;
use serde_json::json;
use tracing::info;

/// Job types whose records are operator-visible jobs rather than container
/// chatter or synthetic metrics; active-job queries exclude everything else.
const NON_JOB_TYPES: [JobType; 2] = [JobType::Container, JobType::Metric];

pub struct JobService {
    store: StatusStore,
    router: Arc<EventRouter>,
    source: String,
}

impl JobService {
    pub fn new(store: StatusStore, router: Arc<EventRouter>, source: impl Into<String>) -> Self {
        Self {
            store,
            router,
            source: source.into(),
        }
    }

    /// Submit a job: write the QUEUED current record, then route the request
    /// event toward the work queue. Refuses while another job is running.
    pub async fn submit(&self, job_type: JobType) -> Result<TaskId> {
        let detail_type = match job_type {
            JobType::Catalog => "CatalogRequested",
            JobType::Purge => "PurgeRequested",
            other => {
                return Err(Error::InvalidInput(format!(
                    "job type {} cannot be submitted",
                    other
                )));
            }
        };

        if let Some(active) = self.store.find_active(&NON_JOB_TYPES).await? {
            return Err(Error::Conflict(format!(
                "job {} is already running",
                active.task_id
            )));
        }

        let task_id = TaskId::generate(&job_type);
        let now = Utc::now();
        let record = StatusRecord::current(
            task_id.clone(),
            JobState::Queued,
            job_type.clone(),
            "Queued",
            now,
        );
        self.store.put_current(record).await?;

        let envelope = Envelope::new(
            self.source.clone(),
            detail_type,
            json!({
                "taskId": task_id.as_str(),
                "jobType": job_type.as_label(),
                "startedAt": now.to_rfc3339(),
            }),
        );
        self.router.ingest(envelope).await;

        info!(task_id = %task_id, job_type = %job_type, "Job submitted");
        Ok(task_id)
    }

    /// The most recently updated RUNNING job, if any.
    pub async fn active(&self) -> Result<Option<StatusRecord>> {
        Ok(self.store.find_active(&NON_JOB_TYPES).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use flotilla_broadcast::{Broadcaster, ConnectionRegistry};
    use flotilla_core::gateway::{Gateway, SendOutcome};
    use flotilla_core::status::{CURRENT_SORT_KEY, ChangeEvent};
    use flotilla_db::memory::{
        MemoryConnectionRepo, MemoryEventArchive, MemoryStatusRepo, MemoryWorkQueue,
    };
    use flotilla_events::RouteTable;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::broadcast;

    #[derive(Default)]
    struct RecordingGateway {
        delivered: Mutex<HashMap<String, Vec<String>>>,
    }

    #[async_trait]
    impl Gateway for RecordingGateway {
        async fn send(&self, connection_id: &str, payload: Bytes) -> Result<SendOutcome> {
            self.delivered
                .lock()
                .unwrap()
                .entry(connection_id.to_string())
                .or_default()
                .push(String::from_utf8(payload.to_vec()).unwrap());
            Ok(SendOutcome::Delivered)
        }
    }

    struct Pipeline {
        store: StatusStore,
        queue: MemoryWorkQueue,
        jobs: JobService,
        registry: ConnectionRegistry,
        broadcaster: Broadcaster,
        gateway: Arc<RecordingGateway>,
        feed: broadcast::Receiver<ChangeEvent>,
    }

    fn pipeline() -> Pipeline {
        let store = StatusStore::new(Arc::new(MemoryStatusRepo::new()));
        let queue = MemoryWorkQueue::new();
        let router = Arc::new(EventRouter::new(
            Arc::new(MemoryEventArchive::new()),
            Arc::new(queue.clone()),
            RouteTable::new([
                ("flotilla.pipeline", "CatalogRequested"),
                ("flotilla.pipeline", "PurgeRequested"),
            ]),
        ));
        let jobs = JobService::new(store.clone(), router, "flotilla.pipeline");
        let registry = ConnectionRegistry::new(Arc::new(MemoryConnectionRepo::new()), 7200);
        let gateway = Arc::new(RecordingGateway::default());
        let broadcaster = Broadcaster::new(registry.clone(), gateway.clone());
        let feed = store.subscribe();
        Pipeline {
            store,
            queue,
            jobs,
            registry,
            broadcaster,
            gateway,
            feed,
        }
    }

    /// Forward everything the store emitted so far to the broadcaster, the
    /// way the server's change-feed pump does.
    async fn pump(p: &mut Pipeline) {
        let mut events = Vec::new();
        while let Ok(event) = p.feed.try_recv() {
            events.push(event);
        }
        p.broadcaster.on_status_change(&events).await;
    }

    /// Simulate the external worker mutating a job's current record.
    async fn worker_transition(p: &Pipeline, task_id: &TaskId, state: JobState, message: &str) {
        let mut record = p.store.get_current(task_id).await.unwrap().unwrap();
        record.state = state;
        record.message = message.to_string();
        record.updated_at = Utc::now();
        p.store.put_current(record).await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_writes_queued_record_and_enqueues() {
        let p = pipeline();
        let task_id = p.jobs.submit(JobType::Catalog).await.unwrap();

        let record = p.store.get_current(&task_id).await.unwrap().unwrap();
        assert_eq!(record.state, JobState::Queued);
        assert_eq!(record.job_type, JobType::Catalog);
        assert_eq!(record.sort_key, CURRENT_SORT_KEY);
        assert_eq!(p.queue.pending_len(), 1);
    }

    #[tokio::test]
    async fn test_submit_rejects_unsubmittable_job_type() {
        let p = pipeline();
        let result = p.jobs.submit(JobType::Container).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_submit_conflicts_while_a_job_runs() {
        let p = pipeline();
        let task_id = p.jobs.submit(JobType::Catalog).await.unwrap();
        worker_transition(&p, &task_id, JobState::Running, "Scanning").await;

        let result = p.jobs.submit(JobType::Purge).await;
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_catalog_job_lifecycle_end_to_end() {
        let mut p = pipeline();
        p.registry.on_connect("conn-1").await.unwrap();
        p.registry.on_connect("conn-2").await.unwrap();

        // Submission is visible immediately and broadcast once.
        let task_id = p.jobs.submit(JobType::Catalog).await.unwrap();
        pump(&mut p).await;

        // The worker claims the routed request and picks the job up.
        let claimed = p.queue.claim().unwrap();
        assert_eq!(claimed.detail_type, "CatalogRequested");
        assert_eq!(claimed.detail["taskId"], task_id.as_str());

        worker_transition(&p, &task_id, JobState::Running, "Scanning inputs").await;
        pump(&mut p).await;

        let active = p.jobs.active().await.unwrap().unwrap();
        assert_eq!(active.task_id, task_id);

        worker_transition(&p, &task_id, JobState::Done, "Catalog complete").await;
        p.queue.complete();
        pump(&mut p).await;

        assert!(p.jobs.active().await.unwrap().is_none());

        // Each transition produced exactly one broadcast per live connection.
        let delivered = p.gateway.delivered.lock().unwrap();
        for conn in ["conn-1", "conn-2"] {
            let messages = delivered.get(conn).unwrap();
            assert_eq!(messages.len(), 3);
            assert!(messages[0].contains("QUEUED"));
            assert!(messages[1].contains("RUNNING"));
            assert!(messages[2].contains("DONE"));
        }
    }

    #[tokio::test]
    async fn test_metric_records_do_not_mask_active_query() {
        let p = pipeline();
        // A RUNNING metric record exists, but it is not a job.
        p.store
            .put_current(StatusRecord {
                processed: 3,
                total: 3,
                ..StatusRecord::current(
                    TaskId::active_containers(),
                    JobState::Running,
                    JobType::Metric,
                    "Active containers: 3",
                    Utc::now(),
                )
            })
            .await
            .unwrap();

        assert!(p.jobs.active().await.unwrap().is_none());
    }
}
