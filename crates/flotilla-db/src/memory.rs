//! In-memory repository implementations for tests and local runs.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flotilla_core::TaskId;
use flotilla_core::archive::EventArchive;
use flotilla_core::catalog::{CatalogEntry, CatalogStore};
use flotilla_core::connection::ConnectionRecord;
use flotilla_core::event::Envelope;
use flotilla_core::queue::{QueueDepth, WorkQueue};
use flotilla_core::status::{ChangeKind, JobState, JobType, StatusRecord};

use crate::DbResult;
use crate::repo::{ConnectionRepo, StatusRepo};

/// Current-snapshot rows keyed by task id.
#[derive(Clone, Default)]
pub struct MemoryStatusRepo {
    records: Arc<Mutex<HashMap<String, StatusRecord>>>,
}

impl MemoryStatusRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusRepo for MemoryStatusRepo {
    async fn get_current(&self, task_id: &TaskId) -> DbResult<Option<StatusRecord>> {
        let records = self.records.lock().expect("status records poisoned");
        Ok(records.get(task_id.as_str()).cloned())
    }

    async fn put_current(&self, record: &StatusRecord) -> DbResult<ChangeKind> {
        let mut records = self.records.lock().expect("status records poisoned");
        let existed = records
            .insert(record.task_id.as_str().to_string(), record.clone())
            .is_some();
        Ok(if existed {
            ChangeKind::Modify
        } else {
            ChangeKind::Insert
        })
    }

    async fn list_by_state(&self, state: &JobState, limit: i64) -> DbResult<Vec<StatusRecord>> {
        let records = self.records.lock().expect("status records poisoned");
        let mut matched: Vec<StatusRecord> = records
            .values()
            .filter(|r| &r.state == state)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        matched.truncate(limit.max(0) as usize);
        Ok(matched)
    }

    async fn list_by_job_type(
        &self,
        job_type: &JobType,
        limit: i64,
    ) -> DbResult<Vec<StatusRecord>> {
        let records = self.records.lock().expect("status records poisoned");
        let mut matched: Vec<StatusRecord> = records
            .values()
            .filter(|r| &r.job_type == job_type)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        matched.truncate(limit.max(0) as usize);
        Ok(matched)
    }

    async fn find_active(&self, exclude: &[JobType]) -> DbResult<Option<StatusRecord>> {
        let records = self.records.lock().expect("status records poisoned");
        Ok(records
            .values()
            .filter(|r| r.state == JobState::Running && !exclude.contains(&r.job_type))
            .max_by_key(|r| r.updated_at)
            .cloned())
    }

    async fn count_active(&self, job_type: &JobType) -> DbResult<u64> {
        let records = self.records.lock().expect("status records poisoned");
        Ok(records
            .values()
            .filter(|r| r.state == JobState::Running && &r.job_type == job_type)
            .count() as u64)
    }
}

/// Connection records keyed by connection id.
#[derive(Clone, Default)]
pub struct MemoryConnectionRepo {
    connections: Arc<Mutex<HashMap<String, ConnectionRecord>>>,
}

impl MemoryConnectionRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRepo for MemoryConnectionRepo {
    async fn insert(&self, record: &ConnectionRecord) -> DbResult<()> {
        let mut connections = self.connections.lock().expect("connections poisoned");
        connections.insert(record.connection_id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, connection_id: &str) -> DbResult<()> {
        let mut connections = self.connections.lock().expect("connections poisoned");
        connections.remove(connection_id);
        Ok(())
    }

    async fn list_live(&self, now: DateTime<Utc>) -> DbResult<Vec<String>> {
        let connections = self.connections.lock().expect("connections poisoned");
        Ok(connections
            .values()
            .filter(|r| r.is_live(now))
            .map(|r| r.connection_id.clone())
            .collect())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let mut connections = self.connections.lock().expect("connections poisoned");
        let before = connections.len();
        connections.retain(|_, r| r.is_live(now));
        Ok((before - connections.len()) as u64)
    }
}

/// Work queue that keeps pending envelopes in a deque and counts claims.
#[derive(Clone, Default)]
pub struct MemoryWorkQueue {
    pending: Arc<Mutex<VecDeque<Envelope>>>,
    in_flight: Arc<Mutex<u64>>,
}

impl MemoryWorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the next pending envelope, moving it to in-flight.
    pub fn claim(&self) -> Option<Envelope> {
        let envelope = self.pending.lock().expect("queue poisoned").pop_front();
        if envelope.is_some() {
            *self.in_flight.lock().expect("in-flight poisoned") += 1;
        }
        envelope
    }

    /// Acknowledge one in-flight envelope.
    pub fn complete(&self) {
        let mut in_flight = self.in_flight.lock().expect("in-flight poisoned");
        *in_flight = in_flight.saturating_sub(1);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().expect("queue poisoned").len()
    }
}

#[async_trait]
impl WorkQueue for MemoryWorkQueue {
    async fn enqueue(&self, envelope: &Envelope) -> flotilla_core::Result<()> {
        self.pending
            .lock()
            .expect("queue poisoned")
            .push_back(envelope.clone());
        Ok(())
    }

    async fn approx_depth(&self) -> flotilla_core::Result<Option<QueueDepth>> {
        let visible = self.pending.lock().expect("queue poisoned").len() as u64;
        let in_flight = *self.in_flight.lock().expect("in-flight poisoned");
        Ok(Some(QueueDepth { visible, in_flight }))
    }
}

/// Archive that records envelopes for later inspection.
#[derive(Clone, Default)]
pub struct MemoryEventArchive {
    archived: Arc<Mutex<Vec<Envelope>>>,
}

impl MemoryEventArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn archived(&self) -> Vec<Envelope> {
        self.archived.lock().expect("archive poisoned").clone()
    }
}

#[async_trait]
impl EventArchive for MemoryEventArchive {
    async fn record(&self, envelope: &Envelope) -> flotilla_core::Result<()> {
        self.archived
            .lock()
            .expect("archive poisoned")
            .push(envelope.clone());
        Ok(())
    }
}

/// Catalog entries held in memory.
#[derive(Clone, Default)]
pub struct MemoryCatalogStore {
    entries: Arc<Mutex<Vec<CatalogEntry>>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: CatalogEntry) {
        self.entries.lock().expect("catalog poisoned").push(entry);
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn list_children(&self, parent_id: &str) -> flotilla_core::Result<Vec<CatalogEntry>> {
        let entries = self.entries.lock().expect("catalog poisoned");
        let mut children: Vec<CatalogEntry> = entries
            .iter()
            .filter(|e| e.parent_id == parent_id)
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }
}
