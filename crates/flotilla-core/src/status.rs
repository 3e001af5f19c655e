//! Status records and the change feed they produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TaskId;

/// Sort key of the single mutable "current snapshot" row per task. Other sort
/// key values denote historical log entries.
pub const CURRENT_SORT_KEY: &str = "STATUS";

/// Lifecycle state of a job.
///
/// The four named states cover jobs submitted through the API. Container
/// lifecycle labels from the orchestration platform are carried verbatim in
/// `Other` and never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    Queued,
    Running,
    Done,
    Failed,
    Other(String),
}

impl JobState {
    pub fn from_label(label: &str) -> Self {
        match label {
            "QUEUED" => JobState::Queued,
            "RUNNING" => JobState::Running,
            "DONE" => JobState::Done,
            "FAILED" => JobState::Failed,
            other => JobState::Other(other.to_string()),
        }
    }

    pub fn as_label(&self) -> &str {
        match self {
            JobState::Queued => "QUEUED",
            JobState::Running => "RUNNING",
            JobState::Done => "DONE",
            JobState::Failed => "FAILED",
            JobState::Other(label) => label,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }
}

impl From<String> for JobState {
    fn from(s: String) -> Self {
        Self::from_label(&s)
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        state.as_label().to_string()
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Category of a job or record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobType {
    Catalog,
    Purge,
    Container,
    Metric,
    Other(String),
}

impl JobType {
    pub fn from_label(label: &str) -> Self {
        match label {
            "CATALOG" => JobType::Catalog,
            "PURGE" => JobType::Purge,
            "CONTAINER" => JobType::Container,
            "METRIC" => JobType::Metric,
            other => JobType::Other(other.to_string()),
        }
    }

    pub fn as_label(&self) -> &str {
        match self {
            JobType::Catalog => "CATALOG",
            JobType::Purge => "PURGE",
            JobType::Container => "CONTAINER",
            JobType::Metric => "METRIC",
            JobType::Other(label) => label,
        }
    }
}

impl From<String> for JobType {
    fn from(s: String) -> Self {
        Self::from_label(&s)
    }
}

impl From<JobType> for String {
    fn from(job_type: JobType) -> Self {
        job_type.as_label().to_string()
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One status row: the current snapshot of a task, or a historical log entry.
///
/// At most one row exists per `(task_id, "STATUS")` pair; it is overwritten,
/// never duplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub task_id: TaskId,
    pub sort_key: String,
    pub state: JobState,
    pub job_type: JobType,
    pub processed: u64,
    pub total: u64,
    pub message: String,
    pub level: String,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StatusRecord {
    /// Build a current-snapshot record with zeroed progress counters.
    pub fn current(
        task_id: TaskId,
        state: JobState,
        job_type: JobType,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            sort_key: CURRENT_SORT_KEY.to_string(),
            state,
            job_type,
            processed: 0,
            total: 0,
            message: message.into(),
            level: "INFO".to_string(),
            started_at: now,
            updated_at: now,
        }
    }

    pub fn is_current(&self) -> bool {
        self.sort_key == CURRENT_SORT_KEY
    }
}

/// Kind of mutation observed on the status store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Insert,
    Modify,
}

/// One entry of the status store's change feed: the mutation kind plus the
/// new image of the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub record: StatusRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels_round_trip() {
        assert_eq!(JobState::from_label("RUNNING"), JobState::Running);
        assert_eq!(JobState::Running.as_label(), "RUNNING");
        assert_eq!(JobType::from_label("CATALOG"), JobType::Catalog);
    }

    #[test]
    fn test_platform_labels_are_opaque() {
        let state = JobState::from_label("DEPROVISIONING");
        assert_eq!(state, JobState::Other("DEPROVISIONING".to_string()));
        assert_eq!(state.as_label(), "DEPROVISIONING");
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_state_serializes_as_label() {
        let json = serde_json::to_string(&JobState::Queued).unwrap();
        assert_eq!(json, "\"QUEUED\"");
        let back: JobState = serde_json::from_str("\"STOPPED\"").unwrap();
        assert_eq!(back, JobState::Other("STOPPED".to_string()));
    }
}
