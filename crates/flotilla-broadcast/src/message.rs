//! The transport-agnostic message pushed to observers.

use chrono::{DateTime, Utc};
use flotilla_core::status::{JobState, JobType, StatusRecord};
use serde::{Deserialize, Serialize};

/// One status update as observers see it. Each message is idempotent state,
/// not a delta: a duplicate or dropped message leaves observers consistent
/// after the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    pub task_id: String,
    /// Update time of the change this message carries.
    pub timestamp: DateTime<Utc>,
    pub state: JobState,
    pub job_type: JobType,
    pub started_at: DateTime<Utc>,
    pub message: String,
    pub level: String,
    pub processed: u64,
    pub total: u64,
}

impl From<&StatusRecord> for StatusMessage {
    fn from(record: &StatusRecord) -> Self {
        Self {
            task_id: record.task_id.as_str().to_string(),
            timestamp: record.updated_at,
            state: record.state.clone(),
            job_type: record.job_type.clone(),
            started_at: record.started_at,
            message: record.message.clone(),
            level: record.level.clone(),
            processed: record.processed,
            total: record.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_core::TaskId;

    #[test]
    fn test_wire_format_is_camel_case() {
        let record = StatusRecord::current(
            TaskId::from("catalog-1"),
            JobState::Running,
            JobType::Catalog,
            "Scanning",
            Utc::now(),
        );
        let json = serde_json::to_value(StatusMessage::from(&record)).unwrap();
        assert_eq!(json["taskId"], "catalog-1");
        assert_eq!(json["jobType"], "CATALOG");
        assert_eq!(json["state"], "RUNNING");
        assert!(json.get("startedAt").is_some());
    }
}
