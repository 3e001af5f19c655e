//! Task identifiers.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::JobType;

/// Task id of the synthetic record that aggregates the running-container count.
pub const ACTIVE_CONTAINERS_TASK_ID: &str = "system-active-containers";

/// A stable identifier for one job or aggregate metric.
///
/// Task ids are the partition key of the status store. Submitted jobs get a
/// `{jobtype}-{uuidv7}` id; container tasks derive a stable id from the
/// orchestrator-assigned task identifier so repeated notifications for the
/// same task land on the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh id for a submitted job. Uses UUIDv7 for time-ordered ids.
    pub fn generate(job_type: &JobType) -> Self {
        Self(format!(
            "{}-{}",
            job_type.as_label().to_ascii_lowercase(),
            Uuid::now_v7()
        ))
    }

    /// Derive the stable id for a container task: the last 12 characters of
    /// the trailing path segment of the platform task identifier, prefixed.
    pub fn for_container(task_arn: &str) -> Self {
        let segment = task_arn.rsplit('/').next().unwrap_or(task_arn);
        let start = segment
            .char_indices()
            .rev()
            .nth(11)
            .map(|(i, _)| i)
            .unwrap_or(0);
        Self(format!("container-{}", &segment[start..]))
    }

    /// Id of the aggregate active-container metric record.
    pub fn active_containers() -> Self {
        Self(ACTIVE_CONTAINERS_TASK_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_id_uses_arn_suffix() {
        let id = TaskId::for_container(
            "arn:aws:ecs:us-east-1:123456789012:task/default/abcdef0123456789abcdef01",
        );
        assert_eq!(id.as_str(), "container-6789abcdef01");
    }

    #[test]
    fn test_container_id_short_segment() {
        let id = TaskId::for_container("task/short");
        assert_eq!(id.as_str(), "container-short");
    }

    #[test]
    fn test_generated_id_carries_job_type_prefix() {
        let id = TaskId::generate(&JobType::Catalog);
        assert!(id.as_str().starts_with("catalog-"));
    }
}
