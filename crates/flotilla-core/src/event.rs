//! Structured events flowing through the router and the container monitor.

use serde::{Deserialize, Serialize};

/// A routed event: source, detail type, and an opaque payload.
///
/// The `detail-type` spelling on the wire matches what producers and the
/// worker already exchange over the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub source: String,
    #[serde(rename = "detail-type")]
    pub detail_type: String,
    pub detail: serde_json::Value,
}

impl Envelope {
    pub fn new(
        source: impl Into<String>,
        detail_type: impl Into<String>,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            source: source.into(),
            detail_type: detail_type.into(),
            detail,
        }
    }
}

/// A container lifecycle notification from the orchestration platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerNotification {
    pub task_arn: String,
    pub last_status: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub stopped_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_field_names() {
        let envelope = Envelope::new("flotilla.pipeline", "NoOp", json!({}));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["detail-type"], "NoOp");
        assert_eq!(json["source"], "flotilla.pipeline");
    }

    #[test]
    fn test_notification_parses_platform_event() {
        let notification: ContainerNotification = serde_json::from_value(json!({
            "taskArn": "arn:aws:ecs:us-east-1:1234:task/default/deadbeef0123",
            "lastStatus": "STOPPED",
            "group": "service:flotilla-workers",
            "stoppedReason": "Essential container exited",
        }))
        .unwrap();
        assert_eq!(notification.last_status, "STOPPED");
        assert_eq!(
            notification.stopped_reason.as_deref(),
            Some("Essential container exited")
        );
    }
}
