//! JSON documents posted to the notification endpoint.

use chrono::{DateTime, Utc};
use gocker_common::types::{ContainerUid, LifecycleEvent, LifecycleStatus, TrackedProcess};
use serde::{Deserialize, Serialize};

/// Runtime description attached to each reported container.
///
/// Serialized as the raw inspect output when available, or as an
/// `{"error": ...}` object when inspection failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuntimeMetadata {
    /// Output of `docker inspect`.
    Inspect(String),
    /// Inspection failed.
    Unavailable {
        /// Why the metadata is missing.
        error: String,
    },
}

/// Report for a single container inside a bulk payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerReport {
    /// Container identifier.
    pub container_id: ContainerUid,
    /// When the container was last seen.
    pub last_observation_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: LifecycleStatus,
    /// Runtime metadata gathered at notify time.
    pub runtime: RuntimeMetadata,
}

impl ContainerReport {
    /// Builds a report for `process`.
    #[must_use]
    pub fn new(
        process: &TrackedProcess,
        status: LifecycleStatus,
        runtime: RuntimeMetadata,
    ) -> Self {
        Self {
            container_id: process.uid.clone(),
            last_observation_at: process.last_observed_at,
            status,
            runtime,
        }
    }
}

/// Payload for a single container event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    /// Callback identifier of this agent.
    pub callback_id: String,
    /// The reported container.
    #[serde(flatten)]
    pub container: ContainerReport,
}

/// Payload listing every running container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkPayload {
    /// Callback identifier of this agent.
    pub callback_id: String,
    /// All containers in the snapshot.
    pub containers: Vec<ContainerReport>,
}

/// A payload together with the endpoint path it is posted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// One container changed.
    Status(StatusPayload),
    /// Full snapshot.
    Bulk(BulkPayload),
}

impl Notification {
    /// Path relative to the endpoint base URL.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Status(_) => "containers/status/",
            Self::Bulk(_) => "containers/status/all",
        }
    }

    /// Serializes the payload body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Self::Status(payload) => serde_json::to_string(payload),
            Self::Bulk(payload) => serde_json::to_string(payload),
        }
    }

    /// Builds the notification for `event`, resolving runtime metadata
    /// through `runtime`.
    pub fn from_event(
        event: &LifecycleEvent,
        callback_id: &str,
        mut runtime: impl FnMut(&TrackedProcess) -> RuntimeMetadata,
    ) -> Self {
        let status = event.status();
        match event {
            LifecycleEvent::New(process) | LifecycleEvent::Missing(process) => {
                Self::Status(StatusPayload {
                    callback_id: callback_id.to_string(),
                    container: ContainerReport::new(process, status, runtime(process)),
                })
            }
            LifecycleEvent::BulkSnapshot(processes) => Self::Bulk(BulkPayload {
                callback_id: callback_id.to_string(),
                containers: processes
                    .iter()
                    .map(|p| ContainerReport::new(p, status, runtime(p)))
                    .collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    const A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    fn process() -> TrackedProcess {
        TrackedProcess::new(
            ContainerUid::new(A).unwrap(),
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        )
    }

    fn inspected(_: &TrackedProcess) -> RuntimeMetadata {
        RuntimeMetadata::Inspect("[{\"Id\":\"a\"}]".into())
    }

    #[test]
    fn single_event_uses_flat_wire_shape() {
        let notification =
            Notification::from_event(&LifecycleEvent::New(process()), "cb-1", inspected);
        assert_eq!(notification.path(), "containers/status/");

        let body: Value = serde_json::from_str(&notification.to_json().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "callback_id": "cb-1",
                "container_id": A,
                "last_observation_at": "2023-11-14T22:13:20Z",
                "status": "new",
                "runtime": "[{\"Id\":\"a\"}]",
            })
        );
    }

    #[test]
    fn missing_event_reports_missing_status() {
        let notification =
            Notification::from_event(&LifecycleEvent::Missing(process()), "cb-1", inspected);
        let body: Value = serde_json::from_str(&notification.to_json().unwrap()).unwrap();
        assert_eq!(body["status"], "missing");
    }

    #[test]
    fn bulk_event_lists_containers_as_new() {
        let notification = Notification::from_event(
            &LifecycleEvent::BulkSnapshot(vec![process()]),
            "cb-1",
            inspected,
        );
        assert_eq!(notification.path(), "containers/status/all");

        let body: Value = serde_json::from_str(&notification.to_json().unwrap()).unwrap();
        assert_eq!(body["callback_id"], "cb-1");
        assert_eq!(body["containers"][0]["container_id"], A);
        assert_eq!(body["containers"][0]["status"], "new");
        assert!(body.get("container_id").is_none());
    }

    #[test]
    fn empty_bulk_event_serializes_empty_list() {
        let notification =
            Notification::from_event(&LifecycleEvent::BulkSnapshot(Vec::new()), "cb", inspected);
        let body: Value = serde_json::from_str(&notification.to_json().unwrap()).unwrap();
        assert_eq!(body, json!({"callback_id": "cb", "containers": []}));
    }

    #[test]
    fn unavailable_runtime_is_a_structured_marker() {
        let notification = Notification::from_event(&LifecycleEvent::New(process()), "cb", |_| {
            RuntimeMetadata::Unavailable {
                error: "no such container".into(),
            }
        });
        let body: Value = serde_json::from_str(&notification.to_json().unwrap()).unwrap();
        assert_eq!(body["runtime"], json!({"error": "no such container"}));
    }
}
