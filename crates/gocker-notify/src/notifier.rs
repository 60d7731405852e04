//! HTTP notifier.
//!
//! Each event becomes exactly one POST. Failures are reported to the caller
//! (or logged, when used as an [`EventSink`]) and never retried: the
//! monitoring loop must keep running whatever state the endpoint is in.

use std::sync::Arc;

use gocker_common::types::{LifecycleEvent, TrackedProcess};
use gocker_runtime::monitor::EventSink;
use gocker_runtime::source::ContainerInspector;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::error::{NotifyError, Result};
use crate::payload::{Notification, RuntimeMetadata};

/// Header carrying the per-request identifier.
pub const REQUEST_ID_HEADER: &str = "Request-Id";

/// Delivers lifecycle events to the configured endpoint.
pub struct EventNotifier {
    client: reqwest::blocking::Client,
    endpoint: String,
    callback_id: String,
    inspector: Arc<dyn ContainerInspector>,
}

impl EventNotifier {
    /// Creates a notifier from its parts. `endpoint` must end with `/`.
    ///
    /// Most callers should use [`NotifierBuilder`](crate::builder::NotifierBuilder).
    #[must_use]
    pub fn new(
        client: reqwest::blocking::Client,
        endpoint: String,
        callback_id: String,
        inspector: Arc<dyn ContainerInspector>,
    ) -> Self {
        Self {
            client,
            endpoint,
            callback_id,
            inspector,
        }
    }

    /// Returns the endpoint base URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the callback identifier.
    #[must_use]
    pub fn callback_id(&self) -> &str {
        &self.callback_id
    }

    /// Builds the notification for `event`, inspecting every container it
    /// mentions.
    pub fn prepare(&self, event: &LifecycleEvent) -> Notification {
        Notification::from_event(event, &self.callback_id, |p| self.runtime_metadata(p))
    }

    /// Posts one event to the endpoint.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Transport` if the request fails and
    /// `NotifyError::Status` if the endpoint answers with a non-2xx status.
    pub fn notify(&self, event: &LifecycleEvent) -> Result<()> {
        let notification = self.prepare(event);
        let url = format!("{}{}", self.endpoint, notification.path());
        let body = notification.to_json()?;
        let request_id = uuid::Uuid::new_v4().to_string();

        tracing::debug!(
            url = %url,
            status = %event.status(),
            containers = event.processes().len(),
            request_id = %request_id,
            "notifying endpoint"
        );
        tracing::trace!(body = %body, "notification body");

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .header(REQUEST_ID_HEADER, &request_id)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()?;

        let status = response.status();
        let text = response.text().unwrap_or_default();
        tracing::trace!(status = status.as_u16(), body = %text, "notification response");

        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status {
                status: status.as_u16(),
                body: text,
            })
        }
    }

    fn runtime_metadata(&self, process: &TrackedProcess) -> RuntimeMetadata {
        match self.inspector.inspect(&process.uid) {
            Ok(raw) => RuntimeMetadata::Inspect(raw),
            Err(e) => {
                tracing::warn!(uid = %process.uid, error = %e, "unable to inspect container");
                RuntimeMetadata::Unavailable {
                    error: e.to_string(),
                }
            }
        }
    }
}

impl EventSink for EventNotifier {
    fn deliver(&self, events: Vec<LifecycleEvent>) {
        for event in &events {
            if let Err(e) = self.notify(event) {
                tracing::error!(
                    status = %event.status(),
                    containers = event.processes().len(),
                    error = %e,
                    "notification failed"
                );
            }
        }
    }
}

impl std::fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventNotifier")
            .field("endpoint", &self.endpoint)
            .field("callback_id", &self.callback_id)
            .finish_non_exhaustive()
    }
}
