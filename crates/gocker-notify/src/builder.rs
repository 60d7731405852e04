//! Fluent API for configuring an [`EventNotifier`].

use std::sync::Arc;
use std::time::Duration;

use gocker_common::constants;
use gocker_runtime::source::ContainerInspector;

use crate::error::Result;
use crate::notifier::EventNotifier;

/// Builder for an [`EventNotifier`].
#[derive(Debug, Clone)]
pub struct NotifierBuilder {
    endpoint: String,
    callback_id: String,
    timeout: Duration,
}

impl NotifierBuilder {
    /// Creates a builder posting to the endpoint base URL `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            callback_id: String::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the callback identifier included in every payload.
    #[must_use]
    pub fn callback_id(mut self, callback_id: impl Into<String>) -> Self {
        self.callback_id = callback_id.into();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the notifier. Every request carries the agent's user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn build(self, inspector: Arc<dyn ContainerInspector>) -> Result<EventNotifier> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(constants::user_agent())
            .timeout(self.timeout)
            .build()?;

        let mut endpoint = self.endpoint;
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }

        Ok(EventNotifier::new(client, endpoint, self.callback_id, inspector))
    }
}

#[cfg(test)]
mod tests {
    use gocker_common::error::Result as AgentResult;
    use gocker_common::types::ContainerUid;

    use super::*;

    struct NoInspect;

    impl ContainerInspector for NoInspect {
        fn inspect(&self, _uid: &ContainerUid) -> AgentResult<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn builder_normalizes_endpoint_trailing_slash() {
        let notifier = NotifierBuilder::new("http://localhost:8080/hooks")
            .callback_id("cb")
            .build(Arc::new(NoInspect))
            .expect("build");
        assert_eq!(notifier.endpoint(), "http://localhost:8080/hooks/");
        assert_eq!(notifier.callback_id(), "cb");
    }

    #[test]
    fn builder_keeps_existing_trailing_slash() {
        let notifier = NotifierBuilder::new("http://localhost:8080/")
            .timeout(Duration::from_secs(1))
            .build(Arc::new(NoInspect))
            .expect("build");
        assert_eq!(notifier.endpoint(), "http://localhost:8080/");
    }
}
