//! Agent configuration model.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants;
use crate::error::{AgentError, Result};

/// Root configuration for the gocker agent, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Path to the docker CLI.
    pub docker_path: PathBuf,
    /// How often running containers are enumerated.
    pub poll_interval: Duration,
    /// How often the tracked set is scavenged.
    pub scavenge_interval: Duration,
    /// How long a container may go unseen before it is reported missing.
    pub scavenge_timeout: Duration,
    /// How often tracked state is discarded and rebuilt.
    pub resync_interval: Duration,
    /// How often a newer release is looked for.
    pub update_interval: Duration,
    /// Base URL of the notification endpoint.
    pub notifier_endpoint: String,
    /// Identifier echoed back to the endpoint with every notification.
    pub callback_id: String,
    /// Version to install regardless of the published latest version.
    pub forced_version: Option<String>,
    /// Base URL of the release distribution point.
    pub download_url: String,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
}

impl AgentConfig {
    /// Checks that every interval can drive a periodic task.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Config` if an interval is zero or an endpoint is
    /// empty.
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("poll interval", self.poll_interval),
            ("scavenge interval", self.scavenge_interval),
            ("resync interval", self.resync_interval),
            ("update interval", self.update_interval),
        ];
        for (name, value) in intervals {
            if value.is_zero() {
                return Err(AgentError::Config {
                    message: format!("{name} must be greater than zero"),
                });
            }
        }
        if self.notifier_endpoint.trim().is_empty() {
            return Err(AgentError::Config {
                message: "notification endpoint must not be empty".into(),
            });
        }
        if self.download_url.trim().is_empty() {
            return Err(AgentError::Config {
                message: "download url must not be empty".into(),
            });
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        let scavenge_interval = Duration::from_secs(10);
        Self {
            docker_path: PathBuf::from(constants::DEFAULT_DOCKER_PATH),
            poll_interval: Duration::from_secs(5),
            scavenge_interval,
            scavenge_timeout: scavenge_interval * 2,
            resync_interval: Duration::from_secs(30 * 60),
            update_interval: Duration::from_secs(30 * 60),
            notifier_endpoint: constants::DEFAULT_NOTIFIER_ENDPOINT.into(),
            callback_id: String::new(),
            forced_version: None,
            download_url: constants::DEFAULT_DOWNLOAD_URL.into(),
            http_timeout: Duration::from_secs(30),
        }
    }
}
