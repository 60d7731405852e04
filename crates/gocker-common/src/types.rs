//! Domain primitive types used across the gocker workspace.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::CONTAINER_UID_LENGTH;
use crate::error::{AgentError, Result};

/// Full identifier of a running container: 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerUid(String);

impl ContainerUid {
    /// Creates a uid from its hex representation.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::InvalidUid` unless the input is exactly 64
    /// lowercase hex characters.
    pub fn new(uid: impl Into<String>) -> Result<Self> {
        let uid = uid.into();
        if Self::is_valid(&uid) {
            Ok(Self(uid))
        } else {
            Err(AgentError::InvalidUid { value: uid })
        }
    }

    /// Extracts the uid from the start of a line of `docker ps` output.
    ///
    /// Returns `None` when the line does not begin with a full uid.
    #[must_use]
    pub fn from_line_prefix(line: &str) -> Option<Self> {
        let candidate = line.get(..CONTAINER_UID_LENGTH)?;
        Self::is_valid(candidate).then(|| Self(candidate.to_string()))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(value: &str) -> bool {
        value.len() == CONTAINER_UID_LENGTH
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }
}

impl TryFrom<String> for ContainerUid {
    type Error = AgentError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ContainerUid> for String {
    fn from(uid: ContainerUid) -> Self {
        uid.0
    }
}

impl fmt::Display for ContainerUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A container that has been observed at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedProcess {
    /// Container identifier.
    pub uid: ContainerUid,
    /// When the container was last seen in a snapshot.
    pub last_observed_at: DateTime<Utc>,
}

impl TrackedProcess {
    /// Creates a process first observed at `observed_at`.
    #[must_use]
    pub const fn new(uid: ContainerUid, observed_at: DateTime<Utc>) -> Self {
        Self {
            uid,
            last_observed_at: observed_at,
        }
    }
}

/// Status reported for a single container on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    /// The container appeared.
    New,
    /// The container has not been seen for longer than the scavenge timeout.
    Missing,
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Missing => write!(f, "missing"),
        }
    }
}

/// An event produced by the lifecycle tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A container appeared while tracking.
    New(TrackedProcess),
    /// A tracked container was scavenged.
    Missing(TrackedProcess),
    /// Full listing of running containers, produced on bootstrap.
    BulkSnapshot(Vec<TrackedProcess>),
}

impl LifecycleEvent {
    /// Returns the per-container status of this event.
    ///
    /// Bulk snapshots announce every member as new.
    #[must_use]
    pub const fn status(&self) -> LifecycleStatus {
        match self {
            Self::New(_) | Self::BulkSnapshot(_) => LifecycleStatus::New,
            Self::Missing(_) => LifecycleStatus::Missing,
        }
    }

    /// Returns the processes carried by this event.
    #[must_use]
    pub fn processes(&self) -> &[TrackedProcess] {
        match self {
            Self::New(process) | Self::Missing(process) => std::slice::from_ref(process),
            Self::BulkSnapshot(processes) => processes,
        }
    }
}

/// Operating system and CPU architecture, using Go-style release names
/// (`linux`, `darwin`, `windows`; `amd64`, `arm64`, `386`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system name.
    pub os: String,
    /// CPU architecture name.
    pub arch: String,
}

impl Platform {
    /// Creates a platform from explicit names.
    #[must_use]
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Returns the platform this binary was compiled for.
    #[must_use]
    pub fn host() -> Self {
        Self::new(
            release_os_name(std::env::consts::OS),
            release_arch_name(std::env::consts::ARCH),
        )
    }

    /// Returns the host platform with `GOCKER_PLATFORM` / `GOCKER_ARCH`
    /// overrides applied.
    #[must_use]
    pub fn detect() -> Self {
        Self::with_overrides(
            std::env::var(crate::constants::PLATFORM_ENV).ok(),
            std::env::var(crate::constants::ARCH_ENV).ok(),
        )
    }

    /// Returns the host platform with the given overrides applied.
    ///
    /// Empty overrides are ignored.
    #[must_use]
    pub fn with_overrides(os: Option<String>, arch: Option<String>) -> Self {
        let host = Self::host();
        Self {
            os: os.filter(|s| !s.is_empty()).unwrap_or(host.os),
            arch: arch.filter(|s| !s.is_empty()).unwrap_or(host.arch),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

fn release_os_name(os: &str) -> String {
    match os {
        "macos" => "darwin".into(),
        other => other.into(),
    }
}

fn release_arch_name(arch: &str) -> String {
    match arch {
        "x86_64" => "amd64".into(),
        "aarch64" => "arm64".into(),
        "x86" => "386".into(),
        other => other.into(),
    }
}
