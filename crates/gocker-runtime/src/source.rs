//! Container enumeration and inspection.
//!
//! The agent never talks to the container runtime directly; it shells out
//! to the docker CLI and treats the output as opaque text.

use std::path::{Path, PathBuf};
use std::process::Command;

use gocker_common::error::{AgentError, Result};
use gocker_common::types::ContainerUid;

/// Something that can list the containers running right now.
pub trait ProcessSnapshotSource: Send + Sync {
    /// Returns the uids of all running containers.
    ///
    /// # Errors
    ///
    /// Returns an error if the enumeration could not be performed.
    fn running(&self) -> Result<Vec<ContainerUid>>;
}

/// Something that can describe a single container.
pub trait ContainerInspector: Send + Sync {
    /// Returns the raw JSON description of a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be inspected.
    fn inspect(&self, uid: &ContainerUid) -> Result<String>;
}

/// Docker CLI backed source and inspector.
#[derive(Debug, Clone)]
pub struct DockerCli {
    docker_path: PathBuf,
}

impl DockerCli {
    /// Creates a source that invokes the binary at `docker_path` verbatim.
    #[must_use]
    pub fn new(docker_path: impl Into<PathBuf>) -> Self {
        Self {
            docker_path: docker_path.into(),
        }
    }

    /// Creates a source for the configured path, falling back to `docker` on
    /// `PATH` when the configured binary does not exist.
    #[must_use]
    pub fn resolve(configured: &Path) -> Self {
        if configured.exists() {
            return Self::new(configured);
        }
        match which::which("docker") {
            Ok(found) => {
                tracing::warn!(
                    configured = %configured.display(),
                    found = %found.display(),
                    "configured docker path missing, using docker from PATH"
                );
                Self::new(found)
            }
            Err(_) => {
                tracing::warn!(path = %configured.display(), "docker binary not found");
                Self::new(configured)
            }
        }
    }

    /// Returns the docker binary this source invokes.
    #[must_use]
    pub fn docker_path(&self) -> &Path {
        &self.docker_path
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.docker_path)
            .args(args)
            .output()
            .map_err(|e| AgentError::Io {
                path: self.docker_path.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(AgentError::Command {
                command: format!("{} {}", self.docker_path.display(), args.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl ProcessSnapshotSource for DockerCli {
    fn running(&self) -> Result<Vec<ContainerUid>> {
        tracing::trace!(docker = %self.docker_path.display(), "listing running containers");
        let stdout = self.run(&["ps", "--no-trunc"])?;
        Ok(parse_ps_output(&stdout))
    }
}

impl ContainerInspector for DockerCli {
    fn inspect(&self, uid: &ContainerUid) -> Result<String> {
        tracing::trace!(uid = %uid, "inspecting container");
        self.run(&["inspect", uid.as_str()])
    }
}

/// Extracts container uids from `docker ps --no-trunc` output.
///
/// Only lines that start with a full 64-character lowercase hex id count;
/// the header and anything malformed are skipped.
#[must_use]
pub fn parse_ps_output(stdout: &str) -> Vec<ContainerUid> {
    stdout.lines().filter_map(ContainerUid::from_line_prefix).collect()
}
