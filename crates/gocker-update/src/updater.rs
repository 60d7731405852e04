//! The self-update pipeline.

use std::path::{Path, PathBuf};

use crate::error::{Result, UpdateError};
use crate::release::{ReleaseResolver, UpdateCheck};

/// What an update cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The running version is the latest one.
    UpToDate,
    /// No build is published for this platform and architecture.
    NoMatchingBuild {
        /// Version that was looked up.
        version: String,
    },
    /// The manifest names an artifact that cannot be downloaded.
    NotPublished {
        /// Version that was looked up.
        version: String,
    },
    /// The binary on disk was replaced. The process should exit so its
    /// supervisor starts the new version.
    Updated {
        /// Version that was running.
        from: String,
        /// Version now installed.
        to: String,
    },
}

impl UpdateOutcome {
    /// Returns whether the binary on disk changed.
    #[must_use]
    pub const fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

/// Replaces one executable with the release published for its platform.
#[derive(Debug, Clone)]
pub struct SelfUpdater {
    resolver: ReleaseResolver,
    current_version: String,
    forced_version: Option<String>,
    target: PathBuf,
}

impl SelfUpdater {
    /// Creates an updater that replaces `target`, which currently runs
    /// `current_version`.
    #[must_use]
    pub fn new(
        resolver: ReleaseResolver,
        current_version: impl Into<String>,
        target: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            current_version: current_version.into(),
            forced_version: None,
            target: target.into(),
        }
    }

    /// Creates an updater for the executable of the running process.
    ///
    /// # Errors
    ///
    /// Returns an error if the path of the running executable is unknown.
    pub fn for_current_exe(
        resolver: ReleaseResolver,
        current_version: impl Into<String>,
    ) -> Result<Self> {
        let target = std::env::current_exe().map_err(|e| UpdateError::Apply {
            path: PathBuf::from("<current executable>"),
            source: e,
        })?;
        Ok(Self::new(resolver, current_version, target))
    }

    /// Installs `version` whatever the latest published version is.
    #[must_use]
    pub fn with_forced_version(mut self, version: Option<String>) -> Self {
        self.forced_version = version.filter(|v| !v.is_empty());
        self
    }

    /// Returns the executable this updater replaces.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Runs one update cycle.
    ///
    /// The digest is verified before the archive is opened, and the target
    /// is only touched once a complete, verified executable is in memory.
    ///
    /// # Errors
    ///
    /// Returns an error from whichever stage failed; the target is left
    /// unchanged in every error case.
    pub fn run(&self) -> Result<UpdateOutcome> {
        let version = match self
            .resolver
            .check_latest(&self.current_version, self.forced_version.as_deref())?
        {
            UpdateCheck::UpToDate => {
                tracing::info!(version = %self.current_version, "no need for update");
                return Ok(UpdateOutcome::UpToDate);
            }
            UpdateCheck::Available(version) => version,
        };

        let Some(entry) = self.resolver.resolve_manifest(&version)? else {
            tracing::info!(
                version = %version,
                platform = %self.resolver.platform(),
                "found no matching download for the current platform"
            );
            return Ok(UpdateOutcome::NoMatchingBuild { version });
        };

        let Some(artifact) = self.resolver.fetch_artifact(&entry)? else {
            return Ok(UpdateOutcome::NotPublished { version });
        };

        crate::hash::verify_digest(&entry.file, &artifact, &entry.sha)?;
        let binary =
            crate::archive::extract_executable(self.resolver.product(), &entry, &artifact)?;
        crate::apply::apply_binary(&binary, &self.target)?;

        tracing::info!(from = %self.current_version, to = %entry.version, "updated");
        Ok(UpdateOutcome::Updated {
            from: self.current_version.clone(),
            to: entry.version,
        })
    }
}
