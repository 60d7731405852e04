//! `gocker update`: replace the installed binary with the latest release.

use gocker_common::config::AgentConfig;
use gocker_common::constants;
use gocker_common::types::Platform;
use gocker_update::release::ReleaseResolver;
use gocker_update::updater::{SelfUpdater, UpdateOutcome};

use super::Cli;

/// Builds the updater for the running executable.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or the running
/// executable cannot be located.
pub fn build_updater(config: &AgentConfig) -> anyhow::Result<SelfUpdater> {
    let platform = Platform::detect();
    tracing::debug!(%platform, url = %config.download_url, "release source");
    let resolver =
        ReleaseResolver::new(config.download_url.as_str(), platform, config.http_timeout)?;
    Ok(SelfUpdater::for_current_exe(resolver, constants::VERSION)?
        .with_forced_version(config.forced_version.clone()))
}

/// Executes the `update` command.
///
/// # Errors
///
/// Returns an error if any update stage fails.
pub fn execute(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.config()?;
    let updater = build_updater(&config)?;

    match updater.run()? {
        UpdateOutcome::UpToDate => {
            println!("{} v{} is up to date", constants::APP_NAME, constants::VERSION);
        }
        UpdateOutcome::NoMatchingBuild { version } => {
            println!("No v{version} build is published for this platform");
        }
        UpdateOutcome::NotPublished { version } => {
            println!("v{version} is not available for download yet");
        }
        UpdateOutcome::Updated { from, to } => {
            println!("Updated {} from v{from} to v{to}", updater.target().display());
        }
    }
    Ok(())
}
