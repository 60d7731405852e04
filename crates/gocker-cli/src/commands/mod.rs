//! CLI command definitions and dispatch.

pub mod run;
pub mod update;
pub mod version;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use gocker_common::config::AgentConfig;
use gocker_common::constants;
use gocker_common::duration::parse_duration;

/// gocker: reports container lifecycle events of a docker host.
#[derive(Parser, Debug)]
#[command(name = "gocker", version = constants::VERSION, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute. Without one the agent runs.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to the docker CLI.
    #[arg(
        long,
        global = true,
        env = "GOCKER_DOCKER",
        default_value = constants::DEFAULT_DOCKER_PATH
    )]
    pub docker: PathBuf,

    /// How often running containers are enumerated.
    #[arg(
        long,
        global = true,
        env = "GOCKER_INTERVAL",
        default_value = constants::DEFAULT_POLL_INTERVAL
    )]
    pub interval: String,

    /// How often containers that went away are looked for.
    #[arg(
        long,
        global = true,
        env = "GOCKER_SCAVENGE",
        default_value = constants::DEFAULT_SCAVENGE_INTERVAL
    )]
    pub scavenge: String,

    /// How long a container may go unseen before it is reported missing.
    /// Defaults to twice the scavenge interval.
    #[arg(long, global = true, env = "GOCKER_SCAVENGE_TIMEOUT")]
    pub scavenge_timeout: Option<String>,

    /// How often tracked state is discarded and rebuilt from scratch.
    #[arg(
        long,
        global = true,
        env = "GOCKER_RESYNC",
        default_value = constants::DEFAULT_RESYNC_INTERVAL
    )]
    pub resync: String,

    /// How often a newer release is looked for.
    #[arg(
        long,
        global = true,
        env = "GOCKER_UPDATE_INTERVAL",
        default_value = constants::DEFAULT_UPDATE_INTERVAL
    )]
    pub update_interval: String,

    /// Base URL of the notification endpoint.
    #[arg(
        long,
        global = true,
        env = "GOCKER_NOTIFICATION",
        default_value = constants::DEFAULT_NOTIFIER_ENDPOINT
    )]
    pub notification: String,

    /// Callback id sent with every notification.
    #[arg(long, global = true, env = "GOCKER_CALLBACK", default_value = "")]
    pub callback: String,

    /// Install this version instead of the latest published one.
    #[arg(long, global = true, env = "GOCKER_FORCE_VERSION")]
    pub force_version: Option<String>,

    /// Base URL of the release distribution point.
    #[arg(
        long,
        global = true,
        env = "GOCKER_DOWNLOAD_URL",
        default_value = constants::DEFAULT_DOWNLOAD_URL
    )]
    pub download_url: String,

    /// Per-request HTTP timeout.
    #[arg(
        long,
        global = true,
        env = "GOCKER_HTTP_TIMEOUT",
        default_value = constants::DEFAULT_HTTP_TIMEOUT
    )]
    pub http_timeout: String,

    /// Append log output to this file instead of stderr.
    #[arg(long, global = true, env = "GOCKER_LOG")]
    pub log: Option<PathBuf>,

    /// Log level, used when `RUST_LOG` is not set.
    #[arg(long, global = true, env = "GOCKER_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Update the installed binary to the latest release and exit.
    Update,
    /// Print version information.
    Version,
}

impl Cli {
    /// Builds the agent configuration from the parsed flags.
    ///
    /// # Errors
    ///
    /// Returns an error if a duration cannot be parsed or the resulting
    /// configuration is invalid.
    pub fn config(&self) -> anyhow::Result<AgentConfig> {
        let scavenge_interval = duration("scavenge", &self.scavenge)?;
        let scavenge_timeout = match &self.scavenge_timeout {
            Some(value) => duration("scavenge-timeout", value)?,
            None => scavenge_interval * 2,
        };

        let config = AgentConfig {
            docker_path: self.docker.clone(),
            poll_interval: duration("interval", &self.interval)?,
            scavenge_interval,
            scavenge_timeout,
            resync_interval: duration("resync", &self.resync)?,
            update_interval: duration("update-interval", &self.update_interval)?,
            notifier_endpoint: self.notification.clone(),
            callback_id: self.callback.clone(),
            forced_version: self.force_version.clone().filter(|v| !v.is_empty()),
            download_url: self.download_url.clone(),
            http_timeout: duration("http-timeout", &self.http_timeout)?,
        };
        config.validate()?;
        Ok(config)
    }
}

fn duration(flag: &str, value: &str) -> anyhow::Result<Duration> {
    parse_duration(value).with_context(|| format!("invalid --{flag} value {value:?}"))
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: &Cli) -> anyhow::Result<()> {
    match cli.command {
        None => run::execute(cli),
        Some(Command::Update) => update::execute(cli),
        Some(Command::Version) => {
            version::execute();
            Ok(())
        }
    }
}
