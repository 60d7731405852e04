//! `gocker`: run the agent until interrupted or updated.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use gocker_common::config::AgentConfig;
use gocker_common::constants;
use gocker_notify::builder::NotifierBuilder;
use gocker_runtime::monitor::{EventSink, Monitor};
use gocker_runtime::source::{ContainerInspector, DockerCli, ProcessSnapshotSource};
use gocker_runtime::tracker::LifecycleTracker;
use gocker_update::updater::{SelfUpdater, UpdateOutcome};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};

use super::Cli;

/// How long in-flight blocking work may run after shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Executes the agent.
///
/// Returns when Ctrl+C is received or after the binary was replaced by a
/// newer release.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the runtime cannot
/// be started.
pub fn execute(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.config()?;
    tracing::info!(version = constants::VERSION, "starting gocker");

    let docker = Arc::new(DockerCli::resolve(&config.docker_path));
    tracing::info!(docker = %docker.docker_path().display(), "using docker");
    let source: Arc<dyn ProcessSnapshotSource> = docker.clone();
    let inspector: Arc<dyn ContainerInspector> = docker;

    // Blocking HTTP clients are built and finally dropped outside the async
    // runtime.
    let notifier = Arc::new(
        NotifierBuilder::new(config.notifier_endpoint.as_str())
            .callback_id(config.callback_id.as_str())
            .timeout(config.http_timeout)
            .build(inspector)
            .context("failed to build the notifier")?,
    );
    let updater = Arc::new(super::update::build_updater(&config)?);
    let sink: Arc<dyn EventSink> = notifier.clone();
    let monitor = Arc::new(Monitor::new(
        source,
        sink,
        LifecycleTracker::new(config.scavenge_timeout),
    ));

    let _ = monitor.poll_once();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    let self_updater = Arc::clone(&updater);
    let result = runtime.block_on(supervise(
        &config,
        &monitor,
        move || update_cycle(&self_updater),
        interrupted(),
    ));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    drop(monitor);
    drop(notifier);
    drop(updater);
    result
}

/// Runs the periodic tasks until `update` reports a replaced binary or
/// `shutdown` resolves.
///
/// `update` runs on the blocking pool every update interval and returns an
/// outcome only when the binary on disk changed.
async fn supervise<U, S>(
    config: &AgentConfig,
    monitor: &Arc<Monitor>,
    update: U,
    shutdown: S,
) -> anyhow::Result<()>
where
    U: Fn() -> Option<UpdateOutcome> + Send + Sync + 'static,
    S: Future<Output = anyhow::Result<()>>,
{
    let (updated_tx, mut updated_rx) = mpsc::channel::<UpdateOutcome>(1);
    let mut tasks = JoinSet::new();

    let poller = Arc::clone(monitor);
    spawn_periodic(&mut tasks, "poll", config.poll_interval, move || {
        let _ = poller.poll_once();
    });

    let scavenger = Arc::clone(monitor);
    spawn_periodic(&mut tasks, "scavenge", config.scavenge_interval, move || {
        let _ = scavenger.scavenge_once();
    });

    let refresher = Arc::clone(monitor);
    spawn_periodic(&mut tasks, "resync", config.resync_interval, move || {
        tracing::info!("resyncing tracked containers");
        refresher.resync();
        let _ = refresher.poll_once();
    });

    spawn_periodic(&mut tasks, "update", config.update_interval, move || {
        if let Some(outcome) = update() {
            let _ = updated_tx.blocking_send(outcome);
        }
    });

    tokio::select! {
        Some(outcome) = updated_rx.recv() => {
            tracing::info!(?outcome, "binary replaced, exiting");
        }
        signal = shutdown => signal?,
    }

    tasks.abort_all();
    Ok(())
}

/// One self-update attempt. Failures are logged and count as no update.
fn update_cycle(updater: &SelfUpdater) -> Option<UpdateOutcome> {
    match updater.run() {
        Ok(outcome) if outcome.is_updated() => Some(outcome),
        Ok(outcome) => {
            tracing::debug!(?outcome, "no update installed");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "self-update failed");
            None
        }
    }
}

/// Resolves on Ctrl+C.
async fn interrupted() -> anyhow::Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    tracing::info!("interrupted, exiting");
    Ok(())
}

/// Runs `work` on the blocking pool every `period`, starting one period
/// from now. Missed ticks are delayed rather than bursted.
fn spawn_periodic<F>(tasks: &mut JoinSet<()>, name: &'static str, period: Duration, work: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let work = Arc::new(work);
    let _ = tasks.spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            let _ = ticker.tick().await;
            let work = Arc::clone(&work);
            if let Err(e) = tokio::task::spawn_blocking(move || work()).await {
                tracing::error!(task = name, error = %e, "periodic task panicked");
            }
        }
    });
}
