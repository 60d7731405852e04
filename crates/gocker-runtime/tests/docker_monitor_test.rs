//! Monitor driven by a scripted docker CLI.

#![cfg(unix)]
#![allow(clippy::expect_used, clippy::unwrap_used, missing_docs)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gocker_common::error::AgentError;
use gocker_common::types::{LifecycleEvent, LifecycleStatus};
use gocker_runtime::monitor::{EventSink, Monitor};
use gocker_runtime::source::{DockerCli, ProcessSnapshotSource};
use gocker_runtime::tracker::{LifecycleTracker, TrackerMode};

const A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

/// A docker stand-in whose `ps` prints the contents of a listing file.
struct FakeDocker {
    _dir: tempfile::TempDir,
    script: PathBuf,
    listing: PathBuf,
}

impl FakeDocker {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("docker");
        let listing = dir.path().join("listing");
        std::fs::write(&listing, "").unwrap();
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\n\
                 if [ -e {dir}/down ]; then\n\
                 echo 'Cannot connect to the Docker daemon' >&2; exit 1\n\
                 fi\n\
                 echo 'CONTAINER ID   IMAGE   COMMAND   CREATED   STATUS   PORTS   NAMES'\n\
                 cat {listing}\n",
                dir = dir.path().display(),
                listing = listing.display(),
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self {
            _dir: dir,
            script,
            listing,
        }
    }

    fn show(&self, uids: &[&str]) {
        let lines: String = uids
            .iter()
            .map(|uid| format!("{uid}   busybox   \"sleep 1d\"   Up 1 minute      box\n"))
            .collect();
        std::fs::write(&self.listing, lines).unwrap();
    }

    fn set_down(&self, down: bool) {
        let marker = self.script.with_file_name("down");
        if down {
            std::fs::write(marker, "").unwrap();
        } else {
            let _ = std::fs::remove_file(marker);
        }
    }

    fn path(&self) -> &Path {
        &self.script
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl EventSink for RecordingSink {
    fn deliver(&self, events: Vec<LifecycleEvent>) {
        self.events.lock().unwrap().extend(events);
    }
}

fn uids(event: &LifecycleEvent) -> Vec<&str> {
    event.processes().iter().map(|p| p.uid.as_str()).collect()
}

/// Freshly written scripts can briefly fail with ETXTBSY while another test
/// thread is forking; wait until the script runs.
fn warm_up(docker: &DockerCli) {
    for _ in 0..10 {
        match docker.running() {
            Err(AgentError::Io { source, .. }) if source.raw_os_error() == Some(26) => {
                std::thread::sleep(Duration::from_millis(50));
            }
            _ => return,
        }
    }
}

#[test]
fn docker_listing_drives_full_lifecycle() {
    let fake = FakeDocker::new();
    let docker = Arc::new(DockerCli::new(fake.path()));
    warm_up(&docker);
    let sink = Arc::new(RecordingSink::default());
    let monitor = Monitor::new(
        docker,
        sink.clone(),
        LifecycleTracker::new(Duration::from_millis(200)),
    );

    fake.show(&[A]);
    assert_eq!(monitor.poll_once(), 1);
    assert_eq!(monitor.mode(), TrackerMode::Tracking);
    let events = sink.take();
    assert!(matches!(events[0], LifecycleEvent::BulkSnapshot(_)));
    assert_eq!(uids(&events[0]), vec![A]);

    fake.show(&[A, B]);
    assert_eq!(monitor.poll_once(), 1);
    let events = sink.take();
    assert_eq!(events[0].status(), LifecycleStatus::New);
    assert_eq!(uids(&events[0]), vec![B]);

    fake.show(&[B]);
    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(monitor.poll_once(), 0);
    assert_eq!(monitor.scavenge_once(), 1);
    let events = sink.take();
    assert_eq!(events[0].status(), LifecycleStatus::Missing);
    assert_eq!(uids(&events[0]), vec![A]);
    assert_eq!(monitor.tracked_count(), 1);
}

#[test]
fn daemon_outage_keeps_tracked_state() {
    let fake = FakeDocker::new();
    let docker = Arc::new(DockerCli::new(fake.path()));
    warm_up(&docker);
    let sink = Arc::new(RecordingSink::default());
    let monitor = Monitor::new(
        docker,
        sink.clone(),
        LifecycleTracker::new(Duration::from_secs(60)),
    );

    fake.show(&[A, B]);
    let _ = monitor.poll_once();
    let _ = sink.take();

    fake.set_down(true);
    assert_eq!(monitor.poll_once(), 0);
    assert_eq!(monitor.tracked_count(), 2);
    assert!(sink.take().is_empty());

    fake.set_down(false);
    assert_eq!(monitor.poll_once(), 0);
    assert_eq!(monitor.tracked_count(), 2);
}
