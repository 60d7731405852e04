//! Lifecycle tracking state machine.
//!
//! The tracker starts in [`TrackerMode::Bootstrap`]. The first poll replaces
//! whatever was tracked with the snapshot and announces it as a single bulk
//! event, then switches to [`TrackerMode::Tracking`], where only newly seen
//! containers are announced. Containers that disappear are never removed by
//! a poll; they age out through [`LifecycleTracker::scavenge`], so one missed
//! enumeration cannot produce a spurious "missing" event.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use gocker_common::types::{ContainerUid, LifecycleEvent, TrackedProcess};

/// When a snapshot was taken.
///
/// The wall-clock time is what gets reported; expiry only looks at the
/// monotonic instant, so clock steps never age containers out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// Wall-clock time reported as `last_observation_at`.
    pub at: DateTime<Utc>,
    /// Monotonic time used for the scavenge timeout.
    pub instant: Instant,
}

impl Observation {
    /// Captures both clocks now.
    #[must_use]
    pub fn now() -> Self {
        Self {
            at: Utc::now(),
            instant: Instant::now(),
        }
    }
}

/// Which kind of events the next poll produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerMode {
    /// Next poll rebuilds state and emits one bulk snapshot.
    Bootstrap,
    /// Polls emit one event per newly seen container.
    Tracking,
}

/// In-memory record of every container seen since the last bootstrap.
#[derive(Debug)]
pub struct LifecycleTracker {
    mode: TrackerMode,
    tracked: HashMap<ContainerUid, Entry>,
    scavenge_timeout: Duration,
}

#[derive(Debug)]
struct Entry {
    process: TrackedProcess,
    seen: Instant,
}

impl Entry {
    fn new(uid: &ContainerUid, observation: Observation) -> Self {
        Self {
            process: TrackedProcess::new(uid.clone(), observation.at),
            seen: observation.instant,
        }
    }
}

impl LifecycleTracker {
    /// Creates an empty tracker in bootstrap mode.
    #[must_use]
    pub fn new(scavenge_timeout: Duration) -> Self {
        Self {
            mode: TrackerMode::Bootstrap,
            tracked: HashMap::new(),
            scavenge_timeout,
        }
    }

    /// Returns the current mode.
    #[must_use]
    pub const fn mode(&self) -> TrackerMode {
        self.mode
    }

    /// Returns the number of tracked containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    /// Returns whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Returns the tracked entry for `uid`, if any.
    #[must_use]
    pub fn get(&self, uid: &ContainerUid) -> Option<&TrackedProcess> {
        self.tracked.get(uid).map(|entry| &entry.process)
    }

    /// Applies one enumeration of running containers.
    pub fn perform_poll(
        &mut self,
        snapshot: &[ContainerUid],
        observation: Observation,
    ) -> Vec<LifecycleEvent> {
        match self.mode {
            TrackerMode::Bootstrap => vec![self.bootstrap(snapshot, observation)],
            TrackerMode::Tracking => self.track(snapshot, observation),
        }
    }

    fn bootstrap(&mut self, snapshot: &[ContainerUid], observation: Observation) -> LifecycleEvent {
        self.tracked.clear();
        let mut announced = Vec::with_capacity(snapshot.len());
        for uid in snapshot {
            if self.tracked.contains_key(uid) {
                continue;
            }
            let entry = Entry::new(uid, observation);
            announced.push(entry.process.clone());
            let _ = self.tracked.insert(uid.clone(), entry);
        }
        self.mode = TrackerMode::Tracking;
        tracing::info!(count = announced.len(), "tracker bootstrapped");
        LifecycleEvent::BulkSnapshot(announced)
    }

    fn track(
        &mut self,
        snapshot: &[ContainerUid],
        observation: Observation,
    ) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();
        for uid in snapshot {
            if let Some(entry) = self.tracked.get_mut(uid) {
                tracing::trace!(uid = %uid, "container still alive");
                entry.process.last_observed_at = observation.at;
                entry.seen = observation.instant;
            } else {
                tracing::debug!(uid = %uid, "found a new container");
                let entry = Entry::new(uid, observation);
                events.push(LifecycleEvent::New(entry.process.clone()));
                let _ = self.tracked.insert(uid.clone(), entry);
            }
        }
        events
    }

    /// Removes every container unseen for longer than the scavenge timeout
    /// and reports each one as missing.
    pub fn scavenge(&mut self, now: Instant) -> Vec<LifecycleEvent> {
        let timeout = self.scavenge_timeout;
        let mut expired: Vec<ContainerUid> = self
            .tracked
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.seen) > timeout)
            .map(|(uid, _)| uid.clone())
            .collect();
        expired.sort();

        expired
            .into_iter()
            .filter_map(|uid| self.tracked.remove(&uid))
            .map(|entry| entry.process)
            .inspect(|p| tracing::info!(uid = %p.uid, "container missing"))
            .map(LifecycleEvent::Missing)
            .collect()
    }

    /// Forgets everything and returns to bootstrap mode.
    pub fn resync(&mut self) {
        tracing::info!(dropped = self.tracked.len(), "resyncing tracker");
        self.tracked.clear();
        self.mode = TrackerMode::Bootstrap;
    }
}
