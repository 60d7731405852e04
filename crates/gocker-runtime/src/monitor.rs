//! Shared tracker context driven by the periodic tasks.
//!
//! Poll, scavenge, and resync ticks all go through one [`Monitor`]. The
//! tracker sits behind a mutex that is held only while state changes;
//! enumeration and event delivery happen outside it, so a slow docker call
//! or a slow endpoint never blocks the other tasks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use gocker_common::types::LifecycleEvent;

use crate::source::ProcessSnapshotSource;
use crate::tracker::{LifecycleTracker, Observation, TrackerMode};

/// Receiver of tracker events.
pub trait EventSink: Send + Sync {
    /// Delivers events produced by one tracker operation.
    ///
    /// Delivery is best-effort; implementations report their own failures.
    fn deliver(&self, events: Vec<LifecycleEvent>);
}

/// Tracker plus the collaborators it needs, shared by every periodic task.
pub struct Monitor {
    source: Arc<dyn ProcessSnapshotSource>,
    sink: Arc<dyn EventSink>,
    tracker: Mutex<LifecycleTracker>,
}

impl Monitor {
    /// Creates a monitor around a fresh tracker.
    #[must_use]
    pub fn new(
        source: Arc<dyn ProcessSnapshotSource>,
        sink: Arc<dyn EventSink>,
        tracker: LifecycleTracker,
    ) -> Self {
        Self {
            source,
            sink,
            tracker: Mutex::new(tracker),
        }
    }

    /// Enumerates running containers and feeds the result to the tracker.
    ///
    /// An enumeration failure is logged and leaves tracked state untouched.
    /// Returns the number of events delivered.
    pub fn poll_once(&self) -> usize {
        let snapshot = match self.source.running() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(error = %e, "failed to enumerate containers, skipping poll");
                return 0;
            }
        };
        tracing::trace!(running = snapshot.len(), "polled containers");

        let events = self.lock().perform_poll(&snapshot, Observation::now());
        self.dispatch(events)
    }

    /// Reports containers that have not been seen for too long.
    ///
    /// Returns the number of events delivered.
    pub fn scavenge_once(&self) -> usize {
        tracing::trace!("scavenging");
        let events = self.lock().scavenge(Instant::now());
        self.dispatch(events)
    }

    /// Drops tracked state so the next poll rebuilds it.
    pub fn resync(&self) {
        self.lock().resync();
    }

    /// Returns the number of tracked containers.
    pub fn tracked_count(&self) -> usize {
        self.lock().len()
    }

    /// Returns the tracker mode.
    pub fn mode(&self) -> TrackerMode {
        self.lock().mode()
    }

    fn dispatch(&self, events: Vec<LifecycleEvent>) -> usize {
        let count = events.len();
        if count > 0 {
            self.sink.deliver(events);
        }
        count
    }

    fn lock(&self) -> MutexGuard<'_, LifecycleTracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}
