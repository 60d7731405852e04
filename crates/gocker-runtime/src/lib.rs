//! Container enumeration and lifecycle tracking for the gocker agent.
//!
//! - [`source`]: what is running right now, via the docker CLI.
//! - [`tracker`]: the bootstrap/tracking state machine that turns snapshots
//!   into lifecycle events.
//! - [`monitor`]: the lock-guarded context shared by the periodic tasks.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod monitor;
pub mod source;
pub mod tracker;
