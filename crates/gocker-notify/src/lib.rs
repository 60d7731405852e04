//! # gocker-notify
//!
//! Best-effort HTTP delivery of container lifecycle events.
//!
//! - [`payload`]: the JSON documents posted to the endpoint.
//! - [`builder`]: fluent configuration of an [`EventNotifier`](notifier::EventNotifier).
//! - [`notifier`]: one POST per event, no retries.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use gocker_notify::builder::NotifierBuilder;
//! use gocker_runtime::source::DockerCli;
//!
//! let notifier = NotifierBuilder::new("https://example.com/")
//!     .callback_id("host-42")
//!     .build(Arc::new(DockerCli::new("/usr/bin/docker")))
//!     .expect("http client");
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod builder;
pub mod error;
pub mod notifier;
pub mod payload;
