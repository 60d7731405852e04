//! # gocker-update
//!
//! Replaces the running gocker binary with a newer published release.
//!
//! The pipeline runs in order and stops at the first stage that has nothing
//! to do or fails:
//! - **Release**: compare the published latest version with ours and pick
//!   the manifest entry for this platform.
//! - **Hashing**: SHA-256 verification of the downloaded artifact.
//! - **Archive**: pull the executable out of a zip or gzip tarball.
//! - **Apply**: rename the new binary over the old one.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod apply;
pub mod archive;
pub mod error;
pub mod hash;
pub mod release;
pub mod updater;
