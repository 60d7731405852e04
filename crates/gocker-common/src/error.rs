//! Operational error types for the gocker workspace.
//!
//! These cover failures that skip a single cycle of a periodic task:
//! enumeration, inspection, and configuration problems. The notifier and
//! updater crates define their own domain-specific error enums.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum AgentError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// An external command ran but reported failure.
    #[error("command `{command}` failed ({status}): {stderr}")]
    Command {
        /// Command line that was executed.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// A value is not a valid container uid.
    #[error("invalid container uid: {value}")]
    InvalidUid {
        /// The rejected value.
        value: String,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, AgentError>;
