//! Update pipeline errors.
//!
//! Every variant aborts the current update cycle and leaves the installed
//! binary untouched. None of them is fatal to the agent.

use std::path::PathBuf;

use thiserror::Error;

/// Why an update cycle was aborted.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The request could not be sent or a manifest body not read.
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        source: reqwest::Error,
    },

    /// The distribution point answered with an unexpected status.
    #[error("bad HTTP status from {url}: {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// The connection failed while the artifact body was being read.
    #[error("download of {url} interrupted: {source}")]
    Download {
        /// Requested URL.
        url: String,
        /// Underlying read error.
        source: std::io::Error,
    },

    /// A manifest document could not be parsed.
    #[error("invalid manifest at {url}: {source}")]
    Manifest {
        /// Requested URL.
        url: String,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// The downloaded artifact does not match the published digest.
    #[error("hash mismatch for {resource}: expected {expected}, got {actual}")]
    HashMismatch {
        /// Artifact that failed validation.
        resource: String,
        /// Digest recorded in the manifest.
        expected: String,
        /// Digest of the downloaded bytes.
        actual: String,
    },

    /// The archive could not be decompressed or read.
    #[error("failed to read archive {resource}: {message}")]
    Archive {
        /// Artifact being extracted.
        resource: String,
        /// Description of the failure.
        message: String,
    },

    /// The archive does not contain the expected executable.
    #[error("archive {resource} has no entry {entry}")]
    MissingEntry {
        /// Artifact being extracted.
        resource: String,
        /// Entry that was looked for.
        entry: String,
    },

    /// Artifacts for this platform are not packaged in a known format.
    #[error("unsupported platform for self-update: {platform}")]
    UnsupportedPlatform {
        /// Platform named by the manifest entry.
        platform: String,
    },

    /// The new binary could not be put in place.
    #[error("failed to replace binary at {path}: {source}")]
    Apply {
        /// Binary being replaced.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Convenience alias for update results.
pub type Result<T> = std::result::Result<T, UpdateError>;
