//! Notification delivery errors.

use thiserror::Error;

/// Why a notification was not accepted by the endpoint.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The request could not be built or sent.
    #[error("notification transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("notification rejected with HTTP {status}: {body}")]
    Status {
        /// Response status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The payload could not be serialized.
    #[error("failed to serialize notification: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias for notifier results.
pub type Result<T> = std::result::Result<T, NotifyError>;
