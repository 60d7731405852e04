//! SHA-256 content verification.
//!
//! Artifacts are verified against the manifest digest before anything
//! touches their contents.

use sha2::{Digest, Sha256};

use crate::error::{Result, UpdateError};

/// Computes the lowercase hex SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Validates that `bytes` hash to `expected` (hex, case-insensitive).
///
/// # Errors
///
/// Returns `UpdateError::HashMismatch` if the digests differ.
pub fn verify_digest(resource: &str, bytes: &[u8], expected: &str) -> Result<()> {
    let actual = sha256_hex(bytes);
    tracing::debug!(resource, expected, actual = %actual, "validating SHA-256 hash");
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(UpdateError::HashMismatch {
            resource: resource.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}
