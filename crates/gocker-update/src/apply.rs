//! In-place replacement of the running executable.
//!
//! The new binary is staged in the target's directory and renamed over the
//! target, so the swap is atomic on the same filesystem and a process still
//! executing the old image is unaffected. On Windows a running executable
//! cannot be overwritten, so it is first renamed aside to `<name>.old`.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, UpdateError};

/// Replaces the file at `target` with `binary`.
///
/// # Errors
///
/// Returns `UpdateError::Apply` if staging or renaming fails. The installed
/// file is left in place whenever the swap does not complete.
pub fn apply_binary(binary: &[u8], target: &Path) -> Result<()> {
    let apply_error = |path: &Path, source: std::io::Error| UpdateError::Apply {
        path: path.to_path_buf(),
        source,
    };

    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut staged = tempfile::Builder::new()
        .prefix(".gocker-update-")
        .tempfile_in(&dir)
        .map_err(|e| apply_error(&dir, e))?;
    staged
        .write_all(binary)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| apply_error(staged.path(), e))?;
    copy_permissions(target, staged.path()).map_err(|e| apply_error(staged.path(), e))?;

    tracing::debug!(
        target = %target.display(),
        staged = %staged.path().display(),
        "swapping binary"
    );
    swap(staged, target)
}

#[cfg(not(windows))]
fn swap(staged: tempfile::NamedTempFile, target: &Path) -> Result<()> {
    let _ = staged.persist(target).map_err(|e| UpdateError::Apply {
        path: target.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

#[cfg(windows)]
fn swap(staged: tempfile::NamedTempFile, target: &Path) -> Result<()> {
    let aside = aside_path(target);
    let _ = std::fs::remove_file(&aside);
    let moved_aside = target.exists();
    if moved_aside {
        std::fs::rename(target, &aside).map_err(|e| UpdateError::Apply {
            path: target.to_path_buf(),
            source: e,
        })?;
    }

    match staged.persist(target) {
        Ok(_) => Ok(()),
        Err(e) => {
            if moved_aside {
                let _ = std::fs::rename(&aside, target);
            }
            Err(UpdateError::Apply {
                path: target.to_path_buf(),
                source: e.error,
            })
        }
    }
}

/// Where the running binary is moved before being replaced on Windows.
#[must_use]
pub fn aside_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".old");
    target.with_file_name(name)
}

#[cfg(unix)]
fn copy_permissions(target: &Path, staged: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = match std::fs::metadata(target) {
        Ok(meta) => meta.permissions().mode() | 0o111,
        Err(_) => 0o755,
    };
    std::fs::set_permissions(staged, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn copy_permissions(_target: &Path, _staged: &Path) -> std::io::Result<()> {
    Ok(())
}
