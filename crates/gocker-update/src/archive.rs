//! Executable extraction from release archives.
//!
//! Windows and macOS releases are zip archives; Linux releases are gzip
//! compressed tarballs. Either way the executable lives at
//! `<product>_<version>_<platform>_<arch>/<product>[.exe]` and every other
//! member is ignored.

use std::io::{Cursor, Read};
use std::path::Path;

use crate::error::{Result, UpdateError};
use crate::release::ReleaseManifestEntry;

/// How a release artifact is packaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Zip archive.
    Zip,
    /// Gzip-compressed tar archive.
    TarGz,
}

impl ArchiveFormat {
    /// Returns the packaging used for `platform`.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError::UnsupportedPlatform` for platforms without
    /// published archives.
    pub fn for_platform(platform: &str) -> Result<Self> {
        match platform {
            "windows" | "darwin" => Ok(Self::Zip),
            "linux" => Ok(Self::TarGz),
            other => Err(UpdateError::UnsupportedPlatform {
                platform: other.to_string(),
            }),
        }
    }
}

/// Returns the archive path of the executable described by `entry`.
#[must_use]
pub fn executable_entry_name(product: &str, entry: &ReleaseManifestEntry) -> String {
    let suffix = if entry.platform == "windows" { ".exe" } else { "" };
    format!(
        "{product}_{}_{}_{}/{product}{suffix}",
        entry.version, entry.platform, entry.architecture
    )
}

/// Extracts the executable for `entry` from the verified artifact bytes.
///
/// # Errors
///
/// Returns an error if the platform is unsupported, the archive is corrupt,
/// or the executable entry is absent.
pub fn extract_executable(
    product: &str,
    entry: &ReleaseManifestEntry,
    artifact: &[u8],
) -> Result<Vec<u8>> {
    let format = ArchiveFormat::for_platform(&entry.platform)?;
    let name = executable_entry_name(product, entry);
    tracing::debug!(file = %entry.file, entry = %name, ?format, "extracting executable");

    match format {
        ArchiveFormat::Zip => extract_from_zip(&entry.file, &name, artifact),
        ArchiveFormat::TarGz => extract_from_tar_gz(&entry.file, &name, artifact),
    }
}

fn extract_from_zip(resource: &str, name: &str, artifact: &[u8]) -> Result<Vec<u8>> {
    let archive_error = |message: String| UpdateError::Archive {
        resource: resource.to_string(),
        message,
    };

    let mut archive =
        zip::ZipArchive::new(Cursor::new(artifact)).map_err(|e| archive_error(e.to_string()))?;
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(UpdateError::MissingEntry {
                resource: resource.to_string(),
                entry: name.to_string(),
            });
        }
        Err(e) => return Err(archive_error(e.to_string())),
    };

    let mut binary = Vec::new();
    let _ = file
        .read_to_end(&mut binary)
        .map_err(|e| archive_error(e.to_string()))?;
    Ok(binary)
}

fn extract_from_tar_gz(resource: &str, name: &str, artifact: &[u8]) -> Result<Vec<u8>> {
    let archive_error = |e: std::io::Error| UpdateError::Archive {
        resource: resource.to_string(),
        message: e.to_string(),
    };

    let decoder = flate2::read::GzDecoder::new(Cursor::new(artifact));
    let mut archive = tar::Archive::new(decoder);
    let target = Path::new(name);

    for entry in archive.entries().map_err(archive_error)? {
        let mut entry = entry.map_err(archive_error)?;
        let path = entry.path().map_err(archive_error)?;
        tracing::trace!(member = %path.display(), "archive member");
        if path == target {
            let mut binary = Vec::new();
            let _ = entry.read_to_end(&mut binary).map_err(archive_error)?;
            return Ok(binary);
        }
    }

    Err(UpdateError::MissingEntry {
        resource: resource.to_string(),
        entry: name.to_string(),
    })
}
