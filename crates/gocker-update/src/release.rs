//! Release discovery on the distribution point.
//!
//! Three kinds of documents live next to each other under one base URL:
//! - `<product>_latest.json`: `{"latest": "<version>"}`
//! - `<product>_<version>.json`: one entry per published platform/arch
//! - the artifacts named by those entries

use std::io::Read;
use std::time::Duration;

use gocker_common::constants;
use gocker_common::types::Platform;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::error::{Result, UpdateError};

/// One published build of a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseManifestEntry {
    /// Version of the build.
    pub version: String,
    /// Operating system the build targets.
    pub platform: String,
    /// CPU architecture the build targets.
    pub architecture: String,
    /// Hex SHA-256 digest of the artifact.
    pub sha: String,
    /// Artifact file name relative to the base URL.
    pub file: String,
}

/// Pointer to the current stable release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestPointer {
    /// Latest published version.
    pub latest: String,
}

/// Result of comparing the running version with the published one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCheck {
    /// Nothing newer is published.
    UpToDate,
    /// This version should be installed.
    Available(String),
}

/// Looks up releases for one platform.
#[derive(Debug, Clone)]
pub struct ReleaseResolver {
    client: reqwest::blocking::Client,
    base_url: String,
    product: String,
    platform: Platform,
}

impl ReleaseResolver {
    /// Creates a resolver for the distribution point at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>, platform: Platform, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        let client = reqwest::blocking::Client::builder()
            .user_agent(constants::user_agent())
            .timeout(timeout)
            .build()
            .map_err(|e| UpdateError::Http {
                url: base_url.clone(),
                source: e,
            })?;
        Ok(Self::with_client(client, base_url, platform))
    }

    /// Creates a resolver around an existing client.
    #[must_use]
    pub fn with_client(
        client: reqwest::blocking::Client,
        base_url: impl Into<String>,
        platform: Platform,
    ) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            client,
            base_url,
            product: constants::APP_NAME.to_string(),
            platform,
        }
    }

    /// Returns the product name used in file names.
    #[must_use]
    pub fn product(&self) -> &str {
        &self.product
    }

    /// Returns the platform builds are selected for.
    #[must_use]
    pub const fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Returns the absolute URL of `file`.
    #[must_use]
    pub fn url(&self, file: &str) -> String {
        format!("{}{file}", self.base_url)
    }

    /// Fetches the latest-version pointer.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-200 status, or bad JSON.
    pub fn latest(&self) -> Result<LatestPointer> {
        self.get_json(&format!("{}_latest.json", self.product))
    }

    /// Decides whether an update is needed.
    ///
    /// The latest pointer is always fetched. A forced version wins over the
    /// comparison and is always reported as available.
    ///
    /// # Errors
    ///
    /// Returns an error if the latest pointer cannot be fetched.
    pub fn check_latest(&self, running: &str, forced: Option<&str>) -> Result<UpdateCheck> {
        tracing::info!("checking for latest version");
        let latest = self.latest()?;
        tracing::debug!(latest = %latest.latest, running, "found latest version");

        if let Some(forced) = forced {
            tracing::debug!(version = forced, "forcing update");
            return Ok(UpdateCheck::Available(forced.to_string()));
        }
        if latest.latest == running {
            return Ok(UpdateCheck::UpToDate);
        }
        Ok(UpdateCheck::Available(latest.latest))
    }

    /// Fetches the manifest of `version` and returns the entry built for
    /// this platform, if one was published.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-200 status, or bad JSON.
    pub fn resolve_manifest(&self, version: &str) -> Result<Option<ReleaseManifestEntry>> {
        let entries: Vec<ReleaseManifestEntry> =
            self.get_json(&format!("{}_{version}.json", self.product))?;
        Ok(select_entry(entries, &self.platform))
    }

    /// Downloads the artifact named by `entry`.
    ///
    /// Returns `Ok(None)` when the distribution point answers 401, 403, or
    /// 404, which means the build was never published.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or any other non-200 status.
    pub fn fetch_artifact(&self, entry: &ReleaseManifestEntry) -> Result<Option<Vec<u8>>> {
        let url = self.url(&entry.file);
        tracing::debug!(url = %url, "downloading artifact");

        let mut response = self.send(&url)?;
        match response.status() {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                tracing::info!(
                    url = %url,
                    status = response.status().as_u16(),
                    "artifact not published"
                );
                return Ok(None);
            }
            status => {
                return Err(UpdateError::Status {
                    url,
                    status: status.as_u16(),
                });
            }
        }

        let mut bytes = Vec::with_capacity(
            usize::try_from(response.content_length().unwrap_or(0)).unwrap_or(0),
        );
        let _ = response
            .read_to_end(&mut bytes)
            .map_err(|e| UpdateError::Download {
                url: url.clone(),
                source: e,
            })?;
        tracing::debug!(url = %url, bytes = bytes.len(), "artifact downloaded");
        Ok(Some(bytes))
    }

    fn send(&self, url: &str) -> Result<reqwest::blocking::Response> {
        self.client.get(url).send().map_err(|e| UpdateError::Http {
            url: url.to_string(),
            source: e,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let url = self.url(file);
        tracing::debug!(url = %url, "fetching manifest");
        let response = self.send(&url)?;
        if response.status() != StatusCode::OK {
            return Err(UpdateError::Status {
                url,
                status: response.status().as_u16(),
            });
        }
        let body = response.bytes().map_err(|e| UpdateError::Http {
            url: url.clone(),
            source: e,
        })?;
        serde_json::from_slice(&body).map_err(|e| UpdateError::Manifest { url, source: e })
    }
}

/// Returns the entry whose platform and architecture both match exactly.
#[must_use]
pub fn select_entry(
    entries: Vec<ReleaseManifestEntry>,
    platform: &Platform,
) -> Option<ReleaseManifestEntry> {
    entries
        .into_iter()
        .find(|e| e.platform == platform.os && e.architecture == platform.arch)
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn linux_amd64() -> Platform {
        Platform::new("linux", "amd64")
    }

    fn resolver(server: &MockServer, platform: Platform) -> ReleaseResolver {
        ReleaseResolver::new(server.url("/gocker/"), platform, Duration::from_secs(5)).unwrap()
    }

    fn manifest() -> serde_json::Value {
        json!([
            {
                "version": "1.2.0",
                "platform": "linux",
                "architecture": "amd64",
                "sha": "aa",
                "file": "gocker_1.2.0_linux_amd64.tar.gz",
            },
            {
                "version": "1.2.0",
                "platform": "linux",
                "architecture": "arm64",
                "sha": "bb",
                "file": "gocker_1.2.0_linux_arm64.tar.gz",
            },
            {
                "version": "1.2.0",
                "platform": "darwin",
                "architecture": "amd64",
                "sha": "cc",
                "file": "gocker_1.2.0_darwin_amd64.zip",
            },
        ])
    }

    #[test]
    fn check_latest_equal_versions_is_up_to_date() {
        let server = MockServer::start();
        let _ = server.mock(|when, then| {
            let _ = when.method(GET).path("/gocker/gocker_latest.json");
            let _ = then.status(200).json_body(json!({"latest": "1.2.0"}));
        });
        let check = resolver(&server, linux_amd64()).check_latest("1.2.0", None).unwrap();
        assert_eq!(check, UpdateCheck::UpToDate);
    }

    #[test]
    fn check_latest_different_version_is_available() {
        let server = MockServer::start();
        let _ = server.mock(|when, then| {
            let _ = when.method(GET).path("/gocker/gocker_latest.json");
            let _ = then.status(200).json_body(json!({"latest": "1.2.0"}));
        });
        let check = resolver(&server, linux_amd64()).check_latest("1.1.0", None).unwrap();
        assert_eq!(check, UpdateCheck::Available("1.2.0".into()));
    }

    #[test]
    fn check_latest_forced_version_always_updates() {
        let server = MockServer::start();
        let _ = server.mock(|when, then| {
            let _ = when.method(GET).path("/gocker/gocker_latest.json");
            let _ = then.status(200).json_body(json!({"latest": "1.2.0"}));
        });
        let check = resolver(&server, linux_amd64())
            .check_latest("1.2.0", Some("1.2.0"))
            .unwrap();
        assert_eq!(check, UpdateCheck::Available("1.2.0".into()));
    }

    #[test]
    fn check_latest_propagates_bad_status() {
        let server = MockServer::start();
        let _ = server.mock(|when, then| {
            let _ = when.method(GET).path("/gocker/gocker_latest.json");
            let _ = then.status(500);
        });
        let err = resolver(&server, linux_amd64()).check_latest("1.0.0", None).unwrap_err();
        assert!(matches!(err, UpdateError::Status { status: 500, .. }));
    }

    #[test]
    fn check_latest_rejects_malformed_pointer() {
        let server = MockServer::start();
        let _ = server.mock(|when, then| {
            let _ = when.method(GET).path("/gocker/gocker_latest.json");
            let _ = then.status(200).body("{\"version\": 3}");
        });
        let err = resolver(&server, linux_amd64()).check_latest("1.0.0", None).unwrap_err();
        assert!(matches!(err, UpdateError::Manifest { .. }));
    }

    #[test]
    fn resolve_manifest_selects_exact_platform_and_arch() {
        let server = MockServer::start();
        let _ = server.mock(|when, then| {
            let _ = when.method(GET).path("/gocker/gocker_1.2.0.json");
            let _ = then.status(200).json_body(manifest());
        });
        let entry = resolver(&server, Platform::new("linux", "arm64"))
            .resolve_manifest("1.2.0")
            .unwrap()
            .expect("entry");
        assert_eq!(entry.sha, "bb");
        assert_eq!(entry.file, "gocker_1.2.0_linux_arm64.tar.gz");
    }

    #[test]
    fn resolve_manifest_without_match_is_none() {
        let server = MockServer::start();
        let _ = server.mock(|when, then| {
            let _ = when.method(GET).path("/gocker/gocker_1.2.0.json");
            let _ = then.status(200).json_body(manifest());
        });
        let resolved = resolver(&server, Platform::new("darwin", "arm64"))
            .resolve_manifest("1.2.0")
            .unwrap();
        assert!(resolved.is_none());
        let resolved = resolver(&server, Platform::new("windows", "amd64"))
            .resolve_manifest("1.2.0")
            .unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn fetch_artifact_missing_build_is_none() {
        for status in [401, 403, 404] {
            let server = MockServer::start();
            let _ = server.mock(|when, then| {
                let _ = when.method(GET).path("/gocker/gocker_1.2.0_linux_amd64.tar.gz");
                let _ = then.status(status);
            });
            let entry = select_entry(
                serde_json::from_value(manifest()).unwrap(),
                &linux_amd64(),
            )
            .unwrap();
            let fetched = resolver(&server, linux_amd64()).fetch_artifact(&entry).unwrap();
            assert!(fetched.is_none(), "status {status}");
        }
    }

    #[test]
    fn fetch_artifact_server_error_is_an_error() {
        let server = MockServer::start();
        let _ = server.mock(|when, then| {
            let _ = when.method(GET).path("/gocker/gocker_1.2.0_linux_amd64.tar.gz");
            let _ = then.status(502);
        });
        let entry = select_entry(serde_json::from_value(manifest()).unwrap(), &linux_amd64())
            .unwrap();
        let err = resolver(&server, linux_amd64()).fetch_artifact(&entry).unwrap_err();
        assert!(matches!(err, UpdateError::Status { status: 502, .. }));
    }

    #[test]
    fn fetch_artifact_returns_body() {
        let server = MockServer::start();
        let _ = server.mock(|when, then| {
            let _ = when.method(GET).path("/gocker/gocker_1.2.0_linux_amd64.tar.gz");
            let _ = then.status(200).body("artifact-bytes");
        });
        let entry = select_entry(serde_json::from_value(manifest()).unwrap(), &linux_amd64())
            .unwrap();
        let bytes = resolver(&server, linux_amd64())
            .fetch_artifact(&entry)
            .unwrap()
            .expect("published");
        assert_eq!(bytes, b"artifact-bytes");
    }

    #[test]
    fn fetch_artifact_cut_off_body_is_a_download_error() {
        use std::io::{BufRead, BufReader, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            let mut stream = stream;
            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\npartial")
                .unwrap();
        });

        let entry = select_entry(serde_json::from_value(manifest()).unwrap(), &linux_amd64())
            .unwrap();
        let resolver = ReleaseResolver::new(
            format!("http://{addr}/gocker/"),
            linux_amd64(),
            Duration::from_secs(5),
        )
        .unwrap();
        let err = resolver.fetch_artifact(&entry).unwrap_err();
        server.join().unwrap();

        match err {
            UpdateError::Download { url, .. } => {
                assert!(url.ends_with("/gocker/gocker_1.2.0_linux_amd64.tar.gz"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn select_entry_requires_both_fields() {
        let entries: Vec<ReleaseManifestEntry> = serde_json::from_value(manifest()).unwrap();
        assert!(select_entry(entries.clone(), &Platform::new("linux", "386")).is_none());
        assert!(select_entry(entries.clone(), &Platform::new("freebsd", "amd64")).is_none());
        assert_eq!(
            select_entry(entries, &Platform::new("darwin", "amd64")).map(|e| e.sha),
            Some("cc".into())
        );
    }
}
