//! System-wide constants and default values.

/// Product name used in release file names and the user agent.
pub const APP_NAME: &str = "gocker";

/// Version embedded in the running binary.
///
/// Release builds stamp `GOCKER_VERSION` at compile time; local builds fall
/// back to the crate version.
pub const VERSION: &str = match option_env!("GOCKER_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

/// Build date stamped at compile time, empty for local builds.
pub const BUILD_DATE: &str = match option_env!("GOCKER_BUILD_DATE") {
    Some(date) => date,
    None => "",
};

/// Default location of the docker CLI.
pub const DEFAULT_DOCKER_PATH: &str = "/usr/local/bin/docker";

/// Default base URL of the notification endpoint.
pub const DEFAULT_NOTIFIER_ENDPOINT: &str = "https://app.cloud66.com/";

/// Default base URL where release manifests and artifacts are published.
pub const DEFAULT_DOWNLOAD_URL: &str = "http://downloads.cloud66.com.s3.amazonaws.com/gocker/";

/// Default poll interval.
pub const DEFAULT_POLL_INTERVAL: &str = "5s";

/// Default scavenge interval.
pub const DEFAULT_SCAVENGE_INTERVAL: &str = "10s";

/// Default full resync interval.
pub const DEFAULT_RESYNC_INTERVAL: &str = "30m";

/// Default interval between update checks.
pub const DEFAULT_UPDATE_INTERVAL: &str = "30m";

/// Default per-request HTTP timeout.
pub const DEFAULT_HTTP_TIMEOUT: &str = "30s";

/// Container uid length in hex characters.
pub const CONTAINER_UID_LENGTH: usize = 64;

/// Environment variable overriding the detected platform.
pub const PLATFORM_ENV: &str = "GOCKER_PLATFORM";

/// Environment variable overriding the detected architecture.
pub const ARCH_ENV: &str = "GOCKER_ARCH";

/// Returns the user agent sent with every outgoing HTTP request.
#[must_use]
pub fn user_agent() -> String {
    let host = crate::types::Platform::host();
    format!("{APP_NAME}/{VERSION} ({}; {})", host.os, host.arch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_carries_product_and_version() {
        let agent = user_agent();
        assert!(agent.starts_with(&format!("gocker/{VERSION} (")));
        assert!(agent.ends_with(')'));
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!VERSION.is_empty());
    }
}
