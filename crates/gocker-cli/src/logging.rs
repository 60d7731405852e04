//! Subscriber setup for the `gocker` binary.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `level` when set. With `log_file` the output is
/// appended to that file, otherwise it goes to stderr.
///
/// # Errors
///
/// Returns an error if the level is not a valid filter or the log file
/// cannot be opened.
pub fn init(level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(normalize_level(level)))
        .with_context(|| format!("invalid log level {level:?}"))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

/// Maps level names used by older agent configurations onto tracing levels.
fn normalize_level(level: &str) -> &str {
    match level.trim() {
        "warning" => "warn",
        "fatal" | "panic" => "error",
        other => other,
    }
}
