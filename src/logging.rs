//! File-only structured logging.
//!
//! The terminal belongs to the renderer, so nothing is written to stderr
//! once the subscriber is installed. `RUST_LOG` overrides the `info` default.

use std::path::PathBuf;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "soilminer.log";
pub const LOG_DIR_ENV: &str = "SOILMINER_LOG_DIR";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("could not create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("a global subscriber is already installed: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs the subscriber. Keep the returned guard alive for the whole
/// run; dropping it flushes and stops the writer thread.
pub fn init() -> Result<WorkerGuard, LoggingError> {
    let dir = log_directory(
        std::env::var_os(LOG_DIR_ENV).map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    );
    std::fs::create_dir_all(&dir).map_err(|source| LoggingError::CreateDir {
        path: dir.clone(),
        source,
    })?;

    let file_appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()?;

    tracing::info!(file = %dir.join(LOG_FILE).display(), "logging initialized");
    Ok(guard)
}

fn log_directory(explicit: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = explicit.filter(|d| !d.as_os_str().is_empty()) {
        return dir;
    }
    match home {
        Some(home) => home.join(".local/state/soilminer"),
        None => PathBuf::from("logs"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let dir = log_directory(Some("/tmp/sm".into()), Some("/home/u".into()));
        assert_eq!(dir, PathBuf::from("/tmp/sm"));
    }

    #[test]
    fn falls_back_to_home_then_cwd() {
        assert_eq!(
            log_directory(None, Some("/home/u".into())),
            PathBuf::from("/home/u/.local/state/soilminer")
        );
        assert_eq!(log_directory(Some("".into()), None), PathBuf::from("logs"));
    }
}
