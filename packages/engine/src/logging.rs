//! Tracing setup for the `deutschmemo` binary.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "deutschmemo.log";

/// Keeps the background file writer alive; drop it last.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Installs the global subscriber. Events go to stderr, leaving stdout to
/// command output, and additionally to a daily rolling file when
/// `ENABLE_FILE_LOGS` is set (directory from `LOG_DIR`, default `./logs`).
pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let log_dir = file_log_dir(
        std::env::var("ENABLE_FILE_LOGS").ok().as_deref(),
        std::env::var("LOG_DIR").ok(),
    );
    let (file_layer, guard) = match log_dir.map(open_log_dir) {
        Some(Ok(dir)) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(FileLogGuard { _guard: guard }))
        }
        Some(Err((dir, err))) => {
            eprintln!("file logging disabled, cannot create {}: {err}", dir.display());
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

/// Directory for the log file, or `None` when file logging is off.
fn file_log_dir(enabled: Option<&str>, dir: Option<String>) -> Option<PathBuf> {
    matches!(enabled, Some("true" | "1"))
        .then(|| PathBuf::from(dir.unwrap_or_else(|| "./logs".to_string())))
}

fn open_log_dir(dir: PathBuf) -> Result<PathBuf, (PathBuf, std::io::Error)> {
    match std::fs::create_dir_all(&dir) {
        Ok(()) => Ok(dir),
        Err(err) => Err((dir, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_logging_off_by_default() {
        assert_eq!(file_log_dir(None, Some("/var/log/dm".into())), None);
        assert_eq!(file_log_dir(Some("false"), None), None);
        assert_eq!(file_log_dir(Some("yes"), None), None);
    }

    #[test]
    fn file_logging_directory() {
        assert_eq!(file_log_dir(Some("1"), None), Some(PathBuf::from("./logs")));
        assert_eq!(
            file_log_dir(Some("true"), Some("/var/log/dm".into())),
            Some(PathBuf::from("/var/log/dm"))
        );
    }

    #[test]
    fn open_log_dir_creates_nested_directories() {
        let root = tempfile::TempDir::new().unwrap();
        let dir = root.path().join("a").join("b");

        assert_eq!(open_log_dir(dir.clone()).unwrap(), dir);
        assert!(dir.is_dir());
    }
}
