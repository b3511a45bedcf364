//! Logging infrastructure for zapstats.
//!
//! The server logs to a daily-rotated file under the XDG state dir
//! (`~/.local/state/zapstats/`), never to the response path: request
//! handling must not wait on log IO, so the writer is non-blocking and
//! the caller holds a [`LoggingGuard`] to flush on shutdown.

use crate::config::{Config, LoggingConfig};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// Initialize the logging system.
///
/// The level comes from `RUST_LOG` when set, otherwise from the config
/// file. Returns the guard that keeps the background writer alive.
pub fn init(config: &LoggingConfig) -> crate::error::Result<LoggingGuard> {
    let log_dir = Config::state_dir();
    std::fs::create_dir_all(&log_dir)?;

    let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "zapstats.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(writer)
        .with_ansi(false)
        .init();

    tracing::info!(
        log_dir = %log_dir.display(),
        level = %config.level,
        "Logging initialized"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Initialize logging for tests (captured per test via the test writer).
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Keeps the non-blocking writer alive; dropping it flushes pending
/// log writes.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Returns the log file path
pub fn log_file_path() -> PathBuf {
    Config::log_path()
}
