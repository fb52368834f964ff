//! Logging setup.
//!
//! Structured `tracing` output to two places:
//! - a session log file, cleared when logging starts
//! - stdout, for watching a drive live
//!
//! Filtering follows `RUST_LOG` and defaults to `info`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use time::format_description::well_known::Rfc3339;
use time::UtcOffset;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the file writer alive; dropping it flushes and closes the log.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    log_path: PathBuf,
}

impl LoggingGuard {
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

/// Install the global subscriber.
///
/// Creates `log_dir` if needed and truncates `log_dir/log_file`.
///
/// # Errors
///
/// Fails if the directory cannot be created, the log file cannot be
/// cleared, or a global subscriber is already installed.
pub fn init_logging(log_dir: &Path, log_file: &str) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(log_file);
    fs::write(&log_path, "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_timer(local_timer())
        .with_target(true);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .with_timer(local_timer())
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_path,
    })
}

/// Local-time RFC 3339 timestamps, UTC when the offset cannot be determined.
fn local_timer() -> OffsetTime<Rfc3339> {
    OffsetTime::local_rfc_3339().unwrap_or_else(|_| OffsetTime::new(UtcOffset::UTC, Rfc3339))
}

/// `~/.cockpitmap/logs`
pub fn default_log_dir() -> PathBuf {
    crate::config::config_directory().join("logs")
}

pub fn default_log_file() -> &'static str {
    "cockpitmap.log"
}
