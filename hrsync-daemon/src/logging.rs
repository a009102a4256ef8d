//! Tracing setup: console plus `~/.hrsync/logs/hrsync.log`.
//!
//! The filter comes from `RUST_LOG` and defaults to `info`. `log` records from
//! crates that log through the `log` facade are bridged into the same
//! subscriber.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use hrsync_core::paths;

use crate::error::{io_err, DaemonError};
use crate::log_rotation::RotationPolicy;

/// Line format of the log file. The console is always plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Console-only logging for short commands.
pub fn init_console() {
    let _ = fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Console and file logging under `home`, rotating the file first.
///
/// Returns the log file path. Calling it again in the same process leaves the
/// first subscriber in place.
pub fn init(home: &Path, format: LogFormat) -> Result<PathBuf, DaemonError> {
    let dir = paths::logs_dir(home);
    fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

    let log_path = paths::log_path(home);
    let rotated = RotationPolicy::default()
        .rotate(&log_path)
        .map_err(|e| io_err(&log_path, e))?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| io_err(&log_path, e))?;
    let writer = Mutex::new(file);

    let file_layer = match format {
        LogFormat::Text => fmt::layer().with_ansi(false).with_writer(writer).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    };
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(env_filter())
        .try_init();

    if let Some(rotated) = rotated {
        tracing::info!(
            archived = %rotated.archived.display(),
            bytes = rotated.bytes,
            dropped = ?rotated.dropped,
            "log file rotated"
        );
    }
    Ok(log_path)
}
