//! `hrsync schedule`: logging, config and the daily loop on a tokio runtime.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

use hrsync_core::config::Config;
use hrsync_core::paths;
use hrsync_sync::{run_configured, RunOptions, SyncWindow};

use crate::error::{io_err, DaemonError};
use crate::logging::{self, LogFormat};
use crate::scheduler::{self, Schedule};

/// Start the scheduler and block the current thread until ctrl-c.
///
/// `config` is taken as given so callers can apply command-line overrides.
/// Returns how many runs were started.
pub fn start_blocking(home: &Path, config: Config, format: LogFormat) -> Result<usize, DaemonError> {
    let log_path = logging::init(home, format)?;
    tracing::info!(log = %log_path.display(), "logging to file");
    config.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(home.to_path_buf(), config))
}

/// Run the daily loop with an already loaded `config`.
pub async fn run(home: PathBuf, config: Config) -> Result<usize, DaemonError> {
    let schedule = Schedule::from_config(&config.schedule)?;
    tracing::info!(
        hour = config.schedule.hour,
        minute = config.schedule.minute,
        db = %paths::database_path(&home).display(),
        "scheduler started"
    );

    let lookback = config.sync.lookback_days;
    let job = Arc::new(move || {
        let window = SyncWindow::lookback(Local::now().date_naive(), lookback)?;
        run_configured(&home, &config, window, RunOptions::default())
    });

    let started = scheduler::run_until(
        schedule,
        job,
        || Local::now().naive_local(),
        scheduler::ctrl_c(),
    )
    .await?;
    tracing::info!(runs = started, "scheduler exited");
    Ok(started)
}
