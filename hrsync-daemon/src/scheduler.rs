//! Daily scheduler.
//!
//! Sleeps until the next configured local time, runs the job on the blocking
//! pool, and repeats. A wake-up later than the misfire grace skips that day's
//! run. A failed job is logged and the loop keeps going. The shutdown future
//! (ctrl-c in production) ends the loop; a job already running is awaited
//! first.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDateTime, NaiveTime};

use hrsync_core::config::ScheduleConfig;
use hrsync_core::ConfigError;
use hrsync_sync::{JobReport, SyncError};

use crate::error::DaemonError;

/// When the daily job fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    at: NaiveTime,
    misfire_grace: Duration,
}

impl Schedule {
    pub fn new(hour: u32, minute: u32, misfire_grace: Duration) -> Result<Self, DaemonError> {
        let at = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| {
            ConfigError::Invalid(format!("schedule {hour:02}:{minute:02} is not a valid time of day"))
        })?;
        Ok(Self { at, misfire_grace })
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self, DaemonError> {
        Self::new(
            config.hour,
            config.minute,
            Duration::from_secs(config.misfire_grace_secs),
        )
    }

    /// The first slot strictly after `now`.
    pub fn next_run_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.at);
        if today > now {
            today
        } else {
            let tomorrow = now.date() + Days::new(1);
            tomorrow.and_time(self.at)
        }
    }

    /// Woke up too long after `scheduled` to still run it.
    pub fn is_misfire(&self, scheduled: NaiveDateTime, woke_at: NaiveDateTime) -> bool {
        match (woke_at - scheduled).to_std() {
            Ok(late) => late > self.misfire_grace,
            Err(_) => false,
        }
    }
}

fn log_outcome(result: Result<Result<JobReport, SyncError>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(report)) if report.is_ok() => {
            tracing::info!(roles = report.roles.len(), "scheduled sync finished");
        }
        Ok(Ok(report)) => {
            let ids = |roles: Vec<&hrsync_core::RoleId>| -> Vec<String> {
                roles.iter().map(|r| r.to_string()).collect()
            };
            tracing::error!(
                unsafe_roles = ?ids(report.unsafe_roles()),
                retryable_roles = ?ids(report.retryable_roles()),
                "scheduled sync finished with role push failures"
            );
        }
        Ok(Err(err)) => tracing::error!(error = %err, "scheduled sync failed"),
        Err(err) => tracing::error!(error = %err, "scheduled sync task panicked or was cancelled"),
    }
}

/// Run `job` every day per `schedule` until `shutdown` resolves.
///
/// `now` supplies local wall-clock time. Returns how many jobs were started.
pub async fn run_until<J, N, S>(
    schedule: Schedule,
    job: Arc<J>,
    now: N,
    shutdown: S,
) -> Result<usize, DaemonError>
where
    J: Fn() -> Result<JobReport, SyncError> + Send + Sync + 'static,
    N: Fn() -> NaiveDateTime,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut started = 0usize;

    loop {
        let current = now();
        let next = schedule.next_run_after(current);
        let wait = (next - current).to_std().unwrap_or_default();
        tracing::info!(next_run = %next, "next sync scheduled");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = &mut shutdown => {
                tracing::info!("scheduler stopping");
                return Ok(started);
            }
        }

        let woke_at = now();
        if schedule.is_misfire(next, woke_at) {
            tracing::warn!(scheduled = %next, woke_at = %woke_at, "missed run beyond grace period, skipped");
            continue;
        }

        started += 1;
        let job = job.clone();
        let mut handle = tokio::task::spawn_blocking(move || job());
        tokio::select! {
            result = &mut handle => log_outcome(result),
            _ = &mut shutdown => {
                tracing::info!("shutdown requested, waiting for the running sync to finish");
                log_outcome(handle.await);
                return Ok(started);
            }
        }
    }
}

/// Resolves on ctrl-c. If the handler cannot be installed it never resolves.
pub async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received ctrl-c"),
        Err(err) => {
            tracing::error!(error = %err, "ctrl-c handler failed");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;
    use tokio::time::Instant;

    use super::*;

    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn two_am() -> Schedule {
        Schedule::new(2, 0, Duration::from_secs(3600)).unwrap()
    }

    #[test]
    fn next_run_later_today() {
        assert_eq!(two_am().next_run_after(at(1, 1, 30, 0)), at(1, 2, 0, 0));
    }

    #[test]
    fn next_run_crosses_midnight() {
        assert_eq!(two_am().next_run_after(at(1, 23, 59, 59)), at(2, 2, 0, 0));
        // Exactly on the slot means the slot is taken; next is tomorrow.
        assert_eq!(two_am().next_run_after(at(1, 2, 0, 0)), at(2, 2, 0, 0));
    }

    #[test]
    fn next_run_crosses_month_end() {
        let now = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(3, 0, 0)
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(2, 0, 0)
            .unwrap();
        assert_eq!(two_am().next_run_after(now), expected);
    }

    #[test]
    fn misfire_only_beyond_grace() {
        let s = two_am();
        assert!(!s.is_misfire(at(1, 2, 0, 0), at(1, 2, 0, 1)));
        assert!(!s.is_misfire(at(1, 2, 0, 0), at(1, 3, 0, 0)));
        assert!(s.is_misfire(at(1, 2, 0, 0), at(1, 3, 0, 1)));
    }

    #[test]
    fn invalid_time_is_config_error() {
        let err = Schedule::new(24, 0, Duration::ZERO).unwrap_err();
        assert!(matches!(err, DaemonError::Config(ConfigError::Invalid(_))));
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn runs_at_slot_and_keeps_going_after_failure() {
        let base = at(1, 1, 59, 0);
        let origin = Instant::now();
        let now = move || base + chrono::Duration::from_std(origin.elapsed()).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let job = Arc::new(move || -> Result<JobReport, SyncError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(SyncError::Config(ConfigError::Invalid("boom".into())))
        });

        // Two daily slots pass before shutdown: 1 min and 24 h 1 min in.
        let shutdown = tokio::time::sleep(Duration::from_secs(25 * 3600));
        let started = run_until(two_am(), job, now, shutdown).await.unwrap();

        assert_eq!(started, 2);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn shutdown_before_first_slot_runs_nothing() {
        let base = at(1, 1, 0, 0);
        let origin = Instant::now();
        let now = move || base + chrono::Duration::from_std(origin.elapsed()).unwrap();
        let job = Arc::new(|| -> Result<JobReport, SyncError> { Ok(JobReport::default()) });

        let shutdown = tokio::time::sleep(Duration::from_secs(60));
        let started = run_until(two_am(), job, now, shutdown).await.unwrap();
        assert_eq!(started, 0);
    }
}
