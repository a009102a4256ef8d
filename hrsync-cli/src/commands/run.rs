//! `hrsync run`: one sync now.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use hrsync_core::config::MAX_LOOKBACK_DAYS;
use hrsync_core::UpsertPolicy;
use hrsync_daemon::LogFormat;
use hrsync_sync::{run_configured, JobReport, RunOptions, SyncWindow};

use super::{home_dir, load_config};

/// Arguments for `hrsync run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Fetch the last N days up to today's midnight (default: `sync.lookback_days`).
    #[arg(
        long,
        conflicts_with_all = ["start", "full"],
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_LOOKBACK_DAYS)),
    )]
    pub days: Option<u32>,

    /// First day of an explicit window (YYYY-MM-DD, inclusive).
    #[arg(long, requires = "end", conflicts_with = "full")]
    pub start: Option<NaiveDate>,

    /// Day after the explicit window (YYYY-MM-DD, exclusive).
    #[arg(long, requires = "start", conflicts_with = "full")]
    pub end: Option<NaiveDate>,

    /// Backfill everything since 1970-01-01.
    #[arg(long)]
    pub full: bool,

    /// Store entities but push no roles.
    #[arg(long)]
    pub skip_roles: bool,

    /// Skip entities that fail to store instead of aborting.
    #[arg(long)]
    pub continue_on_error: bool,

    /// Write the log file as JSON lines.
    #[arg(long)]
    pub json_logs: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let format = if self.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Text
        };
        hrsync_daemon::init_logging(&home, format).context("failed to set up logging")?;
        let config = load_config(&home)?;

        let window = self.window(Local::now().date_naive(), config.sync.lookback_days)?;
        let options = RunOptions {
            skip_roles: self.skip_roles,
            policy: self.continue_on_error.then_some(UpsertPolicy::Skip),
        };

        let report = run_configured(&home, &config, window, options).with_context(|| {
            format!("sync failed for [{}, {})", window.start, window.end)
        })?;
        print_report(&window, &report);

        if !report.is_ok() {
            let unsafe_roles = report.unsafe_roles();
            if unsafe_roles.is_empty() {
                bail!("one or more role pushes failed; see the log for details");
            }
            let ids: Vec<String> = unsafe_roles.iter().map(|r| r.to_string()).collect();
            bail!(
                "role(s) {} were cleared and not recreated; re-run `hrsync run` now",
                ids.join(", ")
            );
        }
        Ok(())
    }

    fn window(&self, today: NaiveDate, lookback_days: u32) -> Result<SyncWindow> {
        if self.full {
            return Ok(SyncWindow::full(today));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start >= end {
                bail!("--start {start} must be before --end {end}");
            }
            return Ok(SyncWindow {
                start: start.and_time(NaiveTime::MIN),
                end: end.and_time(NaiveTime::MIN),
                incremental: false,
            });
        }
        Ok(SyncWindow::lookback(
            today,
            self.days.unwrap_or(lookback_days),
        )?)
    }
}

#[derive(Tabled)]
struct FetchRow {
    #[tabled(rename = "kind")]
    kind: String,
    #[tabled(rename = "fetched")]
    fetched: usize,
    #[tabled(rename = "inserted")]
    inserted: usize,
    #[tabled(rename = "updated")]
    updated: usize,
    #[tabled(rename = "failed")]
    failed: usize,
}

fn print_report(window: &SyncWindow, report: &JobReport) {
    println!("Sync window [{}, {})", window.start, window.end);

    let rows: Vec<FetchRow> = report
        .fetched
        .iter()
        .map(|s| FetchRow {
            kind: s.kind.to_string(),
            fetched: s.fetched,
            inserted: s.inserted,
            updated: s.updated,
            failed: s.failed,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    for role in &report.roles {
        match &role.result {
            Ok(pushed) => println!(
                "{} {} ({}): {} paths, {} staff",
                "✓".green(),
                role.kind,
                role.role_id,
                pushed.mappings,
                pushed.staff
            ),
            Err(err) => {
                let mark = if err.is_unsafe() {
                    "✗".red().bold()
                } else {
                    "✗".yellow()
                };
                let hint = if err.is_retryable() {
                    "retryable, re-run later"
                } else {
                    "not retryable, check the role configuration"
                };
                println!("{mark} {}: {err} ({hint})", role.kind);
            }
        }
    }
}
