//! `hrsync schedule [--hour H] [--minute M]`

use anyhow::{Context, Result};
use clap::Args;

use hrsync_daemon::{start_blocking, LogFormat};

use super::{home_dir, load_config};

/// Run the sync daily until ctrl-c.
#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Local hour to run at (overrides `schedule.hour`).
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
    pub hour: Option<u32>,

    /// Minute past the hour (overrides `schedule.minute`).
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..60))]
    pub minute: Option<u32>,

    /// Write the log file as JSON lines.
    #[arg(long)]
    pub json_logs: bool,
}

impl ScheduleArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let mut config = load_config(&home)?;
        if let Some(hour) = self.hour {
            config.schedule.hour = hour;
        }
        if let Some(minute) = self.minute {
            config.schedule.minute = minute;
        }

        let format = if self.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Text
        };
        let runs = start_blocking(&home, config, format).context("scheduler exited with error")?;
        println!("scheduler stopped after {runs} run(s)");
        Ok(())
    }
}
