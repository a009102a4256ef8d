//! `hrsync branch-file [--dest DIR]`

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use hrsync_core::paths;
use hrsync_remote::SystemClock;
use hrsync_sync::job::Clients;

use super::{home_dir, load_config};

/// Download the bank-branch spreadsheet.
#[derive(Args, Debug)]
pub struct BranchFileArgs {
    /// Directory to save into (default: ~/.hrsync/download).
    #[arg(long)]
    pub dest: Option<PathBuf>,
}

impl BranchFileArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        hrsync_daemon::init_console();
        let config = load_config(&home)?;
        let dest = self.dest.unwrap_or_else(|| paths::download_dir(&home));

        let clients = Clients::connect(&home, &config);
        let saved = clients
            .hesi
            .download_branch_file(
                &dest,
                Duration::from_secs(config.branch_file.retry_delay_secs),
                config.branch_file.max_retries,
                &SystemClock,
            )
            .context("failed to download the bank-branch file")?;
        println!("✓ Saved {}", saved.display());
        Ok(())
    }
}
