//! `hrsync init [--force]`

use anyhow::{Context, Result};
use clap::Args;

use hrsync_core::{config, paths};
use hrsync_store::Store;

use super::home_dir;

/// Write a template config and create the local database.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config.yaml with the template.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;

        let written = config::init_at(&home, self.force).context("failed to write config")?;
        let config_path = paths::config_path(&home);
        if written {
            println!("✓ Wrote template config: {}", config_path.display());
            println!("  Fill in the credentials and role ids before running a sync.");
        } else {
            println!(
                "Config already exists: {} (use --force to overwrite)",
                config_path.display()
            );
        }

        let db_path = paths::database_path(&home);
        let mut store = Store::open(&db_path)
            .with_context(|| format!("failed to open database '{}'", db_path.display()))?;
        let seeded = store
            .initialize_employee_status()
            .context("failed to seed employee statuses")?;
        let statuses = store
            .employee_statuses()
            .context("failed to read employee statuses")?;
        println!("✓ Database ready: {}", db_path.display());
        if seeded > 0 {
            println!("  Seeded {seeded} employee statuses");
        }
        let labels: Vec<String> = statuses
            .iter()
            .map(|(code, name)| format!("{code}={name}"))
            .collect();
        println!("  Employee statuses: {}", labels.join(", "));
        Ok(())
    }
}
