pub mod branch_file;
pub mod init;
pub mod logs;
pub mod mappings;
pub mod run;
pub mod schedule;

use std::path::PathBuf;

use anyhow::{Context, Result};

use hrsync_core::config::{self, Config};
use hrsync_core::paths;

pub(crate) fn home_dir() -> Result<PathBuf> {
    paths::home().context("could not determine home directory")
}

pub(crate) fn load_config(home: &std::path::Path) -> Result<Config> {
    config::load_at(home).context("failed to load config; run `hrsync init` first")
}
