//! On-disk layout.
//!
//! ```text
//! ~/.hrsync/
//!   config.yaml
//!   data/hrsync.db
//!   cache/beisen_token.json
//!   cache/hesi_token.json
//!   download/
//!   logs/hrsync.log
//! ```

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "config.yaml";
pub const DATABASE_FILE: &str = "hrsync.db";
pub const BEISEN_TOKEN_FILE: &str = "beisen_token.json";
pub const HESI_TOKEN_FILE: &str = "hesi_token.json";
pub const LOG_FILE: &str = "hrsync.log";

pub fn hrsync_root(home: &Path) -> PathBuf {
    home.join(".hrsync")
}

pub fn config_path(home: &Path) -> PathBuf {
    hrsync_root(home).join(CONFIG_FILE)
}

pub fn data_dir(home: &Path) -> PathBuf {
    hrsync_root(home).join("data")
}

pub fn database_path(home: &Path) -> PathBuf {
    data_dir(home).join(DATABASE_FILE)
}

pub fn cache_dir(home: &Path) -> PathBuf {
    hrsync_root(home).join("cache")
}

pub fn beisen_token_path(home: &Path) -> PathBuf {
    cache_dir(home).join(BEISEN_TOKEN_FILE)
}

pub fn hesi_token_path(home: &Path) -> PathBuf {
    cache_dir(home).join(HESI_TOKEN_FILE)
}

pub fn download_dir(home: &Path) -> PathBuf {
    hrsync_root(home).join("download")
}

pub fn logs_dir(home: &Path) -> PathBuf {
    hrsync_root(home).join("logs")
}

pub fn log_path(home: &Path) -> PathBuf {
    logs_dir(home).join(LOG_FILE)
}

/// The current user's home directory.
pub fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}
