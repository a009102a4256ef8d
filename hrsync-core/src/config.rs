//! YAML configuration at `~/.hrsync/config.yaml`.
//!
//! # API pattern
//!
//! As with every file under `~/.hrsync/`, each function takes an explicit
//! `home`; the CLI resolves it once with [`crate::paths::home`]. Tests use a
//! `TempDir` as home.
//!
//! Credentials have no defaults. Every other section may be omitted and falls
//! back to the values below.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::paths::{config_path, hrsync_root};
use crate::types::{PathType, RoleId, StaffKeyKind};

pub const DEFAULT_BEISEN_BASE_URL: &str = "https://openapi.italent.cn";
pub const DEFAULT_HESI_LOCATION_URL: &str = "https://app.ekuaibao.com/api/openapi/v2/location";

/// Root of `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub beisen: BeisenConfig,
    pub hesi: HesiConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub roles: RolesConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub branch_file: BranchFileConfig,
}

/// HR platform credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeisenConfig {
    pub app_key: String,
    pub app_secret: String,
    #[serde(default = "default_beisen_base_url")]
    pub base_url: String,
}

/// Expense platform credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HesiConfig {
    pub app_key: String,
    pub app_security: String,
    pub corp_id: String,
    /// Endpoint that resolves the tenant's API base URL.
    #[serde(default = "default_hesi_location_url")]
    pub location_url: String,
}

/// What to do when a single entity fails to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpsertPolicy {
    /// Stop the batch at the first failing entity.
    #[default]
    Abort,
    /// Log the failure and continue with the next entity.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Days before today's midnight a scheduled run looks back.
    pub lookback_days: u32,
    /// Longest span a single time-window query may cover.
    pub max_window_days: u32,
    /// Records per scroll page.
    pub page_capacity: u32,
    pub requests_per_second: u32,
    pub requests_per_minute: u32,
    pub on_upsert_error: UpsertPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            max_window_days: 90,
            page_capacity: 300,
            requests_per_second: 100,
            requests_per_minute: 3000,
            on_upsert_error: UpsertPolicy::Abort,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RolesConfig {
    pub staff_by: StaffKeyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_leaders: Option<LeaderRoleConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managers: Option<ManagerRoleConfig>,
}

/// Role whose members are the persons in charge of each department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderRoleConfig {
    pub role_id: RoleId,
    #[serde(default)]
    pub path_type: PathType,
}

/// Role whose members are active employees at manager job levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerRoleConfig {
    pub role_id: RoleId,
    /// `job_level_text` values that count as manager tiers.
    #[serde(default = "default_manager_job_levels")]
    pub job_levels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub hour: u32,
    pub minute: u32,
    /// A run woken up later than this after its slot is skipped.
    pub misfire_grace_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            hour: 2,
            minute: 0,
            misfire_grace_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchFileConfig {
    pub retry_delay_secs: u64,
    pub max_retries: u32,
}

impl Default for BranchFileConfig {
    fn default() -> Self {
        Self {
            retry_delay_secs: 120,
            max_retries: 3,
        }
    }
}

fn default_beisen_base_url() -> String {
    DEFAULT_BEISEN_BASE_URL.to_string()
}

fn default_hesi_location_url() -> String {
    DEFAULT_HESI_LOCATION_URL.to_string()
}

/// Longest lookback a run may ask for, in days.
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

pub fn default_manager_job_levels() -> Vec<String> {
    vec!["manager".to_string(), "general-manager".to_string()]
}

impl Config {
    /// A config with placeholder credentials, used by `hrsync init`.
    pub fn template() -> Self {
        Self {
            beisen: BeisenConfig {
                app_key: "<beisen app key>".to_string(),
                app_secret: "<beisen app secret>".to_string(),
                base_url: default_beisen_base_url(),
            },
            hesi: HesiConfig {
                app_key: "<hesi app key>".to_string(),
                app_security: "<hesi app security>".to_string(),
                corp_id: "<hesi corp id>".to_string(),
                location_url: default_hesi_location_url(),
            },
            sync: SyncConfig::default(),
            http: HttpConfig::default(),
            roles: RolesConfig {
                staff_by: StaffKeyKind::Code,
                department_leaders: Some(LeaderRoleConfig {
                    role_id: RoleId::from("<leader role id>"),
                    path_type: PathType::Name,
                }),
                managers: Some(ManagerRoleConfig {
                    role_id: RoleId::from("<manager role id>"),
                    job_levels: default_manager_job_levels(),
                }),
            },
            schedule: ScheduleConfig::default(),
            branch_file: BranchFileConfig::default(),
        }
    }

    /// Reject values that would make the pipeline loop or divide by zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.sync.lookback_days) {
            return Err(ConfigError::Invalid(format!(
                "sync.lookback_days must be between 1 and {MAX_LOOKBACK_DAYS}, got {}",
                self.sync.lookback_days
            )));
        }
        if self.sync.max_window_days == 0 {
            return Err(ConfigError::Invalid(
                "sync.max_window_days must be greater than zero".into(),
            ));
        }
        if self.sync.requests_per_second == 0 || self.sync.requests_per_minute == 0 {
            return Err(ConfigError::Invalid(
                "sync rate limits must be greater than zero".into(),
            ));
        }
        if self.sync.page_capacity == 0 {
            return Err(ConfigError::Invalid(
                "sync.page_capacity must be greater than zero".into(),
            ));
        }
        if self.schedule.hour > 23 || self.schedule.minute > 59 {
            return Err(ConfigError::Invalid(format!(
                "schedule {:02}:{:02} is not a valid time of day",
                self.schedule.hour, self.schedule.minute
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load and validate `<home>/.hrsync/config.yaml`.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with
/// path + line context) if malformed.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    let path = config_path(home);
    if !path.exists() {
        return Err(ConfigError::NotFound { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let config: Config =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })?;
    config.validate()?;
    Ok(config)
}

/// Atomically save `config` to `<home>/.hrsync/config.yaml`.
///
/// The file holds credentials, so it is written `0600` inside a `0700`
/// directory via a `.tmp` sibling and a rename.
pub fn save_at(home: &Path, config: &Config) -> Result<(), ConfigError> {
    let root = hrsync_root(home);
    if !root.exists() {
        std::fs::create_dir_all(&root).map_err(|e| io_err(&root, e))?;
        set_dir_permissions(&root)?;
    }
    let path = config_path(home);
    let tmp = path.with_extension("yaml.tmp");

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// Write the template config unless one exists (or `force` is set).
///
/// Returns `true` when a file was written.
pub fn init_at(home: &Path, force: bool) -> Result<bool, ConfigError> {
    if config_path(home).exists() && !force {
        return Ok(false);
    }
    save_at(home, &Config::template())?;
    Ok(true)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
