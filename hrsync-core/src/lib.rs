//! hrsync core library: domain types, configuration, on-disk layout, errors.
//!
//! - [`types`]: entities, enumerations and role mappings
//! - [`config`]: `config.yaml` load / save / init
//! - [`paths`]: the `~/.hrsync/` layout
//! - [`token_cache`]: cached backend tokens
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod paths;
pub mod token_cache;
pub mod types;

pub use config::{Config, UpsertPolicy};
pub use error::ConfigError;
pub use token_cache::TokenCacheFile;
pub use types::{
    split_tree_path, Corporation, Employee, EmployeeStatus, EmploymentForm, Entity, EntityKind,
    JobLevel, Organization, PathType, RoleId, RoleMapping, StaffKeyKind,
};
