//! hrsync store: SQLite persistence for synced HR entities.
//!
//! - [`Store`]: open, schema reconciliation, per-entity upsert, status seed
//! - role-mapping reads (`organization_staff_mapping`, `manager_org_path`)
//! - [`StoreError`]

pub mod error;
mod mapping;
mod record;
pub mod schema;
pub mod store;

pub use error::StoreError;
pub use schema::SchemaReport;
pub use store::{Store, UpsertOutcome};
