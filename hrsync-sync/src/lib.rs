//! # hrsync-sync
//!
//! Pipeline orchestration on top of the store and the backend clients.
//!
//! - [`pipeline::fetch_and_store`] pulls every entity kind for a window into
//!   the store.
//! - [`reconcile::replace_role_staff`] replaces one role's associations in the
//!   remote registry.
//! - [`job::run_job`] chains both into one run; [`job::run_configured`] wires
//!   it to the live backends for the CLI and the scheduler.

pub mod error;
pub mod job;
pub mod pipeline;
pub mod reconcile;

pub use error::SyncError;
pub use job::{run_configured, run_job, JobContext, JobReport, RoleKind, RoleOutcome, RunOptions};
pub use pipeline::{fetch_and_store, FetchSummary, SyncWindow};
pub use reconcile::{replace_role_staff, ReconcileError, ReconcileReport, ReconcileStep};
