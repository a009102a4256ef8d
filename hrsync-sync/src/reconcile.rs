//! Replace a role's staff associations in the remote registry.
//!
//! ## Steps
//!
//! 1. **Validate**: refuse an empty mapping list before touching the registry.
//! 2. **Activate**: authorize the union of all staff in one call.
//! 3. **Delete**: clear every association of the role.
//! 4. **Recreate**: write the full mapping content in one call.
//!
//! A failure at any step stops the run. Steps 1–3 leave the role as it was.
//! A failure at step 4 leaves the role with no associations; there is no
//! rollback and no retry, so the error is flagged unsafe and an operator must
//! re-run.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use hrsync_core::{RoleId, RoleMapping, StaffKeyKind};
use hrsync_remote::{RemoteError, RoleRegistry};

/// A step of [`replace_role_staff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStep {
    Validate,
    Activate,
    Delete,
    Recreate,
}

impl fmt::Display for ReconcileStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileStep::Validate => write!(f, "validate"),
            ReconcileStep::Activate => write!(f, "activate"),
            ReconcileStep::Delete => write!(f, "delete"),
            ReconcileStep::Recreate => write!(f, "recreate"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconcileCause {
    #[error("no role mappings to push")]
    EmptyMappings,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

#[derive(Debug, Error)]
#[error("role {role_id}: {step} step failed: {source}")]
pub struct ReconcileError {
    pub role_id: RoleId,
    pub step: ReconcileStep,
    #[source]
    pub source: ReconcileCause,
}

impl ReconcileError {
    /// The role's associations were deleted and not recreated.
    pub fn is_unsafe(&self) -> bool {
        self.step == ReconcileStep::Recreate
    }

    /// The remote failure may succeed on a later run (timeout, throttling,
    /// server error). Always false for a refused empty mapping list.
    pub fn is_retryable(&self) -> bool {
        match &self.source {
            ReconcileCause::EmptyMappings => false,
            ReconcileCause::Remote(remote) => remote.is_retryable(),
        }
    }
}

/// What a successful replace pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub role_id: RoleId,
    pub mappings: usize,
    pub staff: usize,
}

/// Distinct staff across all mappings, first-seen order.
fn staff_union(mappings: &[RoleMapping]) -> Vec<String> {
    let mut seen = HashSet::new();
    mappings
        .iter()
        .flat_map(|m| m.staffs.iter())
        .filter(|s| seen.insert(*s))
        .cloned()
        .collect()
}

pub fn replace_role_staff(
    registry: &dyn RoleRegistry,
    role_id: &RoleId,
    mappings: &[RoleMapping],
    staff_by: StaffKeyKind,
) -> Result<ReconcileReport, ReconcileError> {
    let fail = |step: ReconcileStep, source: ReconcileCause| {
        let err = ReconcileError {
            role_id: role_id.clone(),
            step,
            source,
        };
        let retryable = err.is_retryable();
        if err.is_unsafe() {
            tracing::error!(
                "{err} (retryable: {retryable}); role {role_id} now has NO staff associations, re-run the sync manually"
            );
        } else {
            tracing::error!("{err} (retryable: {retryable}); role {role_id} left unchanged");
        }
        err
    };

    if mappings.is_empty() {
        return Err(fail(ReconcileStep::Validate, ReconcileCause::EmptyMappings));
    }

    let staff = staff_union(mappings);
    registry
        .authorize_staff(&staff)
        .map_err(|e| fail(ReconcileStep::Activate, e.into()))?;
    tracing::info!("role {role_id}: authorized {} staff", staff.len());

    registry
        .delete_role_staffs(role_id)
        .map_err(|e| fail(ReconcileStep::Delete, e.into()))?;
    tracing::info!("role {role_id}: cleared existing associations");

    registry
        .put_role_staffs(role_id, mappings, staff_by)
        .map_err(|e| fail(ReconcileStep::Recreate, e.into()))?;
    tracing::info!("role {role_id}: wrote {} path mappings", mappings.len());

    Ok(ReconcileReport {
        role_id: role_id.clone(),
        mappings: mappings.len(),
        staff: staff.len(),
    })
}
