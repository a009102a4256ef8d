//! Error types for hrsync-sync.

use chrono::NaiveDate;
use thiserror::Error;

use hrsync_core::{ConfigError, EntityKind};
use hrsync_remote::RemoteError;
use hrsync_store::StoreError;

/// All errors that can end a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from either backend.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// An error from the local store outside a single upsert.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A lookback of zero days, or one reaching before the calendar starts.
    #[error("a lookback of {days} days before {today} is out of range")]
    LookbackOutOfRange { today: NaiveDate, days: u32 },

    /// One entity failed to persist under the abort policy.
    #[error("failed to store {kind} {key}: {source}")]
    Upsert {
        kind: EntityKind,
        key: String,
        #[source]
        source: StoreError,
    },
}
