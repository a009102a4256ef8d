//! Clients for the HR platform (Beisen) and the expense platform (Hesi).
//!
//! Everything here is blocking. HTTP goes through [`http::Transport`] and time
//! through [`clock::Clock`] so the protocols can be exercised without a network
//! or real sleeps.

pub mod beisen;
pub mod clock;
pub mod error;
pub mod hesi;
pub mod http;
pub mod rate_limit;
pub mod token;

use chrono::NaiveDateTime;

use hrsync_core::{Entity, EntityKind, RoleId, RoleMapping, StaffKeyKind};

pub use beisen::{BeisenClient, TimeWindow};
pub use clock::{Clock, SystemClock};
pub use error::RemoteError;
pub use hesi::HesiClient;
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport};
pub use rate_limit::RateLimiter;
pub use token::{BeisenTokenManager, HesiTokenManager, TokenProvider};

/// Where changed entities come from.
pub trait EntitySource {
    /// Every `kind` record changed in `[start, end)`.
    fn fetch(
        &self,
        kind: EntityKind,
        start: NaiveDateTime,
        end: NaiveDateTime,
        incremental: bool,
    ) -> Result<Vec<Entity>, RemoteError>;
}

/// The remote registry of which staff hold which role on which department.
pub trait RoleRegistry {
    /// Activate licences for `staffs` so they can be attached to roles.
    fn authorize_staff(&self, staffs: &[String]) -> Result<(), RemoteError>;

    /// Remove every staff association of `role_id`.
    fn delete_role_staffs(&self, role_id: &RoleId) -> Result<(), RemoteError>;

    /// Write the full association content of `role_id`.
    fn put_role_staffs(
        &self,
        role_id: &RoleId,
        mappings: &[RoleMapping],
        staff_by: StaffKeyKind,
    ) -> Result<(), RemoteError>;
}
