//! One end-to-end sync run: seed, fetch and store, then push both roles.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use hrsync_core::config::{Config, RolesConfig};
use hrsync_core::{paths, RoleId, RoleMapping, UpsertPolicy};
use hrsync_remote::{
    BeisenClient, BeisenTokenManager, Clock, EntitySource, HesiClient, HesiTokenManager,
    RateLimiter, RoleRegistry, SystemClock, Transport, UreqTransport,
};
use hrsync_store::Store;

use crate::error::SyncError;
use crate::pipeline::{fetch_and_store, FetchSummary, SyncWindow};
use crate::reconcile::{replace_role_staff, ReconcileError, ReconcileReport};

// ---------------------------------------------------------------------------
// Context and report
// ---------------------------------------------------------------------------

/// Everything a run touches.
pub struct JobContext<'a> {
    pub source: &'a dyn EntitySource,
    pub registry: &'a dyn RoleRegistry,
    pub store: &'a mut Store,
    pub roles: &'a RolesConfig,
    pub policy: UpsertPolicy,
    /// Stop after storing; push no roles.
    pub skip_roles: bool,
}

/// Which derived role a push was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    DepartmentLeaders,
    Managers,
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleKind::DepartmentLeaders => write!(f, "department leaders"),
            RoleKind::Managers => write!(f, "managers"),
        }
    }
}

#[derive(Debug)]
pub struct RoleOutcome {
    pub kind: RoleKind,
    pub role_id: RoleId,
    pub result: Result<ReconcileReport, ReconcileError>,
}

#[derive(Debug, Default)]
pub struct JobReport {
    pub seeded_statuses: usize,
    pub fetched: Vec<FetchSummary>,
    pub roles: Vec<RoleOutcome>,
}

impl JobReport {
    /// True when every attempted role push succeeded.
    pub fn is_ok(&self) -> bool {
        self.roles.iter().all(|r| r.result.is_ok())
    }

    /// Failed roles whose cause may clear up on a later run.
    pub fn retryable_roles(&self) -> Vec<&RoleId> {
        self.roles
            .iter()
            .filter(|r| matches!(&r.result, Err(e) if e.is_retryable()))
            .map(|r| &r.role_id)
            .collect()
    }

    /// Roles left without associations by a failed recreate.
    pub fn unsafe_roles(&self) -> Vec<&RoleId> {
        self.roles
            .iter()
            .filter(|r| matches!(&r.result, Err(e) if e.is_unsafe()))
            .map(|r| &r.role_id)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// run_job
// ---------------------------------------------------------------------------

/// Run one sync for `window`.
///
/// Fetch or store failures end the run with an error. A failed role push is
/// recorded in the report and does not stop the other role.
pub fn run_job(ctx: &mut JobContext<'_>, window: SyncWindow) -> Result<JobReport, SyncError> {
    tracing::info!("sync run for [{}, {})", window.start, window.end);
    let mut report = JobReport {
        seeded_statuses: ctx.store.initialize_employee_status()?,
        ..Default::default()
    };

    report.fetched = fetch_and_store(ctx.source, ctx.store, &window, ctx.policy)?;

    if ctx.skip_roles {
        tracing::info!("role push skipped");
        return Ok(report);
    }

    if let Some(leaders) = &ctx.roles.department_leaders {
        let mappings = ctx.store.organization_staff_mapping(leaders.path_type)?;
        report.roles.push(push_role(
            ctx,
            RoleKind::DepartmentLeaders,
            &leaders.role_id,
            &mappings,
        ));
    }

    if let Some(managers) = &ctx.roles.managers {
        let mappings = ctx.store.manager_org_path(&managers.job_levels)?;
        report
            .roles
            .push(push_role(ctx, RoleKind::Managers, &managers.role_id, &mappings));
    }

    if report.is_ok() {
        tracing::info!("sync run complete");
    } else {
        tracing::error!("sync run finished with role push failures");
    }
    Ok(report)
}

fn push_role(
    ctx: &JobContext<'_>,
    kind: RoleKind,
    role_id: &RoleId,
    mappings: &[RoleMapping],
) -> RoleOutcome {
    tracing::info!("{kind}: {} path mappings derived", mappings.len());
    let result = replace_role_staff(ctx.registry, role_id, mappings, ctx.roles.staff_by);
    RoleOutcome {
        kind,
        role_id: role_id.clone(),
        result,
    }
}

// ---------------------------------------------------------------------------
// Live wiring
// ---------------------------------------------------------------------------

/// Both backend clients built from `config`, sharing one HTTP agent.
pub struct Clients {
    pub beisen: BeisenClient,
    pub hesi: HesiClient,
}

impl Clients {
    /// No network traffic happens until a client is used.
    pub fn connect(home: &Path, config: &Config) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(UreqTransport::new(Duration::from_secs(
            config.http.timeout_secs,
        )));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let beisen_tokens = Arc::new(BeisenTokenManager::new(
            config.beisen.clone(),
            paths::beisen_token_path(home),
            transport.clone(),
            clock.clone(),
        ));
        let hesi_tokens = Arc::new(HesiTokenManager::new(
            config.hesi.clone(),
            paths::hesi_token_path(home),
            transport.clone(),
            clock.clone(),
        ));

        let limiter = RateLimiter::new(
            config.sync.requests_per_second,
            config.sync.requests_per_minute,
            clock,
        );
        Self {
            beisen: BeisenClient::new(
                transport.clone(),
                beisen_tokens,
                limiter,
                i64::from(config.sync.max_window_days),
                config.sync.page_capacity,
            ),
            hesi: HesiClient::new(transport, hesi_tokens),
        }
    }
}

/// Overrides a caller may apply to a configured run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub skip_roles: bool,
    /// Replaces `sync.on_upsert_error` when set.
    pub policy: Option<UpsertPolicy>,
}

/// Open the store under `home` and run one job against the live backends.
///
/// Shared by `hrsync run` and the scheduler.
pub fn run_configured(
    home: &Path,
    config: &Config,
    window: SyncWindow,
    options: RunOptions,
) -> Result<JobReport, SyncError> {
    let clients = Clients::connect(home, config);
    let mut store = Store::open(&paths::database_path(home))?;
    let mut ctx = JobContext {
        source: &clients.beisen,
        registry: &clients.hesi,
        store: &mut store,
        roles: &config.roles,
        policy: options.policy.unwrap_or(config.sync.on_upsert_error),
        skip_roles: options.skip_roles,
    };
    run_job(&mut ctx, window)
}
