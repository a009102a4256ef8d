//! Fetch every entity kind for a window and persist it.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use hrsync_core::{EntityKind, UpsertPolicy};
use hrsync_remote::EntitySource;
use hrsync_store::{Store, UpsertOutcome};

use crate::error::SyncError;

/// The `[start, end)` span a run fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Fetch the span as one window instead of splitting it.
    pub incremental: bool,
}

impl SyncWindow {
    /// `[today 00:00 - lookback_days, today 00:00)`.
    ///
    /// Zero days would give an empty window and is rejected.
    pub fn lookback(today: NaiveDate, lookback_days: u32) -> Result<Self, SyncError> {
        let out_of_range = || SyncError::LookbackOutOfRange {
            today,
            days: lookback_days,
        };
        if lookback_days == 0 {
            return Err(out_of_range());
        }
        let end = today.and_time(chrono::NaiveTime::MIN);
        let start = Duration::try_days(i64::from(lookback_days))
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(out_of_range)?;
        Ok(Self {
            start,
            end,
            incremental: false,
        })
    }

    /// Everything since the Unix epoch up to today's midnight, split into
    /// windows.
    pub fn full(today: NaiveDate) -> Self {
        Self {
            start: NaiveDateTime::default(),
            end: today.and_time(chrono::NaiveTime::MIN),
            incremental: false,
        }
    }
}

/// Per-kind outcome of one fetch-and-store pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSummary {
    pub kind: EntityKind,
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
}

impl FetchSummary {
    fn new(kind: EntityKind, fetched: usize) -> Self {
        Self {
            kind,
            fetched,
            inserted: 0,
            updated: 0,
            failed: 0,
        }
    }
}

/// Fetch all kinds in dependency order and upsert them one entity at a time.
///
/// Under [`UpsertPolicy::Abort`] the first failing entity ends the pass with
/// [`SyncError::Upsert`]; rows already written stay written. Under
/// [`UpsertPolicy::Skip`] failures are logged and counted.
pub fn fetch_and_store(
    source: &dyn EntitySource,
    store: &mut Store,
    window: &SyncWindow,
    policy: UpsertPolicy,
) -> Result<Vec<FetchSummary>, SyncError> {
    let mut summaries = Vec::with_capacity(EntityKind::all().len());

    for &kind in EntityKind::all() {
        let entities = source.fetch(kind, window.start, window.end, window.incremental)?;
        let mut summary = FetchSummary::new(kind, entities.len());

        for entity in &entities {
            match store.upsert_entity(entity) {
                Ok(UpsertOutcome::Inserted) => summary.inserted += 1,
                Ok(UpsertOutcome::Updated) => summary.updated += 1,
                Err(source) => match policy {
                    UpsertPolicy::Abort => {
                        tracing::error!("failed to store {kind} {}: {source}", entity.key());
                        return Err(SyncError::Upsert {
                            kind,
                            key: entity.key().to_string(),
                            source,
                        });
                    }
                    UpsertPolicy::Skip => {
                        tracing::warn!("skipping {kind} {}: {source}", entity.key());
                        summary.failed += 1;
                    }
                },
            }
        }

        tracing::info!(
            "{kind}: fetched {}, inserted {}, updated {}, failed {}",
            summary.fetched,
            summary.inserted,
            summary.updated,
            summary.failed
        );
        summaries.push(summary);
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use hrsync_core::{Entity, JobLevel, Organization};
    use hrsync_remote::RemoteError;

    use super::*;

    /// Serves canned entities per kind and records the kinds asked for.
    #[derive(Default)]
    struct Canned {
        entities: Vec<Entity>,
        asked: RefCell<Vec<EntityKind>>,
    }

    impl EntitySource for Canned {
        fn fetch(
            &self,
            kind: EntityKind,
            _start: NaiveDateTime,
            _end: NaiveDateTime,
            _incremental: bool,
        ) -> Result<Vec<Entity>, RemoteError> {
            self.asked.borrow_mut().push(kind);
            Ok(self
                .entities
                .iter()
                .filter(|e| e.kind() == kind)
                .cloned()
                .collect())
        }
    }

    fn window() -> SyncWindow {
        SyncWindow::lookback(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(), 7).unwrap()
    }

    fn org(id: &str) -> Entity {
        Entity::Organization(Organization {
            org_id: id.into(),
            org_name: Some(format!("Org {id}")),
            ..Default::default()
        })
    }

    #[test]
    fn lookback_window_ends_at_midnight() {
        let w = window();
        assert_eq!(w.end.to_string(), "2024-06-10 00:00:00");
        assert_eq!(w.start.to_string(), "2024-06-03 00:00:00");
        assert!(!w.incremental);
    }

    #[test]
    fn zero_day_lookback_is_rejected() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let err = SyncWindow::lookback(today, 0).unwrap_err();
        assert!(matches!(err, SyncError::LookbackOutOfRange { days: 0, .. }));
    }

    #[test]
    fn oversized_lookback_is_an_error_not_a_panic() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let err = SyncWindow::lookback(today, u32::MAX).unwrap_err();
        assert!(matches!(
            err,
            SyncError::LookbackOutOfRange { days: u32::MAX, .. }
        ));
    }

    #[test]
    fn kinds_fetched_in_dependency_order() {
        let source = Canned {
            entities: vec![
                org("O1"),
                org("O2"),
                Entity::JobLevel(JobLevel {
                    name: "P5".into(),
                    object_id: None,
                }),
            ],
            ..Default::default()
        };
        let mut store = Store::open_in_memory().unwrap();

        let summaries =
            fetch_and_store(&source, &mut store, &window(), UpsertPolicy::Abort).unwrap();

        assert_eq!(source.asked.borrow().as_slice(), EntityKind::all());
        let orgs = summaries
            .iter()
            .find(|s| s.kind == EntityKind::Organization)
            .unwrap();
        assert_eq!((orgs.fetched, orgs.inserted, orgs.updated), (2, 2, 0));
        assert_eq!(store.count(EntityKind::JobLevel).unwrap(), 1);
    }

    #[test]
    fn second_pass_updates_instead_of_inserting() {
        let source = Canned {
            entities: vec![org("O1")],
            ..Default::default()
        };
        let mut store = Store::open_in_memory().unwrap();
        fetch_and_store(&source, &mut store, &window(), UpsertPolicy::Abort).unwrap();
        let summaries =
            fetch_and_store(&source, &mut store, &window(), UpsertPolicy::Abort).unwrap();

        let orgs = summaries
            .iter()
            .find(|s| s.kind == EntityKind::Organization)
            .unwrap();
        assert_eq!((orgs.inserted, orgs.updated), (0, 1));
        assert_eq!(store.count(EntityKind::Organization).unwrap(), 1);
    }

    #[test]
    fn abort_policy_stops_at_first_bad_entity() {
        let source = Canned {
            entities: vec![org("O1"), org(""), org("O3")],
            ..Default::default()
        };
        let mut store = Store::open_in_memory().unwrap();

        let err =
            fetch_and_store(&source, &mut store, &window(), UpsertPolicy::Abort).unwrap_err();

        assert!(matches!(
            err,
            SyncError::Upsert {
                kind: EntityKind::Organization,
                ..
            }
        ));
        assert_eq!(store.count(EntityKind::Organization).unwrap(), 1);
        assert!(!source.asked.borrow().contains(&EntityKind::Employee));
    }

    #[test]
    fn skip_policy_counts_failures_and_continues() {
        let source = Canned {
            entities: vec![org("O1"), org(""), org("O3")],
            ..Default::default()
        };
        let mut store = Store::open_in_memory().unwrap();

        let summaries =
            fetch_and_store(&source, &mut store, &window(), UpsertPolicy::Skip).unwrap();

        let orgs = summaries
            .iter()
            .find(|s| s.kind == EntityKind::Organization)
            .unwrap();
        assert_eq!((orgs.inserted, orgs.failed), (2, 1));
        assert_eq!(summaries.len(), EntityKind::all().len());
    }
}
