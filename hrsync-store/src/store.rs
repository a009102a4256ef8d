//! The SQLite store: open, upsert, status seed, lookups.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, ToSql};

use hrsync_core::{
    Corporation, Employee, EmployeeStatus, EmploymentForm, Entity, EntityKind, JobLevel,
    Organization,
};

use crate::error::{io_err, StoreError};
use crate::record::{table_for, FromRow, Record};
use crate::schema::{self, SchemaReport};

/// Whether an upsert created a row or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Exclusive handle on the local database.
pub struct Store {
    pub(crate) conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path` and reconcile its schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    /// A private in-memory database with the full schema.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self { conn };
        let report = store.reconcile_schema()?;
        if !report.is_empty() {
            tracing::debug!(
                "schema reconciled: {} table(s) created, {} column(s) added",
                report.created_tables.len(),
                report.added_columns.len()
            );
        }
        Ok(store)
    }

    /// Create missing tables and append missing columns. Never drops or renames.
    pub fn reconcile_schema(&self) -> Result<SchemaReport, StoreError> {
        schema::reconcile(&self.conn)
    }

    // -----------------------------------------------------------------------
    // Upserts
    // -----------------------------------------------------------------------

    pub fn upsert_organization(&mut self, org: &Organization) -> Result<UpsertOutcome, StoreError> {
        self.upsert_record(org)
    }

    pub fn upsert_corporation(&mut self, corp: &Corporation) -> Result<UpsertOutcome, StoreError> {
        self.upsert_record(corp)
    }

    pub fn upsert_employee(&mut self, emp: &Employee) -> Result<UpsertOutcome, StoreError> {
        self.upsert_record(emp)
    }

    pub fn upsert_job_level(&mut self, level: &JobLevel) -> Result<UpsertOutcome, StoreError> {
        self.upsert_record(level)
    }

    pub fn upsert_employment_form(
        &mut self,
        form: &EmploymentForm,
    ) -> Result<UpsertOutcome, StoreError> {
        self.upsert_record(form)
    }

    /// Dispatch on the entity's kind.
    pub fn upsert_entity(&mut self, entity: &Entity) -> Result<UpsertOutcome, StoreError> {
        match entity {
            Entity::Corporation(c) => self.upsert_corporation(c),
            Entity::JobLevel(j) => self.upsert_job_level(j),
            Entity::EmploymentForm(f) => self.upsert_employment_form(f),
            Entity::Organization(o) => self.upsert_organization(o),
            Entity::Employee(e) => self.upsert_employee(e),
        }
    }

    /// Insert or fully overwrite one row, in its own transaction.
    ///
    /// The transaction rolls back on drop if any statement fails.
    fn upsert_record<R: Record>(&mut self, record: &R) -> Result<UpsertOutcome, StoreError> {
        let key = record.key();
        if key.trim().is_empty() {
            return Err(StoreError::MissingKey { kind: R::KIND });
        }
        let values = record.values();

        let tx = self.conn.transaction()?;
        let exists = tx
            .query_row(
                &format!("SELECT 1 FROM {} WHERE {} = ?1", R::TABLE, R::KEY),
                [key],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        let outcome = if exists {
            let assignments: Vec<String> = values
                .iter()
                .enumerate()
                .map(|(i, (name, _))| format!("{name} = ?{}", i + 1))
                .collect();
            let sql = format!(
                "UPDATE {} SET {} WHERE {} = ?{}",
                R::TABLE,
                assignments.join(", "),
                R::KEY,
                values.len() + 1
            );
            let mut bound: Vec<&dyn ToSql> = values.iter().map(|(_, v)| *v as &dyn ToSql).collect();
            bound.push(&key);
            tx.execute(&sql, bound.as_slice())?;
            UpsertOutcome::Updated
        } else {
            let mut columns = vec![R::KEY];
            columns.extend(values.iter().map(|(name, _)| *name));
            let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                R::TABLE,
                columns.join(", "),
                placeholders.join(", ")
            );
            let mut bound: Vec<&dyn ToSql> = Vec::with_capacity(columns.len());
            bound.push(&key);
            bound.extend(values.iter().map(|(_, v)| *v as &dyn ToSql));
            tx.execute(&sql, bound.as_slice())?;
            UpsertOutcome::Inserted
        };
        tx.commit()?;

        tracing::debug!("{} {key}: {outcome:?}", R::KIND);
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Reference data
    // -----------------------------------------------------------------------

    /// Seed the status enumeration unless the table already has rows.
    ///
    /// Returns the number of rows inserted (0 when already seeded).
    pub fn initialize_employee_status(&mut self) -> Result<usize, StoreError> {
        let existing: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM employee_status", [], |row| row.get(0))?;
        if existing > 0 {
            tracing::debug!("employee_status already seeded ({existing} rows)");
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        for status in EmployeeStatus::all() {
            tx.execute(
                "INSERT INTO employee_status (status_code, status_name) VALUES (?1, ?2)",
                params![status.code(), status.label()],
            )?;
        }
        tx.commit()?;
        tracing::info!("seeded {} employee statuses", EmployeeStatus::all().len());
        Ok(EmployeeStatus::all().len())
    }

    /// `(code, name)` rows of the status table, by code.
    pub fn employee_statuses(&self) -> Result<Vec<(i64, String)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT status_code, status_name FROM employee_status ORDER BY status_code")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Number of stored rows of `kind`.
    pub fn count(&self, kind: EntityKind) -> Result<u64, StoreError> {
        let n: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table_for(kind)),
            [],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(n).unwrap_or_default())
    }

    pub fn organization(&self, org_id: &str) -> Result<Option<Organization>, StoreError> {
        self.find(org_id)
    }

    pub fn corporation(&self, corp_id: &str) -> Result<Option<Corporation>, StoreError> {
        self.find(corp_id)
    }

    pub fn employee(&self, user_id: &str) -> Result<Option<Employee>, StoreError> {
        self.find(user_id)
    }

    pub fn job_level(&self, name: &str) -> Result<Option<JobLevel>, StoreError> {
        self.find(name)
    }

    pub fn employment_form(&self, name: &str) -> Result<Option<EmploymentForm>, StoreError> {
        self.find(name)
    }

    fn find<R: FromRow>(&self, key: &str) -> Result<Option<R>, StoreError> {
        let sql = format!("SELECT {} FROM {} WHERE {} = ?1", R::SELECT, R::TABLE, R::KEY);
        let found = self.conn.query_row(&sql, [key], R::from_row).optional()?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(id: &str, name: &str) -> Organization {
        Organization {
            org_id: id.into(),
            org_name: Some(name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn second_sighting_overwrites() {
        let mut store = Store::open_in_memory().unwrap();
        assert_eq!(
            store.upsert_organization(&org("O1", "Sales")).unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert_organization(&org("O1", "Sales-Renamed")).unwrap(),
            UpsertOutcome::Updated
        );
        assert_eq!(store.count(EntityKind::Organization).unwrap(), 1);
        let stored = store.organization("O1").unwrap().unwrap();
        assert_eq!(stored.org_name.as_deref(), Some("Sales-Renamed"));
    }

    #[test]
    fn update_clears_fields_absent_from_new_sighting() {
        let mut store = Store::open_in_memory().unwrap();
        let mut first = org("O1", "Sales");
        first.tree_path = Some("HQ/Sales".into());
        store.upsert_organization(&first).unwrap();
        store.upsert_organization(&org("O1", "Sales")).unwrap();
        assert_eq!(store.organization("O1").unwrap().unwrap().tree_path, None);
    }

    #[test]
    fn empty_key_is_rejected() {
        let mut store = Store::open_in_memory().unwrap();
        let err = store.upsert_organization(&org("  ", "Nobody")).unwrap_err();
        assert!(matches!(
            err,
            StoreError::MissingKey {
                kind: EntityKind::Organization
            }
        ));
        assert_eq!(store.count(EntityKind::Organization).unwrap(), 0);
    }

    #[test]
    fn job_level_keyed_by_name() {
        let mut store = Store::open_in_memory().unwrap();
        let level = |obj: &str| JobLevel {
            name: "P5".into(),
            object_id: Some(obj.into()),
        };
        store.upsert_job_level(&level("a")).unwrap();
        store.upsert_job_level(&level("b")).unwrap();
        assert_eq!(store.count(EntityKind::JobLevel).unwrap(), 1);
        assert_eq!(
            store.job_level("P5").unwrap().unwrap().object_id.as_deref(),
            Some("b")
        );
    }

    #[test]
    fn status_seed_is_idempotent() {
        let mut store = Store::open_in_memory().unwrap();
        assert_eq!(store.initialize_employee_status().unwrap(), 8);
        assert_eq!(store.initialize_employee_status().unwrap(), 0);
        let statuses = store.employee_statuses().unwrap();
        assert_eq!(statuses.len(), 8);
        assert_eq!(statuses[0], (1, "Pending onboarding".to_string()));
        assert_eq!(statuses[7].0, 12);
    }
}
