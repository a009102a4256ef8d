//! Expected tables and forward-only reconciliation.
//!
//! Tables are created when absent and missing columns are appended with
//! `ALTER TABLE ... ADD COLUMN`. Nothing is ever dropped or renamed, so
//! columns added by hand (or by older builds) survive.

use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension};

use crate::error::StoreError;

/// One expected column. `constraint` only applies at table creation;
/// columns appended later carry their type alone.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub constraint: &'static str,
}

const fn col(name: &'static str, sql_type: &'static str) -> Column {
    Column {
        name,
        sql_type,
        constraint: "",
    }
}

const fn key(name: &'static str, sql_type: &'static str, constraint: &'static str) -> Column {
    Column {
        name,
        sql_type,
        constraint,
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    fn create_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                if c.constraint.is_empty() {
                    format!("{} {}", c.name, c.sql_type)
                } else {
                    format!("{} {} {}", c.name, c.sql_type, c.constraint)
                }
            })
            .collect();
        format!("CREATE TABLE {} ({})", self.name, columns.join(", "))
    }
}

pub(crate) const ORGANIZATIONS: Table = Table {
    name: "organizations",
    columns: &[
        key("org_id", "TEXT", "PRIMARY KEY"),
        col("org_name", "TEXT"),
        col("parent_company_id", "TEXT"),
        col("parent_company_text", "TEXT"),
        col("person_in_charge", "TEXT"),
        col("person_in_charge_text", "TEXT"),
        col("tree_path", "TEXT"),
        col("tree_path_text", "TEXT"),
    ],
};

pub(crate) const CORPORATIONS: Table = Table {
    name: "corporations",
    columns: &[
        key("corp_id", "TEXT", "PRIMARY KEY"),
        col("corp_name", "TEXT"),
        col("registration_code", "TEXT"),
        col("bank_name", "TEXT"),
        col("bank_account", "TEXT"),
        col("phone", "TEXT"),
        col("registered_address", "TEXT"),
    ],
};

pub(crate) const EMPLOYEES: Table = Table {
    name: "employees",
    columns: &[
        key("user_id", "TEXT", "PRIMARY KEY"),
        col("job_number", "TEXT"),
        col("name", "TEXT"),
        col("email", "TEXT"),
        col("id_number", "TEXT"),
        col("mobile_phone", "TEXT"),
        col("department_id", "TEXT"),
        col("department_text", "TEXT"),
        col("job_level_id", "TEXT"),
        col("job_level_text", "TEXT"),
        col("employee_status", "TEXT"),
        col("employment_form", "TEXT"),
        col("service_type", "TEXT"),
    ],
};

pub(crate) const EMPLOYEE_STATUS: Table = Table {
    name: "employee_status",
    columns: &[
        key("id", "INTEGER", "PRIMARY KEY AUTOINCREMENT"),
        key("status_code", "INTEGER", "NOT NULL UNIQUE"),
        key("status_name", "TEXT", "NOT NULL"),
    ],
};

pub(crate) const JOB_LEVEL: Table = Table {
    name: "job_level",
    columns: &[
        key("id", "INTEGER", "PRIMARY KEY AUTOINCREMENT"),
        key("name", "TEXT", "NOT NULL UNIQUE"),
        col("object_id", "TEXT"),
    ],
};

pub(crate) const EMPLOYMENT_FORM: Table = Table {
    name: "employment_form",
    columns: &[
        key("id", "INTEGER", "PRIMARY KEY AUTOINCREMENT"),
        key("name", "TEXT", "NOT NULL UNIQUE"),
        col("object_id", "TEXT"),
    ],
};

pub(crate) const TABLES: &[Table] = &[
    ORGANIZATIONS,
    CORPORATIONS,
    EMPLOYEES,
    EMPLOYEE_STATUS,
    JOB_LEVEL,
    EMPLOYMENT_FORM,
];

/// What a reconciliation pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub created_tables: Vec<String>,
    /// `table.column` for every column appended.
    pub added_columns: Vec<String>,
}

impl SchemaReport {
    pub fn is_empty(&self) -> bool {
        self.created_tables.is_empty() && self.added_columns.is_empty()
    }
}

/// Bring the database up to the expected tables and columns.
pub(crate) fn reconcile(conn: &Connection) -> Result<SchemaReport, StoreError> {
    let mut report = SchemaReport::default();
    for table in TABLES {
        if !table_exists(conn, table.name)? {
            conn.execute_batch(&table.create_sql())?;
            tracing::info!("created table {}", table.name);
            report.created_tables.push(table.name.to_string());
            continue;
        }

        let existing = existing_columns(conn, table.name)?;
        for column in table.columns {
            if existing.contains(column.name) {
                continue;
            }
            let sql = format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                table.name, column.name, column.sql_type
            );
            match conn.execute_batch(&sql) {
                Ok(()) => {
                    tracing::info!("added column {}.{}", table.name, column.name);
                    report
                        .added_columns
                        .push(format!("{}.{}", table.name, column.name));
                }
                Err(e) => {
                    tracing::warn!(
                        "failed to add column {}.{}: {e}",
                        table.name,
                        column.name
                    );
                }
            }
        }
    }
    Ok(report)
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool, StoreError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn existing_columns(conn: &Connection, table: &str) -> Result<HashSet<String>, StoreError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(names)
}
