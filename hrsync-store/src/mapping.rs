//! Role mappings derived from stored organizations and employees.
//!
//! Both reads walk rows in insertion order and fold them into one
//! [`RoleMapping`] per distinct path. Staff keep discovery order and are not
//! deduplicated within a group.

use std::collections::HashMap;

use hrsync_core::{split_tree_path, EmployeeStatus, PathType, RoleMapping};

use crate::error::StoreError;
use crate::store::Store;

/// Folds `(path, staff)` pairs into path-grouped mappings.
struct MappingGroups {
    path_type: PathType,
    groups: Vec<RoleMapping>,
    index: HashMap<Vec<String>, usize>,
}

impl MappingGroups {
    fn new(path_type: PathType) -> Self {
        Self {
            path_type,
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn push(&mut self, path: Vec<String>, staff: String) {
        if let Some(&i) = self.index.get(&path) {
            self.groups[i].staffs.push(staff);
            return;
        }
        self.index.insert(path.clone(), self.groups.len());
        self.groups.push(RoleMapping {
            path_type: self.path_type,
            path,
            staffs: vec![staff],
        });
    }

    fn finish(self) -> Vec<RoleMapping> {
        self.groups
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Store {
    /// Department leaders: the person in charge of each organization, grouped
    /// by the organization's tree path in the requested form.
    ///
    /// Organizations without a person in charge, without a path of that form,
    /// or whose person has no job number are skipped.
    pub fn organization_staff_mapping(
        &self,
        path_type: PathType,
    ) -> Result<Vec<RoleMapping>, StoreError> {
        let path_column = match path_type {
            PathType::Name => "tree_path_text",
            PathType::Code => "tree_path",
        };
        let sql = format!(
            "SELECT o.org_id, o.person_in_charge, o.{path_column}, e.job_number \
             FROM organizations o \
             LEFT JOIN employees e ON e.user_id = o.person_in_charge \
             ORDER BY o.rowid"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut groups = MappingGroups::new(path_type);
        for row in rows {
            let (org_id, person, path, job_number) = row?;
            if non_empty(person).is_none() {
                continue;
            }
            let Some(path) = non_empty(path).map(|p| split_tree_path(&p)) else {
                continue;
            };
            if path.is_empty() {
                continue;
            }
            let Some(job_number) = non_empty(job_number) else {
                tracing::warn!("organization {org_id}: person in charge has no job number, skipped");
                continue;
            };
            groups.push(path, job_number);
        }
        Ok(groups.finish())
    }

    /// Managers: active employees whose `job_level_text` is one of
    /// `job_levels`, grouped by their department's display path.
    pub fn manager_org_path(&self, job_levels: &[String]) -> Result<Vec<RoleMapping>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT e.user_id, e.job_number, e.employee_status, e.job_level_text, o.tree_path_text \
             FROM employees e \
             LEFT JOIN organizations o ON o.org_id = e.department_id \
             ORDER BY e.rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut groups = MappingGroups::new(PathType::Name);
        for row in rows {
            let (user_id, job_number, status, level, path) = row?;
            let active = status
                .as_deref()
                .and_then(EmployeeStatus::parse)
                .is_some_and(EmployeeStatus::is_active);
            if !active {
                continue;
            }
            let is_manager = level
                .as_deref()
                .is_some_and(|l| job_levels.iter().any(|tier| tier == l));
            if !is_manager {
                continue;
            }
            let Some(path) = non_empty(path).map(|p| split_tree_path(&p)) else {
                tracing::debug!("manager {user_id}: department has no path, skipped");
                continue;
            };
            if path.is_empty() {
                continue;
            }
            let Some(job_number) = non_empty(job_number) else {
                tracing::warn!("manager {user_id} has no job number, skipped");
                continue;
            };
            groups.push(path, job_number);
        }
        Ok(groups.finish())
    }
}
