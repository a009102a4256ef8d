//! Column bindings for each entity kind.

use rusqlite::Row;

use hrsync_core::{Corporation, Employee, EmploymentForm, EntityKind, JobLevel, Organization};

/// An entity that maps onto one row keyed by a natural key.
pub(crate) trait Record {
    const KIND: EntityKind;
    const TABLE: &'static str;
    const KEY: &'static str;

    fn key(&self) -> &str;

    /// Non-key columns and their values, all overwritten on update.
    fn values(&self) -> Vec<(&'static str, &Option<String>)>;
}

/// A record that can be read back from its table.
pub(crate) trait FromRow: Record + Sized {
    /// Column list matching [`FromRow::from_row`]'s indices.
    const SELECT: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl Record for Organization {
    const KIND: EntityKind = EntityKind::Organization;
    const TABLE: &'static str = "organizations";
    const KEY: &'static str = "org_id";

    fn key(&self) -> &str {
        &self.org_id
    }

    fn values(&self) -> Vec<(&'static str, &Option<String>)> {
        vec![
            ("org_name", &self.org_name),
            ("parent_company_id", &self.parent_company_id),
            ("parent_company_text", &self.parent_company_text),
            ("person_in_charge", &self.person_in_charge),
            ("person_in_charge_text", &self.person_in_charge_text),
            ("tree_path", &self.tree_path),
            ("tree_path_text", &self.tree_path_text),
        ]
    }
}

impl FromRow for Organization {
    const SELECT: &'static str = "org_id, org_name, parent_company_id, parent_company_text, \
         person_in_charge, person_in_charge_text, tree_path, tree_path_text";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            org_id: row.get(0)?,
            org_name: row.get(1)?,
            parent_company_id: row.get(2)?,
            parent_company_text: row.get(3)?,
            person_in_charge: row.get(4)?,
            person_in_charge_text: row.get(5)?,
            tree_path: row.get(6)?,
            tree_path_text: row.get(7)?,
        })
    }
}

impl Record for Corporation {
    const KIND: EntityKind = EntityKind::Corporation;
    const TABLE: &'static str = "corporations";
    const KEY: &'static str = "corp_id";

    fn key(&self) -> &str {
        &self.corp_id
    }

    fn values(&self) -> Vec<(&'static str, &Option<String>)> {
        vec![
            ("corp_name", &self.corp_name),
            ("registration_code", &self.registration_code),
            ("bank_name", &self.bank_name),
            ("bank_account", &self.bank_account),
            ("phone", &self.phone),
            ("registered_address", &self.registered_address),
        ]
    }
}

impl FromRow for Corporation {
    const SELECT: &'static str = "corp_id, corp_name, registration_code, bank_name, \
         bank_account, phone, registered_address";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            corp_id: row.get(0)?,
            corp_name: row.get(1)?,
            registration_code: row.get(2)?,
            bank_name: row.get(3)?,
            bank_account: row.get(4)?,
            phone: row.get(5)?,
            registered_address: row.get(6)?,
        })
    }
}

impl Record for Employee {
    const KIND: EntityKind = EntityKind::Employee;
    const TABLE: &'static str = "employees";
    const KEY: &'static str = "user_id";

    fn key(&self) -> &str {
        &self.user_id
    }

    fn values(&self) -> Vec<(&'static str, &Option<String>)> {
        vec![
            ("job_number", &self.job_number),
            ("name", &self.name),
            ("email", &self.email),
            ("id_number", &self.id_number),
            ("mobile_phone", &self.mobile_phone),
            ("department_id", &self.department_id),
            ("department_text", &self.department_text),
            ("job_level_id", &self.job_level_id),
            ("job_level_text", &self.job_level_text),
            ("employee_status", &self.employee_status),
            ("employment_form", &self.employment_form),
            ("service_type", &self.service_type),
        ]
    }
}

impl FromRow for Employee {
    const SELECT: &'static str = "user_id, job_number, name, email, id_number, mobile_phone, \
         department_id, department_text, job_level_id, job_level_text, employee_status, \
         employment_form, service_type";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            job_number: row.get(1)?,
            name: row.get(2)?,
            email: row.get(3)?,
            id_number: row.get(4)?,
            mobile_phone: row.get(5)?,
            department_id: row.get(6)?,
            department_text: row.get(7)?,
            job_level_id: row.get(8)?,
            job_level_text: row.get(9)?,
            employee_status: row.get(10)?,
            employment_form: row.get(11)?,
            service_type: row.get(12)?,
        })
    }
}

impl Record for JobLevel {
    const KIND: EntityKind = EntityKind::JobLevel;
    const TABLE: &'static str = "job_level";
    const KEY: &'static str = "name";

    fn key(&self) -> &str {
        &self.name
    }

    fn values(&self) -> Vec<(&'static str, &Option<String>)> {
        vec![("object_id", &self.object_id)]
    }
}

impl FromRow for JobLevel {
    const SELECT: &'static str = "name, object_id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            object_id: row.get(1)?,
        })
    }
}

impl Record for EmploymentForm {
    const KIND: EntityKind = EntityKind::EmploymentForm;
    const TABLE: &'static str = "employment_form";
    const KEY: &'static str = "name";

    fn key(&self) -> &str {
        &self.name
    }

    fn values(&self) -> Vec<(&'static str, &Option<String>)> {
        vec![("object_id", &self.object_id)]
    }
}

impl FromRow for EmploymentForm {
    const SELECT: &'static str = "name, object_id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            object_id: row.get(1)?,
        })
    }
}

/// Table holding `kind`.
pub(crate) fn table_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Corporation => Corporation::TABLE,
        EntityKind::JobLevel => JobLevel::TABLE,
        EntityKind::EmploymentForm => EmploymentForm::TABLE,
        EntityKind::Organization => Organization::TABLE,
        EntityKind::Employee => Employee::TABLE,
    }
}
