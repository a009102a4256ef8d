//! Domain types for the HR → role-registry sync.
//!
//! Every durable entity is keyed by the natural id the HR platform assigns it.
//! All non-key fields are optional: the platform omits whatever it does not
//! know, and a later sighting overwrites the whole row.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a role definition in the expense platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub String);

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RoleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RoleId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The entity kinds fetched from the HR platform, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Corporation,
    JobLevel,
    EmploymentForm,
    Organization,
    Employee,
}

impl EntityKind {
    /// All kinds in the order a sync run fetches and stores them.
    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Corporation,
            EntityKind::JobLevel,
            EntityKind::EmploymentForm,
            EntityKind::Organization,
            EntityKind::Employee,
        ]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Corporation => write!(f, "corporation"),
            EntityKind::JobLevel => write!(f, "job_level"),
            EntityKind::EmploymentForm => write!(f, "employment_form"),
            EntityKind::Organization => write!(f, "organization"),
            EntityKind::Employee => write!(f, "employee"),
        }
    }
}

/// Employment state codes used by the HR platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmployeeStatus {
    PendingOnboarding,
    Probation,
    Regular,
    TransferredOut,
    PendingTransferIn,
    Retired,
    Departed,
    Informal,
}

impl EmployeeStatus {
    pub fn all() -> &'static [EmployeeStatus] {
        &[
            EmployeeStatus::PendingOnboarding,
            EmployeeStatus::Probation,
            EmployeeStatus::Regular,
            EmployeeStatus::TransferredOut,
            EmployeeStatus::PendingTransferIn,
            EmployeeStatus::Retired,
            EmployeeStatus::Departed,
            EmployeeStatus::Informal,
        ]
    }

    pub fn code(self) -> i64 {
        match self {
            EmployeeStatus::PendingOnboarding => 1,
            EmployeeStatus::Probation => 2,
            EmployeeStatus::Regular => 3,
            EmployeeStatus::TransferredOut => 4,
            EmployeeStatus::PendingTransferIn => 5,
            EmployeeStatus::Retired => 6,
            EmployeeStatus::Departed => 8,
            EmployeeStatus::Informal => 12,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.code() == code)
    }

    /// Parses the textual code stored on an employee row (`"3"`, `" 3 "`).
    pub fn parse(code: &str) -> Option<Self> {
        code.trim().parse::<i64>().ok().and_then(Self::from_code)
    }

    pub fn label(self) -> &'static str {
        match self {
            EmployeeStatus::PendingOnboarding => "Pending onboarding",
            EmployeeStatus::Probation => "Probation",
            EmployeeStatus::Regular => "Regular",
            EmployeeStatus::TransferredOut => "Transferred out",
            EmployeeStatus::PendingTransferIn => "Pending transfer in",
            EmployeeStatus::Retired => "Retired",
            EmployeeStatus::Departed => "Departed",
            EmployeeStatus::Informal => "Informal",
        }
    }

    /// Probation and regular employees are the ones currently working.
    pub fn is_active(self) -> bool {
        matches!(self, EmployeeStatus::Probation | EmployeeStatus::Regular)
    }
}

/// Which form of an organization's tree path a role mapping carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PathType {
    /// Human-readable department names (`tree_path_text`).
    #[default]
    Name,
    /// Department codes (`tree_path`).
    Code,
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathType::Name => write!(f, "name"),
            PathType::Code => write!(f, "code"),
        }
    }
}

/// How staff are identified in role-registry calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StaffKeyKind {
    /// Job number.
    #[default]
    Code,
    Id,
    Email,
    Cellphone,
}

impl StaffKeyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StaffKeyKind::Code => "code",
            StaffKeyKind::Id => "id",
            StaffKeyKind::Email => "email",
            StaffKeyKind::Cellphone => "cellphone",
        }
    }
}

impl fmt::Display for StaffKeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// An organizational unit (department, branch, company node).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Organization {
    pub org_id: String,
    pub org_name: Option<String>,
    pub parent_company_id: Option<String>,
    pub parent_company_text: Option<String>,
    /// `user_id` of the employee in charge.
    pub person_in_charge: Option<String>,
    pub person_in_charge_text: Option<String>,
    /// Slash-delimited ancestry, code form.
    pub tree_path: Option<String>,
    /// Slash-delimited ancestry, display form.
    pub tree_path_text: Option<String>,
}

/// A legal entity the organizations belong to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Corporation {
    pub corp_id: String,
    pub corp_name: Option<String>,
    pub registration_code: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
    pub phone: Option<String>,
    pub registered_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Employee {
    pub user_id: String,
    pub job_number: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub id_number: Option<String>,
    pub mobile_phone: Option<String>,
    pub department_id: Option<String>,
    pub department_text: Option<String>,
    pub job_level_id: Option<String>,
    pub job_level_text: Option<String>,
    pub employee_status: Option<String>,
    pub employment_form: Option<String>,
    pub service_type: Option<String>,
}

/// Job level lookup row, keyed by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobLevel {
    pub name: String,
    pub object_id: Option<String>,
}

/// Employment form lookup row, keyed by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmploymentForm {
    pub name: String,
    pub object_id: Option<String>,
}

/// Any entity produced by a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Corporation(Corporation),
    JobLevel(JobLevel),
    EmploymentForm(EmploymentForm),
    Organization(Organization),
    Employee(Employee),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Corporation(_) => EntityKind::Corporation,
            Entity::JobLevel(_) => EntityKind::JobLevel,
            Entity::EmploymentForm(_) => EntityKind::EmploymentForm,
            Entity::Organization(_) => EntityKind::Organization,
            Entity::Employee(_) => EntityKind::Employee,
        }
    }

    /// The natural key the store upserts on.
    pub fn key(&self) -> &str {
        match self {
            Entity::Corporation(c) => &c.corp_id,
            Entity::JobLevel(j) => &j.name,
            Entity::EmploymentForm(e) => &e.name,
            Entity::Organization(o) => &o.org_id,
            Entity::Employee(e) => &e.user_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Role mappings
// ---------------------------------------------------------------------------

/// One department path and the staff attached to it for a role.
///
/// Serialized in the role registry's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMapping {
    pub path_type: PathType,
    pub path: Vec<String>,
    pub staffs: Vec<String>,
}

/// Splits a slash-delimited tree path into its segments, dropping empty ones.
pub fn split_tree_path(path: &str) -> Vec<String> {
    path.split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
