//! Typed decoding of time-window records.
//!
//! Every nested group is optional and defaults to empty, and scalar fields
//! accept strings, numbers or booleans. A record that is not an object, or
//! that lacks its natural key, is skipped with a warning.

use serde::de::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use hrsync_core::{Corporation, Employee, EmploymentForm, Entity, EntityKind, JobLevel, Organization};

use super::payload::{
    CORP_ADDRESS_FIELD, CORP_BANK_ACCOUNT_FIELD, CORP_BANK_NAME_FIELD, CORP_PHONE_FIELD,
    CORP_REGISTRATION_CODE_FIELD, ORG_PARENT_COMPANY_FIELD,
};

// ---------------------------------------------------------------------------
// Loose scalars and groups
// ---------------------------------------------------------------------------

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn loose<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar(&value))
}

/// A nested property bag; anything other than an object reads as empty.
#[derive(Debug, Default)]
struct Group(Map<String, Value>);

impl<'de> Deserialize<'de> for Group {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(Group(map)),
            _ => Ok(Group::default()),
        }
    }
}

impl Group {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(scalar)
    }
}

// ---------------------------------------------------------------------------
// Wire records
// ---------------------------------------------------------------------------

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct OrganizationRecord {
    #[serde(rename = "oId", deserialize_with = "loose")]
    o_id: Option<String>,
    #[serde(deserialize_with = "loose")]
    name: Option<String>,
    #[serde(rename = "personInCharge", deserialize_with = "loose")]
    person_in_charge: Option<String>,
    #[serde(rename = "pOIdOrgAdminNameTreePath", deserialize_with = "loose")]
    tree_path: Option<String>,
    #[serde(rename = "translateProperties")]
    translate: Group,
    #[serde(rename = "customProperties")]
    custom: Group,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct EmployeeInfo {
    #[serde(rename = "userID", deserialize_with = "loose")]
    user_id: Option<String>,
    #[serde(deserialize_with = "loose")]
    name: Option<String>,
    #[serde(deserialize_with = "loose")]
    email: Option<String>,
    #[serde(rename = "iDNumber", deserialize_with = "loose")]
    id_number: Option<String>,
    #[serde(rename = "mobilePhone", deserialize_with = "loose")]
    mobile_phone: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RecordInfo {
    #[serde(rename = "jobNumber", deserialize_with = "loose")]
    job_number: Option<String>,
    #[serde(rename = "oIdDepartment", deserialize_with = "loose")]
    department_id: Option<String>,
    #[serde(rename = "oIdJobLevel", deserialize_with = "loose")]
    job_level_id: Option<String>,
    #[serde(rename = "employeeStatus", deserialize_with = "loose")]
    employee_status: Option<String>,
    #[serde(rename = "employmentForm", deserialize_with = "loose")]
    employment_form: Option<String>,
    #[serde(rename = "serviceType", deserialize_with = "loose")]
    service_type: Option<String>,
    #[serde(rename = "translateProperties")]
    translate: Group,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct EmployeeRecord {
    #[serde(rename = "employeeInfo", deserialize_with = "object_or_default")]
    employee_info: EmployeeInfo,
    #[serde(rename = "recordInfo", deserialize_with = "object_or_default")]
    record_info: RecordInfo,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct NamedRecord {
    #[serde(deserialize_with = "loose")]
    name: Option<String>,
    #[serde(rename = "objectId", deserialize_with = "loose")]
    object_id: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct MetaObjectRecord {
    fields: Group,
}

/// Null or non-object nested records decode as their default.
fn object_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::de::DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(T::default()),
    }
}

// ---------------------------------------------------------------------------
// Mapping to entities
// ---------------------------------------------------------------------------

fn organization(record: OrganizationRecord) -> Option<Organization> {
    Some(Organization {
        org_id: record.o_id?,
        org_name: record.name,
        parent_company_id: record.custom.get(ORG_PARENT_COMPANY_FIELD),
        parent_company_text: record
            .translate
            .get(&format!("{ORG_PARENT_COMPANY_FIELD}Text")),
        person_in_charge: record.person_in_charge,
        person_in_charge_text: record.translate.get("PersonInChargeText"),
        tree_path: record.tree_path,
        tree_path_text: record.translate.get("POIdOrgAdminNameTreePathText"),
    })
}

fn employee(record: EmployeeRecord) -> Option<Employee> {
    let info = record.employee_info;
    let rec = record.record_info;
    Some(Employee {
        user_id: info.user_id?,
        job_number: rec.job_number,
        name: info.name,
        email: info.email,
        id_number: info.id_number,
        mobile_phone: info.mobile_phone,
        department_id: rec.department_id,
        department_text: rec.translate.get("OIdDepartmentText"),
        job_level_id: rec.job_level_id,
        job_level_text: rec.translate.get("OIdJobLevelText"),
        employee_status: rec.employee_status,
        employment_form: rec.employment_form,
        service_type: rec.service_type,
    })
}

fn corporation(record: MetaObjectRecord) -> Option<Corporation> {
    let fields = record.fields;
    Some(Corporation {
        corp_id: fields.get("OId")?,
        corp_name: fields.get("Name"),
        registration_code: fields.get(CORP_REGISTRATION_CODE_FIELD),
        bank_name: fields.get(CORP_BANK_NAME_FIELD),
        bank_account: fields.get(CORP_BANK_ACCOUNT_FIELD),
        phone: fields.get(CORP_PHONE_FIELD),
        registered_address: fields.get(CORP_ADDRESS_FIELD),
    })
}

fn decode_one(kind: EntityKind, value: &Value) -> Result<Option<Entity>, serde_json::Error> {
    let entity = match kind {
        EntityKind::Organization => {
            organization(OrganizationRecord::deserialize(value)?).map(Entity::Organization)
        }
        EntityKind::Employee => employee(EmployeeRecord::deserialize(value)?).map(Entity::Employee),
        EntityKind::JobLevel => {
            let r = NamedRecord::deserialize(value)?;
            r.name.map(|name| {
                Entity::JobLevel(JobLevel {
                    name,
                    object_id: r.object_id,
                })
            })
        }
        EntityKind::EmploymentForm => {
            let r = NamedRecord::deserialize(value)?;
            r.name.map(|name| {
                Entity::EmploymentForm(EmploymentForm {
                    name,
                    object_id: r.object_id,
                })
            })
        }
        EntityKind::Corporation => {
            corporation(MetaObjectRecord::deserialize(value)?).map(Entity::Corporation)
        }
    };
    Ok(entity)
}

/// Decode one page of records, skipping the ones that cannot be used.
pub(crate) fn extract(kind: EntityKind, records: &[Value]) -> Vec<Entity> {
    let mut entities = Vec::with_capacity(records.len());
    for (index, value) in records.iter().enumerate() {
        match decode_one(kind, value) {
            Ok(Some(entity)) => entities.push(entity),
            Ok(None) => {
                tracing::warn!(%kind, index, "record has no natural key, skipped");
            }
            Err(e) => {
                tracing::warn!(%kind, index, error = %e, "undecodable record, skipped");
            }
        }
    }
    entities
}
