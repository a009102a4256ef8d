//! Time-window query payloads and endpoints per entity kind.

use chrono::NaiveDateTime;
use serde_json::{json, Value};

use hrsync_core::EntityKind;

use super::window::TimeWindow;

/// Tenant custom field holding an organization's parent company.
pub(crate) const ORG_PARENT_COMPANY_FIELD: &str = "extsuoshugongsizhuti_609792_1697874494";

/// Tenant custom fields on the corporation meta object.
pub(crate) const CORP_REGISTRATION_CODE_FIELD: &str = "extzuzhidaima_609792_945002890";
pub(crate) const CORP_BANK_NAME_FIELD: &str = "extkaihuyinhang_609792_103657435";
pub(crate) const CORP_BANK_ACCOUNT_FIELD: &str = "extyinhangzhanghao_609792_990841835";
pub(crate) const CORP_PHONE_FIELD: &str = "extdianhua_609792_1936418435";
pub(crate) const CORP_ADDRESS_FIELD: &str = "extdengjidizhi_609792_1284935992";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub(crate) fn endpoint(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Organization => "/TenantBaseExternal/api/v5/Organization/GetByTimeWindow",
        EntityKind::Employee => "/TenantBaseExternal/api/v5/Employee/GetByTimeWindow",
        EntityKind::JobLevel => "/TenantBaseExternal/api/v5/JobLevel/GetByTimeWindow",
        EntityKind::EmploymentForm => "/TenantBaseExternal/api/v5/EmploymentForm/GetByTimeWindow",
        EntityKind::Corporation => "/TenantBaseExternal/api/v5/CommonMetaObject/GetByTimeWindow",
    }
}

fn timestamp(t: NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

fn columns(kind: EntityKind) -> Vec<&'static str> {
    match kind {
        EntityKind::Organization => vec![
            "OId",
            "POIdOrgAdminNameTreePath",
            ORG_PARENT_COMPANY_FIELD,
            "PersonInCharge",
            "Name",
        ],
        EntityKind::Employee => vec![
            "Name",
            "EmployType",
            "JobNumber",
            "OIdDepartment",
            "serviceType",
            "OIdJobLevel",
            "MobilePhone",
            "iDNumber",
            "EmployeeStatus",
            "email",
            "EmploymentForm",
        ],
        EntityKind::JobLevel => vec!["Name", "OId", "StartDate", "Level"],
        EntityKind::EmploymentForm => vec!["Name", "StartDate"],
        EntityKind::Corporation => vec![
            "OId",
            "Name",
            CORP_REGISTRATION_CODE_FIELD,
            CORP_BANK_NAME_FIELD,
            CORP_BANK_ACCOUNT_FIELD,
            CORP_PHONE_FIELD,
            CORP_ADDRESS_FIELD,
            "Status",
        ],
    }
}

/// The first-page payload for `kind` over `window`; `scrollId` starts null.
pub(crate) fn query_payload(kind: EntityKind, window: &TimeWindow, capacity: u32) -> Value {
    let mut payload = json!({
        "timeWindowQueryType": 1,
        "startTime": timestamp(window.start),
        "stopTime": timestamp(window.end),
        "capacity": capacity,
        "columns": columns(kind),
        "extQueries": [],
        "isWithDeleted": false,
        "enableTranslate": true,
        "sort": { "Name": 1 },
        "scrollId": Value::Null,
    });
    match kind {
        EntityKind::Employee => {
            // 2 probation, 3 regular, 6 retired, 8 departed.
            payload["empStatus"] = json!([2, 3, 6, 8]);
            // Regular staff, external staff, interns.
            payload["employType"] = json!([0, 1, 2]);
            // Primary positions only.
            payload["serviceType"] = json!([0]);
        }
        EntityKind::Corporation => {
            payload["metaObjectName"] = json!("Corporation");
        }
        _ => {}
    }
    payload
}
