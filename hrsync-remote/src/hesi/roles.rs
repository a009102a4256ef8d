//! Role-staff registry endpoints.

use serde_json::{json, Value};

use hrsync_core::{RoleId, RoleMapping, StaffKeyKind};

use super::{error_message, HesiClient, ValueBody};
use crate::error::RemoteError;
use crate::http::Method;
use crate::RoleRegistry;

const AUTH_STAFF_PATH: &str = "/api/openapi/v1/charge/powers/authStaff";

fn role_staffs_path(role_id: &RoleId) -> String {
    format!("/api/openapi/v1.1/roledefs/{role_id}/staffs")
}

/// Troubleshooting hint for a 412 from the role-staff PUT.
fn put_precondition_hint(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    if message.contains("找不到角色") || lower.contains("role not found") {
        "check that the role id exists"
    } else if message.contains("数据错误") || lower.contains("data error") {
        "check that each path is a complete department path and the staff identifiers are valid"
    } else if message.contains("不能为空") || lower.contains("must not be null") {
        "path and staffs may not be null except for plain roles"
    } else {
        "see the registry's error message"
    }
}

impl RoleRegistry for HesiClient {
    fn authorize_staff(&self, staffs: &[String]) -> Result<(), RemoteError> {
        let mut body = json!({ "type": "code" });
        if !staffs.is_empty() {
            body["addStaff"] = json!(staffs);
        }
        let request = self
            .request(Method::Post, AUTH_STAFF_PATH)?
            .header("Accept", "application/json")
            .json(body);
        let response = self.transport.send(&request)?;

        match response.status {
            200 => {
                let result: ValueBody = response.json("authStaff")?;
                if result.value == Value::Bool(true) {
                    tracing::debug!(count = staffs.len(), "staff authorized");
                    Ok(())
                } else {
                    Err(RemoteError::api("200", "authStaff returned a false value"))
                }
            }
            400 => {
                let message = error_message(&response.body);
                tracing::error!(
                    %message,
                    hint = "the staff identifier type must be the fixed value \"code\"",
                    "authStaff rejected"
                );
                Err(RemoteError::api("400", message))
            }
            _ => Err(RemoteError::Status {
                status: response.status,
                body: response.body,
            }),
        }
    }

    fn delete_role_staffs(&self, role_id: &RoleId) -> Result<(), RemoteError> {
        let request = self.request(Method::Delete, &role_staffs_path(role_id))?;
        let response = self.transport.send(&request)?;

        match response.status {
            204 => Ok(()),
            412 => {
                let message = error_message(&response.body);
                tracing::error!(%role_id, %message, hint = "check that the role id exists", "role staff delete rejected");
                Err(RemoteError::api("412", message))
            }
            _ => Err(RemoteError::Status {
                status: response.status,
                body: response.body,
            }),
        }
    }

    fn put_role_staffs(
        &self,
        role_id: &RoleId,
        mappings: &[RoleMapping],
        staff_by: StaffKeyKind,
    ) -> Result<(), RemoteError> {
        let request = self
            .request(Method::Put, &role_staffs_path(role_id))?
            .query("staffBy", staff_by.as_str())
            .json(json!({ "contents": mappings }));
        let response = self.transport.send(&request)?;

        match response.status {
            204 => Ok(()),
            400 => {
                tracing::error!(%role_id, hint = "check the spelling of the contents field", "contents must not be empty");
                Err(RemoteError::api("400", "contents must not be empty"))
            }
            403 => {
                tracing::error!(
                    %role_id,
                    hint = "manually managed roles can only be updated through the v1.1 endpoint",
                    "no permission to sync this role"
                );
                Err(RemoteError::api("403", "no permission to sync this role"))
            }
            412 => {
                let message = error_message(&response.body);
                tracing::error!(%role_id, %message, hint = put_precondition_hint(&message), "role staff update rejected");
                Err(RemoteError::api("412", message))
            }
            _ => Err(RemoteError::Status {
                status: response.status,
                body: response.body,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::http::fake::ScriptedTransport;
    use crate::token::TokenProvider;
    use hrsync_core::PathType;

    struct StaticTokens;

    impl TokenProvider for StaticTokens {
        fn access_token(&self) -> Result<String, RemoteError> {
            Ok("hesi-tok".into())
        }

        fn base_url(&self) -> Result<String, RemoteError> {
            Ok("https://tenant.example.com".into())
        }
    }

    fn client(transport: &Arc<ScriptedTransport>) -> HesiClient {
        HesiClient::new(transport.clone(), Arc::new(StaticTokens))
    }

    fn mapping() -> RoleMapping {
        RoleMapping {
            path_type: PathType::Name,
            path: vec!["HQ".into(), "Sales".into()],
            staffs: vec!["E001".into()],
        }
    }

    #[test]
    fn authorize_sends_code_type_and_staff() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(200, r#"{"value":true}"#);
        client(&transport)
            .authorize_staff(&["E001".into(), "E002".into()])
            .unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.url, "https://tenant.example.com/api/openapi/v1/charge/powers/authStaff");
        assert_eq!(request.query_value("accessToken"), Some("hesi-tok"));
        let body = request.body.as_ref().unwrap();
        assert_eq!(body["type"], "code");
        assert_eq!(body["addStaff"], json!(["E001", "E002"]));
        assert!(body.get("delStaff").is_none());
    }

    #[test]
    fn authorize_false_value_is_api_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(200, r#"{"value":false}"#);
        let err = client(&transport).authorize_staff(&["E001".into()]).unwrap_err();
        assert!(matches!(err, RemoteError::Api { .. }));
    }

    #[test]
    fn delete_succeeds_on_no_content() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(204, "");
        client(&transport).delete_role_staffs(&RoleId::from("R1")).unwrap();
        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Delete);
        assert!(request.url.ends_with("/api/openapi/v1.1/roledefs/R1/staffs"));
    }

    #[test]
    fn delete_unknown_role_carries_message() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(412, r#"{"message":"role not found"}"#);
        let err = client(&transport)
            .delete_role_staffs(&RoleId::from("missing"))
            .unwrap_err();
        match err {
            RemoteError::Api { code, message } => {
                assert_eq!(code, "412");
                assert_eq!(message, "role not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn put_sends_contents_and_staff_key() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(204, "");
        client(&transport)
            .put_role_staffs(&RoleId::from("R1"), &[mapping()], StaffKeyKind::Code)
            .unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.query_value("staffBy"), Some("code"));
        let body = request.body.as_ref().unwrap();
        assert_eq!(body["contents"][0]["pathType"], "name");
        assert_eq!(body["contents"][0]["path"], json!(["HQ", "Sales"]));
        assert_eq!(body["contents"][0]["staffs"], json!(["E001"]));
    }

    #[test]
    fn put_status_codes_map_to_errors() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .respond(403, "")
            .respond(412, r#"{"message":"data error"}"#)
            .respond(503, "maintenance");
        let hesi = client(&transport);
        let role = RoleId::from("R1");

        let forbidden = hesi.put_role_staffs(&role, &[mapping()], StaffKeyKind::Code).unwrap_err();
        assert!(matches!(forbidden, RemoteError::Api { ref code, .. } if code == "403"));
        let precondition = hesi.put_role_staffs(&role, &[mapping()], StaffKeyKind::Code).unwrap_err();
        assert!(precondition.to_string().contains("data error"));
        let unavailable = hesi.put_role_staffs(&role, &[mapping()], StaffKeyKind::Code).unwrap_err();
        assert!(unavailable.is_retryable());
    }

    #[test]
    fn precondition_hints_follow_message() {
        assert_eq!(put_precondition_hint("找不到角色"), "check that the role id exists");
        assert!(put_precondition_hint("数据错误").contains("complete department path"));
        assert!(put_precondition_hint("参数staffs不能为空").contains("may not be null"));
    }
}
