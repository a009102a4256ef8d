//! Expense platform (Hesi) client: role-staff registry and bank-branch file.

mod branch;
mod roles;

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::RemoteError;
use crate::http::{HttpRequest, Method, Transport};
use crate::token::TokenProvider;

pub use branch::BRANCH_FILE_NAME;

/// Error bodies carry a `message` next to whatever else the endpoint returns.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    message: Option<String>,
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| "unknown error".to_string())
}

pub struct HesiClient {
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenProvider>,
}

impl HesiClient {
    pub fn new(transport: Arc<dyn Transport>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self { transport, tokens }
    }

    /// A request to `path` under the tenant base URL, authenticated by the
    /// `accessToken` query parameter.
    fn request(&self, method: Method, path: &str) -> Result<HttpRequest, RemoteError> {
        let url = format!("{}{}", self.tokens.base_url()?, path);
        let token = self.tokens.access_token()?;
        Ok(HttpRequest::new(method, url).query("accessToken", token))
    }
}

/// `{"value": ...}` envelope around most Hesi results.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ValueBody {
    value: Value,
}
