//! HR platform (Beisen) time-window fetcher.
//!
//! A fetch cuts its span into windows, then walks each window with the
//! provider's scroll cursor until the data runs out or the provider reports a
//! non-success code.

mod extract;
mod payload;
pub mod window;

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

use hrsync_core::{Entity, EntityKind};

use crate::error::RemoteError;
use crate::http::{HttpRequest, Transport};
use crate::rate_limit::RateLimiter;
use crate::token::TokenProvider;
use crate::EntitySource;

pub use window::{split_windows, TimeWindow};

const SUCCESS_CODE: &str = "200";

/// One scroll page as the provider returns it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScrollPage {
    code: Value,
    message: Value,
    #[serde(rename = "scrollId")]
    scroll_id: Option<String>,
    data: Value,
}

impl ScrollPage {
    fn code(&self) -> String {
        match &self.code {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    fn message(&self) -> String {
        match &self.message {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    fn records(&self) -> &[Value] {
        self.data.as_array().map(Vec::as_slice).unwrap_or(&[])
    }
}

pub struct BeisenClient {
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenProvider>,
    limiter: RateLimiter,
    max_window_days: i64,
    capacity: u32,
}

impl BeisenClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenProvider>,
        limiter: RateLimiter,
        max_window_days: i64,
        capacity: u32,
    ) -> Self {
        Self {
            transport,
            tokens,
            limiter,
            max_window_days,
            capacity,
        }
    }

    /// Fetch every `kind` record changed in `[start, end)`.
    pub fn fetch(
        &self,
        kind: EntityKind,
        start: NaiveDateTime,
        end: NaiveDateTime,
        incremental: bool,
    ) -> Result<Vec<Entity>, RemoteError> {
        let windows = split_windows(start, end, self.max_window_days, incremental)?;
        if windows.len() > 1 {
            tracing::info!(%kind, windows = windows.len(), "span split into time windows");
        }
        let mut entities = Vec::new();
        for window in &windows {
            entities.extend(self.scroll(kind, window)?);
        }
        tracing::info!(%kind, count = entities.len(), "fetch complete");
        Ok(entities)
    }

    /// Fetch a single window no longer than the configured maximum.
    pub fn fetch_window(
        &self,
        kind: EntityKind,
        window: &TimeWindow,
    ) -> Result<Vec<Entity>, RemoteError> {
        let days = window.days();
        if days > self.max_window_days {
            return Err(RemoteError::WindowTooLong {
                days,
                max: self.max_window_days,
            });
        }
        self.scroll(kind, window)
    }

    fn scroll(&self, kind: EntityKind, window: &TimeWindow) -> Result<Vec<Entity>, RemoteError> {
        let url = format!("{}{}", self.tokens.base_url()?, payload::endpoint(kind));
        let mut body = payload::query_payload(kind, window, self.capacity);
        let mut entities = Vec::new();

        loop {
            self.limiter.wait_for_rate_limit();
            let token = self.tokens.access_token()?;
            let request = HttpRequest::post(&url)
                .header("Authorization", format!("Bearer {token}"))
                .json(body.clone());
            let response = self.transport.send(&request)?.error_for_status()?;
            let page: ScrollPage = response.json(&format!("{kind} time window"))?;

            let code = page.code();
            if code != SUCCESS_CODE {
                tracing::error!(
                    %kind,
                    code = %code,
                    message = %page.message(),
                    fetched = entities.len(),
                    "scroll stopped by provider, keeping partial results"
                );
                break;
            }

            let records = page.records();
            if records.is_empty() {
                break;
            }
            let batch = extract::extract(kind, records);
            if batch.is_empty() {
                break;
            }
            tracing::debug!(%kind, page = batch.len(), "scroll page");
            entities.extend(batch);

            // A missing cursor would restart the query from the first page.
            let Some(cursor) = page.scroll_id.filter(|c| !c.trim().is_empty()) else {
                tracing::warn!(
                    %kind,
                    fetched = entities.len(),
                    "page carried no scroll cursor, ending scroll"
                );
                break;
            };
            body["scrollId"] = Value::String(cursor);
        }
        Ok(entities)
    }
}

impl EntitySource for BeisenClient {
    fn fetch(
        &self,
        kind: EntityKind,
        start: NaiveDateTime,
        end: NaiveDateTime,
        incremental: bool,
    ) -> Result<Vec<Entity>, RemoteError> {
        BeisenClient::fetch(self, kind, start, end, incremental)
    }
}
