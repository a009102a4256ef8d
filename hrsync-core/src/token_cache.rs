//! Token cache files under `~/.hrsync/cache/`.
//!
//! Each backend keeps one JSON document:
//!
//! ```json
//! { "token_data": { "accessToken": "...", "expireTime": 1700000000000 },
//!   "base_url": "https://tenant.example.com" }
//! ```
//!
//! `token_data` is kept verbatim as the backend returned it. Writes use the
//! `.tmp` + rename pattern.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{io_err, ConfigError};

/// Tokens are considered expired this long before their real expiry.
pub const EXPIRY_MARGIN_MS: i64 = 7_200_000;

/// On-disk token cache payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TokenCacheFile {
    #[serde(default)]
    pub token_data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl TokenCacheFile {
    pub fn new(token_data: Map<String, Value>, base_url: Option<String>) -> Self {
        Self {
            token_data,
            base_url,
        }
    }

    /// A string field of `token_data` (`accessToken`, `refreshToken`, ...).
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.token_data
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// `expireTime` in epoch milliseconds. Numeric strings are accepted.
    pub fn expire_time_ms(&self) -> Option<i64> {
        match self.token_data.get("expireTime")? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// True when `token_field` is missing, there is no expiry, or the token
    /// expires within [`EXPIRY_MARGIN_MS`] of `now_ms`.
    pub fn is_expired(&self, token_field: &str, now_ms: i64) -> bool {
        if self.str_field(token_field).is_none() {
            return true;
        }
        match self.expire_time_ms() {
            Some(expire) => now_ms + EXPIRY_MARGIN_MS >= expire,
            None => true,
        }
    }
}

/// Load a cache file. Returns `Ok(None)` if it does not exist.
pub fn load(path: &Path) -> Result<Option<TokenCacheFile>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let file = serde_json::from_str(&contents).map_err(|e| ConfigError::CacheParse {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Some(file))
}

/// Save a cache file atomically, creating the cache directory if needed.
pub fn save(path: &Path, file: &TokenCacheFile) -> Result<(), ConfigError> {
    let Some(dir) = path.parent() else {
        return Err(io_err(
            path,
            std::io::Error::other("invalid token cache path"),
        ));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(file).map_err(|e| ConfigError::CacheParse {
        path: path.to_path_buf(),
        source: e,
    })?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}
