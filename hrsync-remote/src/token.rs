//! Access-token providers for both backends.
//!
//! Each manager owns one cache file and serializes check-and-refresh behind a
//! mutex, so concurrent callers sharing an `Arc` trigger at most one
//! authentication. Tokens count as expired two hours before their real
//! expiry (see [`hrsync_core::token_cache::EXPIRY_MARGIN_MS`]).

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Deserialize;
use serde_json::{json, Map, Value};

use hrsync_core::config::{BeisenConfig, HesiConfig};
use hrsync_core::token_cache::{self, TokenCacheFile};

use crate::clock::Clock;
use crate::error::RemoteError;
use crate::http::{HttpRequest, Transport};

/// Supplies a valid access token and the API base URL for one backend.
pub trait TokenProvider: Send + Sync {
    fn access_token(&self) -> Result<String, RemoteError>;
    fn base_url(&self) -> Result<String, RemoteError>;
}

/// Hesi's refresh endpoint needs this fixed power code.
const HESI_POWER_CODE: &str = "219904";

/// Load a cache file, treating an unreadable one as empty.
fn load_cache(path: &Path) -> TokenCacheFile {
    match token_cache::load(path) {
        Ok(Some(file)) => file,
        Ok(None) => TokenCacheFile::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable token cache");
            TokenCacheFile::default()
        }
    }
}

fn save_cache(path: &Path, file: &TokenCacheFile) -> Result<(), RemoteError> {
    token_cache::save(path, file).map_err(|e| RemoteError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::other(e),
    })
}

fn lock(state: &Mutex<TokenCacheFile>) -> MutexGuard<'_, TokenCacheFile> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn into_object(value: Value, context: &str) -> Result<Map<String, Value>, RemoteError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(RemoteError::Auth(format!(
            "{context}: expected a JSON object, got {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Beisen
// ---------------------------------------------------------------------------

/// Client-credentials tokens for the HR platform.
pub struct BeisenTokenManager {
    config: BeisenConfig,
    cache_path: PathBuf,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    state: Mutex<TokenCacheFile>,
}

impl BeisenTokenManager {
    pub fn new(
        config: BeisenConfig,
        cache_path: PathBuf,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = load_cache(&cache_path);
        Self {
            config,
            cache_path,
            transport,
            clock,
            state: Mutex::new(state),
        }
    }

    fn authenticate(&self, state: &mut TokenCacheFile) -> Result<(), RemoteError> {
        let url = format!("{}/token", self.config.base_url.trim_end_matches('/'));
        let request = HttpRequest::post(url).json(json!({
            "grant_type": "client_credentials",
            "app_key": self.config.app_key,
            "app_secret": self.config.app_secret,
        }));
        let response = self.transport.send(&request)?;
        if response.status != 200 {
            return Err(RemoteError::Auth(format!(
                "HR platform token request returned {}: {}",
                response.status, response.body
            )));
        }
        let mut token_data = into_object(response.json("HR platform token")?, "HR platform token")?;
        if token_data
            .get("access_token")
            .and_then(Value::as_str)
            .map_or(true, str::is_empty)
        {
            return Err(RemoteError::Auth(
                "HR platform token response has no access_token".into(),
            ));
        }
        if !token_data.contains_key("expireTime") {
            if let Some(secs) = token_data.get("expires_in").and_then(Value::as_i64) {
                let expire = self.clock.epoch_millis() + secs * 1000;
                token_data.insert("expireTime".into(), json!(expire));
            }
        }

        *state = TokenCacheFile::new(token_data, Some(self.config.base_url.clone()));
        save_cache(&self.cache_path, state)?;
        tracing::info!("HR platform access token refreshed");
        Ok(())
    }
}

impl TokenProvider for BeisenTokenManager {
    fn access_token(&self) -> Result<String, RemoteError> {
        let mut state = lock(&self.state);
        if state.is_expired("access_token", self.clock.epoch_millis()) {
            self.authenticate(&mut state)?;
        }
        state
            .str_field("access_token")
            .map(str::to_owned)
            .ok_or_else(|| RemoteError::Auth("no HR platform access token".into()))
    }

    fn base_url(&self) -> Result<String, RemoteError> {
        let base = self.config.base_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(RemoteError::Auth("beisen.base_url is not configured".into()));
        }
        Ok(base.to_string())
    }
}

// ---------------------------------------------------------------------------
// Hesi
// ---------------------------------------------------------------------------

/// Hesi wraps every auth payload in `{"value": ...}`.
#[derive(Debug, Deserialize)]
struct ValueEnvelope {
    value: Option<Value>,
}

/// App-key tokens for the expense platform, with refresh-token renewal and
/// tenant base-URL discovery.
pub struct HesiTokenManager {
    config: HesiConfig,
    cache_path: PathBuf,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    state: Mutex<TokenCacheFile>,
}

impl HesiTokenManager {
    pub fn new(
        config: HesiConfig,
        cache_path: PathBuf,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = load_cache(&cache_path);
        Self {
            config,
            cache_path,
            transport,
            clock,
            state: Mutex::new(state),
        }
    }

    fn ensure_base_url(&self, state: &mut TokenCacheFile) -> Result<String, RemoteError> {
        if let Some(base) = state.base_url.as_deref().filter(|b| !b.is_empty()) {
            return Ok(base.to_string());
        }
        let request =
            HttpRequest::get(&self.config.location_url).query("corpId", &self.config.corp_id);
        let response = self.transport.send(&request)?.error_for_status()?;
        let envelope: ValueEnvelope = response.json("expense platform location")?;
        let base = envelope
            .value
            .as_ref()
            .and_then(Value::as_str)
            .map(|v| v.trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RemoteError::Auth("location response has no base URL".into()))?;

        state.base_url = Some(base.clone());
        save_cache(&self.cache_path, state)?;
        tracing::info!(base_url = %base, "expense platform base URL discovered");
        Ok(base)
    }

    fn token_value(&self, response_body: &str, context: &str) -> Result<Map<String, Value>, RemoteError> {
        let envelope: ValueEnvelope =
            serde_json::from_str(response_body).map_err(|e| RemoteError::json(context, e))?;
        let value = envelope
            .value
            .ok_or_else(|| RemoteError::Auth(format!("{context}: response has no value")))?;
        into_object(value, context)
    }

    fn authenticate(&self, state: &mut TokenCacheFile) -> Result<(), RemoteError> {
        let base = self.ensure_base_url(state)?;
        let request = HttpRequest::post(format!("{base}/api/openapi/v1/auth/getAccessToken")).json(
            json!({
                "appKey": self.config.app_key,
                "appSecurity": self.config.app_security,
            }),
        );
        let response = self.transport.send(&request)?;
        if response.status != 200 {
            return Err(RemoteError::Auth(format!(
                "expense platform getAccessToken returned {}: {}",
                response.status, response.body
            )));
        }
        state.token_data = self.token_value(&response.body, "getAccessToken")?;
        save_cache(&self.cache_path, state)?;
        tracing::info!("expense platform access token obtained");
        Ok(())
    }

    fn refresh(&self, state: &mut TokenCacheFile) -> Result<(), RemoteError> {
        let base = self.ensure_base_url(state)?;
        let (Some(access), Some(refresh)) =
            (state.str_field("accessToken"), state.str_field("refreshToken"))
        else {
            return Err(RemoteError::Auth("no refresh token cached".into()));
        };
        let request = HttpRequest::post(format!("{base}/api/openapi/v2/auth/refreshToken"))
            .query("accessToken", access)
            .query("refreshToken", refresh)
            .query("powerCode", HESI_POWER_CODE);
        let response = self.transport.send(&request)?;
        if response.status != 200 {
            return Err(RemoteError::Auth(format!(
                "expense platform refreshToken returned {}: {}",
                response.status, response.body
            )));
        }
        state.token_data = self.token_value(&response.body, "refreshToken")?;
        save_cache(&self.cache_path, state)?;
        tracing::info!("expense platform access token refreshed");
        Ok(())
    }
}

impl TokenProvider for HesiTokenManager {
    fn access_token(&self) -> Result<String, RemoteError> {
        let mut state = lock(&self.state);
        if state.is_expired("accessToken", self.clock.epoch_millis()) {
            if state.str_field("refreshToken").is_some() {
                if let Err(e) = self.refresh(&mut state) {
                    tracing::warn!(error = %e, "token refresh failed, re-authenticating");
                    self.authenticate(&mut state)?;
                }
            } else {
                self.authenticate(&mut state)?;
            }
        }
        state
            .str_field("accessToken")
            .map(str::to_owned)
            .ok_or_else(|| RemoteError::Auth("no expense platform access token".into()))
    }

    fn base_url(&self) -> Result<String, RemoteError> {
        let mut state = lock(&self.state);
        self.ensure_base_url(&mut state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::fake::FakeClock;
    use crate::http::fake::ScriptedTransport;
    use hrsync_core::token_cache::EXPIRY_MARGIN_MS;
    use tempfile::TempDir;

    const NOW: i64 = 1_700_000_000_000;

    fn beisen_config() -> BeisenConfig {
        BeisenConfig {
            app_key: "k".into(),
            app_secret: "s".into(),
            base_url: "https://hr.example.com".into(),
        }
    }

    fn hesi_config() -> HesiConfig {
        HesiConfig {
            app_key: "hk".into(),
            app_security: "hs".into(),
            corp_id: "CORP".into(),
            location_url: "https://loc.example.com/location".into(),
        }
    }

    fn beisen(
        dir: &TempDir,
        transport: &Arc<ScriptedTransport>,
    ) -> (BeisenTokenManager, PathBuf) {
        let path = dir.path().join("cache").join("beisen_token.json");
        let manager = BeisenTokenManager::new(
            beisen_config(),
            path.clone(),
            transport.clone(),
            Arc::new(FakeClock::at_epoch_millis(NOW)),
        );
        (manager, path)
    }

    #[test]
    fn beisen_authenticates_and_caches() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(200, r#"{"access_token":"tok-1","expires_in":86400}"#);
        let (manager, path) = beisen(&dir, &transport);

        assert_eq!(manager.access_token().unwrap(), "tok-1");
        // Second call is served from memory.
        assert_eq!(manager.access_token().unwrap(), "tok-1");
        assert_eq!(transport.requests().len(), 1);
        let request = &transport.requests()[0];
        assert_eq!(request.url, "https://hr.example.com/token");
        assert_eq!(request.body.as_ref().unwrap()["grant_type"], "client_credentials");

        let cached = token_cache::load(&path).unwrap().unwrap();
        assert_eq!(cached.expire_time_ms(), Some(NOW + 86_400_000));
        assert_eq!(cached.base_url.as_deref(), Some("https://hr.example.com"));
    }

    #[test]
    fn beisen_reuses_unexpired_cached_token() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache").join("beisen_token.json");
        let Value::Object(map) =
            json!({"access_token": "cached", "expireTime": NOW + EXPIRY_MARGIN_MS + 60_000})
        else {
            unreachable!()
        };
        token_cache::save(&path, &TokenCacheFile::new(map, None)).unwrap();

        let transport = Arc::new(ScriptedTransport::new());
        let (manager, _) = beisen(&dir, &transport);
        assert_eq!(manager.access_token().unwrap(), "cached");
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn beisen_expired_token_reauthenticates_and_rewrites_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache").join("beisen_token.json");
        let Value::Object(map) =
            json!({"access_token": "stale", "expireTime": NOW + EXPIRY_MARGIN_MS - 1})
        else {
            unreachable!()
        };
        token_cache::save(&path, &TokenCacheFile::new(map, None)).unwrap();

        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(200, format!(r#"{{"access_token":"fresh","expireTime":{}}}"#, NOW * 2));
        let (manager, _) = beisen(&dir, &transport);

        assert_eq!(manager.access_token().unwrap(), "fresh");
        let cached = token_cache::load(&path).unwrap().unwrap();
        assert_eq!(cached.str_field("access_token"), Some("fresh"));
    }

    #[test]
    fn beisen_rejected_credentials_are_auth_errors() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(401, "bad secret");
        let (manager, path) = beisen(&dir, &transport);

        assert!(matches!(manager.access_token(), Err(RemoteError::Auth(_))));
        assert!(!path.exists());
    }

    #[test]
    fn hesi_discovers_base_url_then_authenticates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hesi_token.json");
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .respond(200, r#"{"value":"https://tenant.example.com/"}"#)
            .respond(
                200,
                format!(
                    r#"{{"value":{{"accessToken":"h-1","refreshToken":"r-1","expireTime":{}}}}}"#,
                    NOW * 2
                ),
            );
        let manager = HesiTokenManager::new(
            hesi_config(),
            path.clone(),
            transport.clone(),
            Arc::new(FakeClock::at_epoch_millis(NOW)),
        );

        assert_eq!(manager.access_token().unwrap(), "h-1");
        assert_eq!(manager.base_url().unwrap(), "https://tenant.example.com");

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].query_value("corpId"), Some("CORP"));
        assert_eq!(
            requests[1].url,
            "https://tenant.example.com/api/openapi/v1/auth/getAccessToken"
        );
        let cached = token_cache::load(&path).unwrap().unwrap();
        assert_eq!(cached.base_url.as_deref(), Some("https://tenant.example.com"));
        assert_eq!(cached.str_field("refreshToken"), Some("r-1"));
    }

    #[test]
    fn hesi_expired_token_uses_refresh_flow() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hesi_token.json");
        let Value::Object(map) =
            json!({"accessToken": "old", "refreshToken": "r-old", "expireTime": NOW})
        else {
            unreachable!()
        };
        token_cache::save(
            &path,
            &TokenCacheFile::new(map, Some("https://tenant.example.com".into())),
        )
        .unwrap();

        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            200,
            format!(
                r#"{{"value":{{"accessToken":"new","refreshToken":"r-new","expireTime":{}}}}}"#,
                NOW * 2
            ),
        );
        let manager = HesiTokenManager::new(
            hesi_config(),
            path,
            transport.clone(),
            Arc::new(FakeClock::at_epoch_millis(NOW)),
        );

        assert_eq!(manager.access_token().unwrap(), "new");
        let request = &transport.requests()[0];
        assert!(request.url.ends_with("/api/openapi/v2/auth/refreshToken"));
        assert_eq!(request.query_value("refreshToken"), Some("r-old"));
        assert_eq!(request.query_value("powerCode"), Some("219904"));
    }

    #[test]
    fn hesi_failed_refresh_falls_back_to_authentication() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hesi_token.json");
        let Value::Object(map) =
            json!({"accessToken": "old", "refreshToken": "r-old", "expireTime": NOW})
        else {
            unreachable!()
        };
        token_cache::save(
            &path,
            &TokenCacheFile::new(map, Some("https://tenant.example.com".into())),
        )
        .unwrap();

        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(400, "refresh token expired").respond(
            200,
            format!(r#"{{"value":{{"accessToken":"re-auth","expireTime":{}}}}}"#, NOW * 2),
        );
        let manager = HesiTokenManager::new(
            hesi_config(),
            path,
            transport.clone(),
            Arc::new(FakeClock::at_epoch_millis(NOW)),
        );

        assert_eq!(manager.access_token().unwrap(), "re-auth");
        assert_eq!(transport.requests().len(), 2);
    }
}
