//! Blocking HTTP seam.
//!
//! Clients build an [`HttpRequest`] and hand it to a [`Transport`]. The real
//! transport is a `ureq` agent; tests substitute a scripted one. Any HTTP
//! status comes back as an `Ok` response so callers decide what each status
//! means for their endpoint.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{io_err, RemoteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of a query parameter, if set.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body, naming `context` in the error.
    pub fn json<T: DeserializeOwned>(&self, context: &str) -> Result<T, RemoteError> {
        serde_json::from_str(&self.body).map_err(|e| RemoteError::json(context, e))
    }

    /// `Err(Status)` unless the status is 2xx.
    pub fn error_for_status(self) -> Result<Self, RemoteError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(RemoteError::Status {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// Sends requests and downloads files.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RemoteError>;

    /// Stream `url` into `dest`, returning the number of bytes written.
    fn download(&self, url: &str, dest: &Path) -> Result<u64, RemoteError>;
}

// ---------------------------------------------------------------------------
// ureq
// ---------------------------------------------------------------------------

/// [`Transport`] backed by a shared `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }

    fn call(&self, request: &HttpRequest) -> Result<ureq::Response, RemoteError> {
        let mut req = self.agent.request(request.method.as_str(), &request.url);
        for (key, value) in &request.query {
            req = req.query(key, value);
        }
        for (key, value) in &request.headers {
            req = req.set(key, value);
        }
        let result = match &request.body {
            Some(body) => req.send_json(body),
            None => req.call(),
        };
        match result {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(_, response)) => Ok(response),
            Err(ureq::Error::Transport(t)) => Err(RemoteError::Transport {
                url: request.url.clone(),
                message: t.to_string(),
            }),
        }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RemoteError> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "http request");
        let response = self.call(request)?;
        let status = response.status();
        let body = response.into_string().map_err(|e| RemoteError::Transport {
            url: request.url.clone(),
            message: format!("failed to read response body: {e}"),
        })?;
        tracing::debug!(status, url = %request.url, "http response");
        Ok(HttpResponse { status, body })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64, RemoteError> {
        let response = self.call(&HttpRequest::get(url))?;
        let status = response.status();
        if !(200..300).contains(&status) {
            let body = response.into_string().unwrap_or_default();
            return Err(RemoteError::Status { status, body });
        }

        let tmp = dest.with_extension("part");
        let mut file = File::create(&tmp).map_err(|e| io_err(&tmp, e))?;
        let written =
            std::io::copy(&mut response.into_reader(), &mut file).map_err(|e| io_err(&tmp, e))?;
        file.flush().map_err(|e| io_err(&tmp, e))?;
        drop(file);
        std::fs::rename(&tmp, dest).map_err(|e| io_err(dest, e))?;
        Ok(written)
    }
}

// ---------------------------------------------------------------------------
// Scripted transport for unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Mutex;

    use super::{HttpRequest, HttpResponse, Transport};
    use crate::error::RemoteError;

    /// Replays queued responses in order and records every request.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<HttpResponse, RemoteError>>>,
        requests: Mutex<Vec<HttpRequest>>,
        downloads: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn respond(&self, status: u16, body: impl Into<String>) -> &Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Ok(HttpResponse::new(status, body)));
            self
        }

        pub(crate) fn fail(&self, err: RemoteError) -> &Self {
            self.responses.lock().unwrap().push_back(Err(err));
            self
        }

        pub(crate) fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub(crate) fn downloads(&self) -> Vec<String> {
            self.downloads.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RemoteError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unscripted request to {}", request.url))
        }

        fn download(&self, url: &str, dest: &Path) -> Result<u64, RemoteError> {
            self.downloads.lock().unwrap().push(url.to_string());
            std::fs::write(dest, b"branch data").unwrap();
            Ok(11)
        }
    }
}
