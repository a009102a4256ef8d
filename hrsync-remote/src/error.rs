//! Error types for hrsync-remote.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

/// All errors that can arise talking to either backend.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("transport error calling {url}: {message}")]
    Transport { url: String, message: String },

    /// The backend answered with an unexpected HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend answered but reported a business-level failure.
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    /// A response body could not be decoded.
    #[error("malformed JSON from {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Credentials were rejected or a token response was unusable.
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("invalid time window: start {start} is not before end {end}")]
    InvalidWindow {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("time window of {days} days exceeds the {max}-day maximum")]
    WindowTooLong { days: i64, max: i64 },

    /// A "still processing" loop ran out of attempts.
    #[error("{operation} still not ready after {attempts} attempts")]
    RetriesExhausted { operation: String, attempts: u32 },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RemoteError {
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    /// Transport failures, throttling and server errors may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Transport { .. } => true,
            RemoteError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Convenience constructor for [`RemoteError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RemoteError {
    RemoteError::Io {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        let transport = RemoteError::Transport {
            url: "https://x".into(),
            message: "timed out".into(),
        };
        assert!(transport.is_retryable());
        for (status, retryable) in [(429, true), (500, true), (503, true), (400, false), (404, false)] {
            let err = RemoteError::Status {
                status,
                body: String::new(),
            };
            assert_eq!(err.is_retryable(), retryable, "status {status}");
        }
        assert!(!RemoteError::api("500", "boom").is_retryable());
        assert!(!RemoteError::Auth("bad secret".into()).is_retryable());
    }
}
