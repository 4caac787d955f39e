//! Error taxonomy shared by every invocation mode.
//!
//! Nothing in this crate retries. Whatever goes wrong is surfaced verbatim
//! through the mode's channel: returned for blocking calls, resolved as
//! [`Outcome::Failed`](crate::Outcome::Failed) for awaitable calls, and passed
//! to the continuation for callback calls.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Failures of the HTTP exchange itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The connection could not be established or was reset.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The transport gave up waiting for a response.
    #[error("request timed out")]
    Timeout,

    /// The request was torn down before it produced a response.
    #[error("request aborted: {0}")]
    Aborted(String),

    /// The server answered with something the client cannot interpret.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_decode() || err.is_body() {
            TransportError::Protocol(err.to_string())
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Protocol(format!("malformed response body: {}", err))
    }
}

/// One entry of a Twitter error payload (`{"errors":[{"code":..,"message":..}]}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteErrorDetail {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

/// Rate-limit window reported by the `x-rate-limit-*` response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: u32,
    pub remaining: u32,
    pub reset: DateTime<Utc>,
}

impl RateLimit {
    /// Builds a rate limit from raw header values; `reset` is epoch seconds.
    pub fn from_headers(limit: &str, remaining: &str, reset: &str) -> Option<Self> {
        let reset = Utc
            .timestamp_opt(reset.trim().parse::<i64>().ok()?, 0)
            .single()?;
        Some(RateLimit {
            limit: limit.trim().parse().ok()?,
            remaining: remaining.trim().parse().ok()?,
            reset,
        })
    }
}

/// Any failure a dispatched operation can end with.
///
/// Cancellation is deliberately absent: a cancelled operation is a
/// legitimate terminal state, not a failure.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Missing or rejected credentials.
    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// A well-formed error payload from the remote service.
    #[error("Twitter API error {status}: {}", summarize(.errors))]
    RemoteApi {
        status: u16,
        errors: Vec<RemoteErrorDetail>,
        rate_limit: Option<RateLimit>,
    },

    /// The request could not be built; nothing was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Whether the credentials were missing or rejected.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }

    /// First server-supplied error code, if the failure carried one.
    pub fn remote_code(&self) -> Option<i64> {
        match self {
            ApiError::RemoteApi { errors, .. } => errors.iter().find_map(|e| e.code),
            _ => None,
        }
    }

    /// HTTP 429 or Twitter error code 88.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ApiError::RemoteApi { status, errors, .. } => {
                *status == 429 || errors.iter().any(|e| e.code == Some(88))
            }
            _ => false,
        }
    }

    /// Rate-limit window reported alongside a remote error, if any.
    pub fn rate_limit(&self) -> Option<&RateLimit> {
        match self {
            ApiError::RemoteApi { rate_limit, .. } => rate_limit.as_ref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.into())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Transport(err.into())
    }
}

fn summarize(errors: &[RemoteErrorDetail]) -> String {
    match errors {
        [] => "no error details".to_string(),
        [only] => describe(only),
        [first, rest @ ..] => format!("{} (+{} more)", describe(first), rest.len()),
    }
}

fn describe(detail: &RemoteErrorDetail) -> String {
    match detail.code {
        Some(code) => format!("[{}] {}", code, detail.message),
        None => detail.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_display_includes_code() {
        let err = ApiError::RemoteApi {
            status: 403,
            errors: vec![
                RemoteErrorDetail {
                    code: Some(187),
                    message: "Status is a duplicate.".into(),
                },
                RemoteErrorDetail {
                    code: None,
                    message: "other".into(),
                },
            ],
            rate_limit: None,
        };
        assert_eq!(
            err.to_string(),
            "Twitter API error 403: [187] Status is a duplicate. (+1 more)"
        );
        assert_eq!(err.remote_code(), Some(187));
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn rate_limit_headers_parse() {
        let limit = RateLimit::from_headers("15", "0", "1700000000").unwrap();
        assert_eq!(limit.limit, 15);
        assert_eq!(limit.remaining, 0);
        assert_eq!(limit.reset.timestamp(), 1_700_000_000);
        assert!(RateLimit::from_headers("15", "x", "1700000000").is_none());
    }
}
