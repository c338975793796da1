use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Categories of API errors for consistent error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// 401 received and the token refresh did not succeed
    SessionExpired,
    /// Unsuccessful HTTP status other than the refresh-handled 401 (4xx, 5xx)
    HttpStatus,
    /// Network unreachable or the request could not be sent
    Transport,
    /// Failed to parse a response body
    Parse,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::SessionExpired => write!(f, "session_expired"),
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured error from an API call with kind and details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// HTTP status code, when the server answered
    pub status: Option<u16>,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            details: None,
        }
    }

    /// The terminal "please log in again" failure.
    pub fn session_expired() -> Self {
        Self::new(
            ApiErrorKind::SessionExpired,
            "Session expired, please log in again",
        )
    }

    /// Creates an HTTP status error, extracting the server's `detail`
    /// message from the body when present.
    pub fn http_status(status: u16, body: &str) -> Self {
        let message = match extract_detail(body) {
            Some(detail) => format!("HTTP {status}: {detail}"),
            None => format!("HTTP {status}"),
        };
        Self {
            kind: ApiErrorKind::HttpStatus,
            message,
            status: Some(status),
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Creates a transport error from a failed request.
    pub fn transport(err: &reqwest::Error) -> Self {
        Self::new(ApiErrorKind::Transport, format!("Request failed: {err}"))
    }

    /// Creates a parse error for an unreadable response body.
    pub fn parse(context: &str, err: &reqwest::Error) -> Self {
        Self::new(ApiErrorKind::Parse, format!("{context}: {err}"))
    }
}

/// Extracts the `detail` field from a JSON error body.
///
/// The upstream service reports errors as `{"detail": "..."}`; validation
/// errors carry a non-string `detail` and fall through to the raw body.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("detail")
        .and_then(Value::as_str)
        .map(std::string::ToString::to_string)
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
