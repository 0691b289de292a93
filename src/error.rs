//! Unified client error model and mapping helpers.
//! Every failure coming back from the REST service, the network, or a local
//! precondition is folded into `ApiError` so the session, resource and
//! notification layers can classify it the same way.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 401: no valid credential. Expected during session bootstrap.
    #[error("not authenticated (HTTP {status})")]
    Unauthenticated { status: u16, detail: Option<String> },
    /// 403: authenticated but lacking a permission.
    #[error("forbidden")]
    Forbidden { detail: Option<String> },
    /// Other 4xx: validation, conflict, not found.
    #[error("request rejected with HTTP {status}")]
    Rejected { status: u16, detail: Option<String> },
    /// 5xx or any status outside the known classes.
    #[error("unexpected response HTTP {status}")]
    Unexpected { status: u16, detail: Option<String> },
    #[error("transport error: {message}")]
    Transport { message: String },
    #[error("invalid response body: {message}")]
    Decode { message: String },
    #[error("{message}")]
    Input { message: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Build an error from a non-success status and the (optional) JSON body.
    pub fn from_status(status: u16, body: Option<&Value>) -> Self {
        let detail = body.and_then(extract_detail);
        match status {
            401 => ApiError::Unauthenticated { status, detail },
            403 => ApiError::Forbidden { detail },
            400..=499 => ApiError::Rejected { status, detail },
            _ => ApiError::Unexpected { status, detail },
        }
    }

    pub fn transport<S: Into<String>>(msg: S) -> Self { ApiError::Transport { message: msg.into() } }
    pub fn decode<S: Into<String>>(msg: S) -> Self { ApiError::Decode { message: msg.into() } }
    pub fn input<S: Into<String>>(msg: S) -> Self { ApiError::Input { message: msg.into() } }

    /// Stable snake_case code, usable in logs and test assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated { .. } => "unauthenticated",
            ApiError::Forbidden { .. } => "forbidden",
            ApiError::Rejected { .. } => "rejected",
            ApiError::Unexpected { .. } => "unexpected",
            ApiError::Transport { .. } => "transport",
            ApiError::Decode { .. } => "decode",
            ApiError::Input { .. } => "input",
        }
    }

    /// HTTP status as received, when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthenticated { status, .. }
            | ApiError::Rejected { status, .. }
            | ApiError::Unexpected { status, .. } => Some(*status),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::Transport { .. } | ApiError::Decode { .. } | ApiError::Input { .. } => None,
        }
    }

    /// Map to an HTTP-equivalent status, synthesizing one for local failures.
    pub fn http_status(&self) -> u16 {
        match self {
            ApiError::Transport { .. } => 503,
            ApiError::Decode { .. } => 502,
            ApiError::Input { .. } => 400,
            other => other.status().unwrap_or(500),
        }
    }

    /// Server-supplied `detail`, if the response carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Unauthenticated { detail, .. }
            | ApiError::Forbidden { detail }
            | ApiError::Rejected { detail, .. }
            | ApiError::Unexpected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn is_unauthenticated(&self) -> bool { matches!(self, ApiError::Unauthenticated { .. }) }

    /// Text shown to the user: server detail first, then our own message for
    /// failures that have a meaningful one, then the caller's fallback.
    pub fn display_message(&self, fallback: &str) -> String {
        if let Some(d) = self.detail() {
            return d.to_string();
        }
        match self {
            ApiError::Transport { .. }
            | ApiError::Input { .. }
            | ApiError::Rejected { .. }
            | ApiError::Unauthenticated { .. } => self.to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Pull a human-readable `detail` out of an error payload.
/// Strings are taken verbatim; validation lists (`[{msg: ..}, ..]`) are joined.
pub fn extract_detail(body: &Value) -> Option<String> {
    let detail = body.get("detail")?;
    match detail {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|it| match it.get("msg").and_then(|m| m.as_str()) {
                    Some(m) => m.to_string(),
                    None => it.as_str().map(str::to_string).unwrap_or_else(|| it.to_string()),
                })
                .collect();
            if parts.is_empty() { None } else { Some(parts.join("; ")) }
        }
        other => Some(other.to_string()),
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::decode(err.to_string())
        } else {
            ApiError::transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self { ApiError::decode(err.to_string()) }
}
