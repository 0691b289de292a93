//! Request/response plumbing between the client core and the REST service.
//!
//! A `Transport` only moves bytes: HTTP status codes never become `Err` at this
//! layer. `ApiResponse::classify` is the single place that decides whether a
//! response counts as content, as "no content", or as a failure.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

pub mod http;
pub mod mock;

pub use http::HttpTransport;
pub use mock::{MockReply, MockTransport};

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new<S: Into<String>>(method: Method, path: S) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: RequestBody::Empty }
    }

    pub fn get<S: Into<String>>(path: S) -> Self { Self::new(Method::GET, path) }
    pub fn post<S: Into<String>>(path: S) -> Self { Self::new(Method::POST, path) }
    pub fn put<S: Into<String>>(path: S) -> Self { Self::new(Method::PUT, path) }
    pub fn delete<S: Into<String>>(path: S) -> Self { Self::new(Method::DELETE, path) }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// `None` when the body was empty. Non-JSON text is kept as a JSON string.
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseClass {
    Content(Value),
    NoContent,
    Failure(ApiError),
}

impl ApiResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self { Self { status, body } }

    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }

    pub fn classify(self) -> ResponseClass {
        if !self.is_success() {
            return ResponseClass::Failure(ApiError::from_status(self.status, self.body.as_ref()));
        }
        match (self.status, self.body) {
            (204 | 205, _) | (_, None) => ResponseClass::NoContent,
            (_, Some(v)) => ResponseClass::Content(v),
        }
    }

    /// Collapse into a result, treating "no content" as `Ok(None)`.
    pub fn into_result(self) -> ApiResult<Option<Value>> {
        match self.classify() {
            ResponseClass::Content(v) => Ok(Some(v)),
            ResponseClass::NoContent => Ok(None),
            ResponseClass::Failure(e) => Err(e),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. `Err` means the exchange itself failed (network,
    /// timeout); any HTTP status comes back as `Ok`.
    async fn send(&self, req: ApiRequest) -> ApiResult<ApiResponse>;
}

/// Decode raw response text: empty -> `None`, JSON -> value, anything else -> string.
pub(crate) fn decode_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_by_status() {
        assert_eq!(ApiResponse::new(204, None).classify(), ResponseClass::NoContent);
        assert_eq!(ApiResponse::new(204, Some(json!({"x": 1}))).classify(), ResponseClass::NoContent);
        assert_eq!(ApiResponse::new(200, None).classify(), ResponseClass::NoContent);
        assert_eq!(ApiResponse::new(200, Some(json!(false))).classify(), ResponseClass::Content(json!(false)));
        match ApiResponse::new(404, Some(json!({"detail": "not found"}))).classify() {
            ResponseClass::Failure(e) => assert_eq!(e.detail(), Some("not found")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn body_decoding() {
        assert_eq!(decode_body(""), None);
        assert_eq!(decode_body("  \n"), None);
        assert_eq!(decode_body("{\"a\":1}"), Some(json!({"a": 1})));
        assert_eq!(decode_body("Internal Server Error"), Some(json!("Internal Server Error")));
    }
}
