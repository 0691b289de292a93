//! Scripted in-memory transport. Used by the unit tests and handy for wiring
//! a `ServiceContext` without a running service.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Method;
use serde_json::Value;

use super::{ApiRequest, ApiResponse, Transport};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    Json(u16, Value),
    Empty(u16),
    /// Simulated network failure.
    Fail(String),
}

#[derive(Debug)]
struct Script {
    method: Method,
    path: String,
    replies: VecDeque<MockReply>,
}

#[derive(Debug, Default)]
pub struct MockTransport {
    scripts: Mutex<Vec<Script>>,
    log: Mutex<Vec<ApiRequest>>,
    latency: Mutex<Option<Duration>>,
}

impl MockTransport {
    pub fn new() -> Self { Self::default() }

    /// Queue a reply for `method path` (query string excluded). Replies are
    /// consumed in order; the last one keeps answering.
    pub fn on(&self, method: Method, path: &str, reply: MockReply) -> &Self {
        let mut scripts = self.scripts.lock();
        match scripts.iter_mut().find(|s| s.method == method && s.path == path) {
            Some(s) => s.replies.push_back(reply),
            None => scripts.push(Script { method, path: path.to_string(), replies: VecDeque::from([reply]) }),
        }
        self
    }

    /// Drop everything queued for `method path`.
    pub fn clear(&self, method: &Method, path: &str) {
        self.scripts.lock().retain(|s| !(s.method == *method && s.path == path));
    }

    /// Delay every reply by `d` (measured on the tokio clock).
    pub fn set_latency(&self, d: Option<Duration>) { *self.latency.lock() = d; }

    pub fn requests(&self) -> Vec<ApiRequest> { self.log.lock().clone() }

    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.log.lock().iter().filter(|r| r.method == *method && r.path == path).count()
    }

    fn next_reply(&self, method: &Method, path: &str) -> MockReply {
        let mut scripts = self.scripts.lock();
        let Some(s) = scripts.iter_mut().find(|s| s.method == *method && s.path == path) else {
            return MockReply::Json(404, serde_json::json!({"detail": format!("no mock for {} {}", method, path)}));
        };
        if s.replies.len() > 1 {
            s.replies.pop_front().unwrap_or(MockReply::Empty(500))
        } else {
            s.replies.front().cloned().unwrap_or(MockReply::Empty(500))
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, req: ApiRequest) -> ApiResult<ApiResponse> {
        let reply = self.next_reply(&req.method, &req.path);
        self.log.lock().push(req);
        let latency = *self.latency.lock();
        if let Some(d) = latency {
            tokio::time::sleep(d).await;
        }
        match reply {
            MockReply::Json(status, v) => Ok(ApiResponse::new(status, Some(v))),
            MockReply::Empty(status) => Ok(ApiResponse::new(status, None)),
            MockReply::Fail(msg) => Err(ApiError::transport(msg)),
        }
    }
}
