//! Search-as-you-type over students, rooms and inspection records.
//!
//! `set_query` restarts a debounce window; only the last query typed within
//! it reaches the service. Errors stay on the search box and are not pushed
//! to the notifier.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::context::ServiceContext;
use crate::error::{ApiError, ApiResult};
use crate::transport::{ApiRequest, Transport};

pub const ENDPOINT: &str = "/api/v1/search/";

/// Shown when the service gives no reason.
pub const SEARCH_FAILED: &str = "Failed to perform search.";

const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    /// `student`, `room` or `inspection`.
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    results: Vec<SearchResultItem>,
}

#[derive(Debug, Default)]
struct SearchState {
    query: Mutex<String>,
    results: Mutex<Vec<SearchResultItem>>,
    error: Mutex<Option<String>>,
    in_flight: AtomicUsize,
}

struct Busy<'a>(&'a AtomicUsize);

impl<'a> Busy<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Busy(counter)
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) { self.0.fetch_sub(1, Ordering::SeqCst); }
}

pub struct GlobalSearch {
    transport: Arc<dyn Transport>,
    debounce: Duration,
    state: Arc<SearchState>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl GlobalSearch {
    pub fn new(ctx: &ServiceContext) -> Self {
        Self::with_debounce(ctx.transport(), ctx.config().search_debounce)
    }

    pub fn with_debounce(transport: Arc<dyn Transport>, debounce: Duration) -> Self {
        Self { transport, debounce, state: Arc::new(SearchState::default()), pending: Mutex::new(None) }
    }

    pub fn query(&self) -> String { self.state.query.lock().clone() }
    pub fn results(&self) -> Vec<SearchResultItem> { self.state.results.lock().clone() }
    pub fn error(&self) -> Option<String> { self.state.error.lock().clone() }
    pub fn is_loading(&self) -> bool { self.state.in_flight.load(Ordering::SeqCst) > 0 }
    pub fn is_pending(&self) -> bool { self.pending.lock().as_ref().is_some_and(|h| !h.is_finished()) }

    /// Record a new query and (re)start the debounce window. Must be called
    /// inside a tokio runtime. Queries shorter than two characters clear the
    /// results right away.
    pub fn set_query<S: Into<String>>(&self, query: S) {
        let query = query.into();
        *self.state.query.lock() = query.clone();
        let mut pending = self.pending.lock();
        if let Some(prev) = pending.take() {
            prev.abort();
        }
        let trimmed = query.trim().to_string();
        if trimmed.chars().count() < MIN_QUERY_CHARS {
            self.state.results.lock().clear();
            *self.state.error.lock() = None;
            return;
        }
        let transport = self.transport.clone();
        let state = self.state.clone();
        let debounce = self.debounce;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            run(transport.as_ref(), &state, &trimmed).await;
        }));
    }

    /// Wait for the scheduled search, if any, to finish.
    pub async fn settle(&self) {
        let handle = self.pending.lock().take();
        if let Some(h) = handle {
            let _ = h.await;
        }
    }

    /// Search immediately, bypassing the debounce window.
    pub async fn search_now(&self, query: &str) -> ApiResult<Vec<SearchResultItem>> {
        if let Some(prev) = self.pending.lock().take() {
            prev.abort();
        }
        *self.state.query.lock() = query.to_string();
        let trimmed = query.trim();
        if trimmed.chars().count() < MIN_QUERY_CHARS {
            self.state.results.lock().clear();
            *self.state.error.lock() = None;
            return Ok(Vec::new());
        }
        let _busy = Busy::enter(&self.state.in_flight);
        let outcome = fetch(self.transport.as_ref(), trimmed).await;
        apply(&self.state, &outcome);
        outcome
    }
}

impl Drop for GlobalSearch {
    fn drop(&mut self) {
        if let Some(h) = self.pending.lock().take() {
            h.abort();
        }
    }
}

impl std::fmt::Debug for GlobalSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalSearch")
            .field("query", &self.query())
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

async fn run(transport: &dyn Transport, state: &SearchState, query: &str) {
    let _busy = Busy::enter(&state.in_flight);
    *state.error.lock() = None;
    let outcome = fetch(transport, query).await;
    apply(state, &outcome);
}

async fn fetch(transport: &dyn Transport, query: &str) -> ApiResult<Vec<SearchResultItem>> {
    debug!(target: "search", query, "global search");
    let req = ApiRequest::post(ENDPOINT).with_json(&json!({ "query": query }))?;
    let body = transport.send(req).await?.into_result()?;
    match body {
        Some(v) => Ok(serde_json::from_value::<SearchResults>(v)?.results),
        None => Ok(Vec::new()),
    }
}

fn apply(state: &SearchState, outcome: &ApiResult<Vec<SearchResultItem>>) {
    match outcome {
        Ok(items) => {
            *state.results.lock() = items.clone();
            *state.error.lock() = None;
        }
        Err(e) => {
            warn!(target: "search", kind = e.kind(), "search failed: {}", e);
            state.results.lock().clear();
            *state.error.lock() = Some(search_error_text(e));
        }
    }
}

fn search_error_text(e: &ApiError) -> String {
    e.detail().map(str::to_string).unwrap_or_else(|| SEARCH_FAILED.to_string())
}
