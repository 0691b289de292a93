//! Generic resource client: one instance per REST collection.
//!
//! Every call marks the instance as loading and clears its last error before
//! the request goes out. A failure is recorded, surfaced as exactly one error
//! notification, and then either collapsed into a sentinel (`get_all`,
//! `get_by_id`, `create`, `update`, `remove`) or returned as `Err` from the
//! `try_*` and helper methods so domain code can abort a multi-step flow.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::notify::Notifier;
use crate::transport::{ApiRequest, Transport};

mod query;

pub use query::QueryParams;

/// Fallback notification text when a failure carries no usable message.
pub const GENERIC_FAILURE: &str = "Operation failed";

/// `{total, records}` envelope returned by paginated collection endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: u64,
    pub records: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self { Self { total: 0, records: Vec::new() } }
}

/// Loading/error cell of one client instance.
///
/// `loading` is derived from an in-flight counter, so overlapping calls on
/// the same instance keep it set until the last one settles. `error` holds
/// the most recent failure until the next call starts.
#[derive(Debug, Default)]
pub struct RequestState {
    in_flight: AtomicUsize,
    error: Mutex<Option<ApiError>>,
}

impl RequestState {
    pub fn loading(&self) -> bool { self.in_flight.load(Ordering::SeqCst) > 0 }

    pub fn in_flight(&self) -> usize { self.in_flight.load(Ordering::SeqCst) }

    pub fn error(&self) -> Option<ApiError> { self.error.lock().clone() }

    fn begin(self: &Arc<Self>) -> InFlight {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        *self.error.lock() = None;
        InFlight { state: self.clone() }
    }

    fn record(&self, err: &ApiError) { *self.error.lock() = Some(err.clone()); }
}

/// Decrements the in-flight counter when the request settles, however it ends.
struct InFlight {
    state: Arc<RequestState>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct ResourceClient<T> {
    endpoint: String,
    transport: Arc<dyn Transport>,
    notifier: Notifier,
    state: Arc<RequestState>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            transport: self.transport.clone(),
            notifier: self.notifier.clone(),
            state: self.state.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> ResourceClient<T> {
    pub fn new<S: Into<String>>(endpoint: S, transport: Arc<dyn Transport>, notifier: Notifier) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self { endpoint, transport, notifier, state: Arc::new(RequestState::default()), _entity: PhantomData }
    }

    pub fn endpoint(&self) -> &str { &self.endpoint }

    pub fn state(&self) -> &RequestState { &self.state }

    pub fn loading(&self) -> bool { self.state.loading() }

    pub fn error(&self) -> Option<ApiError> { self.state.error() }

    pub fn notifier(&self) -> &Notifier { &self.notifier }

    /// `endpoint/{id}` with the id percent-encoded.
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.endpoint, urlencoding::encode(id))
    }

    /// `endpoint/{suffix}` for custom actions; the suffix is used verbatim.
    pub fn sub_path(&self, suffix: &str) -> String {
        format!("{}/{}", self.endpoint, suffix.trim_start_matches('/'))
    }

    // --- sentinel-returning operations ---

    pub async fn get_all(&self, params: Option<&QueryParams>) -> Vec<T> {
        self.try_get_all(params).await.unwrap_or_default()
    }

    pub async fn get_by_id(&self, id: &str) -> Option<T> {
        self.try_get_by_id(id, GENERIC_FAILURE).await.ok()
    }

    pub async fn create<B: Serialize + ?Sized>(&self, item: &B) -> Option<T> {
        self.try_create(item, GENERIC_FAILURE).await.ok()
    }

    pub async fn update<B: Serialize + ?Sized>(&self, id: &str, item: &B) -> Option<T> {
        self.try_update(id, item, GENERIC_FAILURE).await.ok()
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.try_remove(id, GENERIC_FAILURE).await.is_ok()
    }

    // --- fallible counterparts; failures are already recorded and notified ---

    pub async fn try_get_all(&self, params: Option<&QueryParams>) -> ApiResult<Vec<T>> {
        let query = params.cloned().unwrap_or_default().into_pairs();
        let req = ApiRequest::get(self.endpoint.as_str()).with_query(query);
        Ok(self.execute::<Vec<T>>(req, GENERIC_FAILURE).await?.unwrap_or_default())
    }

    pub async fn try_get_by_id(&self, id: &str, fallback: &str) -> ApiResult<T> {
        self.fetch(ApiRequest::get(self.item_path(id)), fallback).await
    }

    pub async fn try_create<B: Serialize + ?Sized>(&self, item: &B, fallback: &str) -> ApiResult<T> {
        let req = self.encode(ApiRequest::post(self.endpoint.as_str()), item)?;
        self.fetch(req, fallback).await
    }

    pub async fn try_update<B: Serialize + ?Sized>(&self, id: &str, item: &B, fallback: &str) -> ApiResult<T> {
        let req = self.encode(ApiRequest::put(self.item_path(id)), item)?;
        self.fetch(req, fallback).await
    }

    /// Any 2xx counts as deleted, with or without a body.
    pub async fn try_remove(&self, id: &str, fallback: &str) -> ApiResult<()> {
        self.execute::<Value>(ApiRequest::delete(self.item_path(id)), fallback).await?;
        Ok(())
    }

    /// Paginated listing via the trailing-slash collection URL.
    pub async fn page(&self, params: &QueryParams, fallback: &str) -> ApiResult<Page<T>> {
        let req = ApiRequest::get(format!("{}/", self.endpoint)).with_query(params.clone().into_pairs());
        self.fetch(req, fallback).await
    }

    /// GET a custom sub-path decoding into `R`.
    pub async fn fetch_path<R: DeserializeOwned>(&self, suffix: &str, params: &QueryParams, fallback: &str) -> ApiResult<R> {
        let req = ApiRequest::get(self.sub_path(suffix)).with_query(params.clone().into_pairs());
        self.fetch(req, fallback).await
    }

    /// Send a custom action with a JSON body; `Ok(None)` when the service
    /// answers without content.
    pub async fn send_action<B, R>(&self, method: Method, suffix: &str, body: &B, fallback: &str) -> ApiResult<Option<R>>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let req = self.encode(ApiRequest::new(method, self.sub_path(suffix)), body)?;
        self.execute(req, fallback).await
    }

    /// Like `send_action`, but an empty answer is a failure.
    pub async fn call<B, R>(&self, method: Method, suffix: &str, body: &B, fallback: &str) -> ApiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let req = self.encode(ApiRequest::new(method, self.sub_path(suffix)), body)?;
        self.fetch(req, fallback).await
    }

    /// Record and notify a failure that happened before any request was sent.
    pub fn reject(&self, err: ApiError, fallback: &str) -> ApiError {
        let _flight = self.state.begin();
        self.fail(err, fallback)
    }

    // --- engine ---

    fn encode<B: Serialize + ?Sized>(&self, req: ApiRequest, body: &B) -> ApiResult<ApiRequest> {
        req.with_json(body).map_err(|e| self.reject(e, GENERIC_FAILURE))
    }

    async fn fetch<R: DeserializeOwned>(&self, req: ApiRequest, fallback: &str) -> ApiResult<R> {
        let path = req.path.clone();
        match self.execute::<R>(req, fallback).await? {
            Some(v) => Ok(v),
            None => Err(self.fail(ApiError::decode(format!("{} returned no content", path)), fallback)),
        }
    }

    async fn execute<R: DeserializeOwned>(&self, req: ApiRequest, fallback: &str) -> ApiResult<Option<R>> {
        let _flight = self.state.begin();
        let method = req.method.clone();
        let path = req.path.clone();
        let outcome = match self.transport.send(req).await {
            Ok(resp) => resp.into_result(),
            Err(e) => Err(e),
        };
        let decoded = outcome.and_then(|body| match body {
            Some(v) => serde_json::from_value::<R>(v).map(Some).map_err(ApiError::from),
            None => Ok(None),
        });
        decoded.map_err(|e| {
            warn!(target: "resource", %method, path = %path, kind = e.kind(), "request failed: {}", e);
            self.fail(e, fallback)
        })
    }

    fn fail(&self, err: ApiError, fallback: &str) -> ApiError {
        self.state.record(&err);
        self.notifier.error(err.display_message(fallback));
        err
    }
}

impl<T> std::fmt::Debug for ResourceClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceClient")
            .field("endpoint", &self.endpoint)
            .field("in_flight", &self.state.in_flight())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Severity;
    use crate::transport::{MockReply, MockTransport, RequestBody};
    use serde_json::json;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Room {
        id: u32,
        room_number: String,
    }

    fn client() -> (Arc<MockTransport>, Notifier, ResourceClient<Room>) {
        let mock = Arc::new(MockTransport::new());
        let notifier = Notifier::default();
        let c = ResourceClient::new("/api/v1/rooms", mock.clone(), notifier.clone());
        (mock, notifier, c)
    }

    #[tokio::test]
    async fn get_by_id_404_returns_none_and_notifies_detail() {
        let (mock, notifier, rooms) = client();
        mock.on(Method::GET, "/api/v1/rooms/42", MockReply::Json(404, json!({"detail": "not found"})));
        assert_eq!(rooms.get_by_id("42").await, None);
        let n = notifier.current();
        assert_eq!(n.message, "not found");
        assert_eq!(n.severity, Severity::Error);
        assert!(n.visible);
        assert_eq!(rooms.error().and_then(|e| e.status()), Some(404));
        assert!(!rooms.loading());
    }

    #[tokio::test]
    async fn remove_no_content_is_success() {
        let (mock, notifier, rooms) = client();
        mock.on(Method::DELETE, "/api/v1/rooms/7", MockReply::Empty(204));
        assert!(rooms.remove("7").await);
        assert_eq!(notifier.issued(), 0);
        assert!(rooms.error().is_none());

        // a body on delete is still a success
        mock.on(Method::DELETE, "/api/v1/rooms/8", MockReply::Json(200, json!({"id": 8, "room_number": "101"})));
        assert!(rooms.remove("8").await);
    }

    #[tokio::test]
    async fn remove_transport_failure_is_false_with_one_notification() {
        let (mock, notifier, rooms) = client();
        mock.on(Method::DELETE, "/api/v1/rooms/7", MockReply::Fail("connection refused".into()));
        assert!(!rooms.remove("7").await);
        assert_eq!(notifier.issued(), 1);
        assert_eq!(notifier.current().severity, Severity::Error);
        assert_eq!(rooms.error().map(|e| e.kind()), Some("transport"));
    }

    #[tokio::test]
    async fn get_all_failure_yields_empty_and_next_call_clears_error() {
        let (mock, notifier, rooms) = client();
        mock.on(Method::GET, "/api/v1/rooms", MockReply::Json(500, json!("boom")))
            .on(Method::GET, "/api/v1/rooms", MockReply::Json(200, json!([{"id": 1, "room_number": "101"}])));
        assert!(rooms.get_all(None).await.is_empty());
        assert_eq!(notifier.current().message, GENERIC_FAILURE);
        assert!(rooms.error().is_some());

        let q = QueryParams::new().push("building_id", 3);
        let all = rooms.get_all(Some(&q)).await;
        assert_eq!(all, vec![Room { id: 1, room_number: "101".into() }]);
        assert!(rooms.error().is_none());
        assert_eq!(mock.requests()[1].query, vec![("building_id".to_string(), "3".to_string())]);
    }

    #[tokio::test]
    async fn create_and_update_send_json() {
        let (mock, _n, rooms) = client();
        mock.on(Method::POST, "/api/v1/rooms", MockReply::Json(201, json!({"id": 5, "room_number": "202"})));
        mock.on(Method::PUT, "/api/v1/rooms/5", MockReply::Json(200, json!({"id": 5, "room_number": "203"})));
        let created = rooms.create(&json!({"room_number": "202", "building_id": 1})).await.unwrap();
        assert_eq!(created.id, 5);
        let updated = rooms.update("5", &json!({"room_number": "203"})).await.unwrap();
        assert_eq!(updated.room_number, "203");
        assert_eq!(mock.requests()[0].body, RequestBody::Json(json!({"room_number": "202", "building_id": 1})));
    }

    #[tokio::test]
    async fn wrong_shape_is_a_notified_decode_failure() {
        let (mock, notifier, rooms) = client();
        mock.on(Method::GET, "/api/v1/rooms/1", MockReply::Json(200, json!({"unexpected": true})));
        assert!(rooms.get_by_id("1").await.is_none());
        assert_eq!(rooms.error().map(|e| e.kind()), Some("decode"));
        assert_eq!(notifier.current().message, GENERIC_FAILURE);
    }

    #[tokio::test]
    async fn ids_are_percent_encoded() {
        let (_mock, _n, rooms) = client();
        assert_eq!(rooms.item_path("a/b c"), "/api/v1/rooms/a%2Fb%20c");
        assert_eq!(rooms.sub_path("/full-tree/"), "/api/v1/rooms/full-tree/");
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_calls_keep_loading_until_last_settles() {
        let (mock, _n, rooms) = client();
        mock.set_latency(Some(Duration::from_millis(100)));
        mock.on(Method::GET, "/api/v1/rooms/1", MockReply::Json(200, json!({"id": 1, "room_number": "101"})));

        let slow = rooms.clone();
        let first = tokio::spawn(async move { slow.get_by_id("1").await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        let fast = rooms.clone();
        let second = tokio::spawn(async move { fast.get_by_id("1").await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(rooms.state().in_flight(), 2);

        assert!(first.await.unwrap().is_some());
        // the first call settled; the second is still out
        assert!(rooms.loading());
        assert!(second.await.unwrap().is_some());
        assert!(!rooms.loading());
    }
}
