use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use super::{decode_body, ApiRequest, ApiResponse, RequestBody, Transport};
use crate::error::{ApiError, ApiResult};

/// HTTP transport with a cookie jar. The service sets its session cookie on
/// login and clears it on logout; the jar replays it on every request, so no
/// code here ever looks at the credential.
#[derive(Clone)]
pub struct HttpTransport {
    base: Url,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base: &str, timeout: Duration) -> ApiResult<Self> {
        let mut base = Url::parse(base).map_err(|e| ApiError::input(format!("invalid base URL '{}': {}", base, e)))?;
        // A base path is a directory prefix; without the slash `join` would replace its last segment.
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self { base, client })
    }

    pub fn base(&self) -> &Url { &self.base }

    fn url_for(&self, path: &str) -> ApiResult<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::input(format!("invalid request path '{}': {}", path, e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, req: ApiRequest) -> ApiResult<ApiResponse> {
        let url = self.url_for(&req.path)?;
        debug!(target: "transport", method = %req.method, url = %url, "send");
        let mut builder = self.client.request(req.method.clone(), url);
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        builder = match &req.body {
            RequestBody::Empty => builder,
            RequestBody::Json(v) => builder.json(v),
            RequestBody::Form(fields) => builder.form(fields),
        };
        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        debug!(target: "transport", status, bytes = text.len(), "recv");
        Ok(ApiResponse::new(status, decode_body(&text)))
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").field("base", &self.base.as_str()).finish()
    }
}
