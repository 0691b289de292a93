use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::context::ServiceContext;
use crate::error::{ApiError, ApiResult};
use crate::identity::{SessionManager, SUPER_PERMISSION};
use crate::models::InspectionRecord;
use crate::resource::Page;
use crate::transport::{ApiRequest, Transport};

pub const ADMIN_STATS: &str = "/api/v1/admin/dashboard-stats";
pub const ADMIN_CHARTS: &str = "/api/v1/admin/dashboard-charts";
pub const LATEST_INSPECTION: &str = "/api/v1/inspections";

/// Home page payload, shaped by who is looking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DashboardData {
    /// Statistics object with the chart series merged in under `charts`.
    Admin(Value),
    Student {
        #[serde(rename = "latestInspection")]
        latest_inspection: Option<InspectionRecord>,
    },
}

impl DashboardData {
    pub fn is_admin(&self) -> bool { matches!(self, DashboardData::Admin(_)) }
}

/// Loads the home page data. Never notifies; any failure yields `None`.
pub struct Dashboard {
    session: Arc<SessionManager>,
    transport: Arc<dyn Transport>,
}

impl Dashboard {
    pub fn new(ctx: &ServiceContext) -> Self {
        Self { session: ctx.session().clone(), transport: ctx.transport() }
    }

    pub async fn load(&self) -> Option<DashboardData> {
        if !self.session.is_authenticated() {
            debug!(target: "dashboard", "no session; nothing to load");
            return None;
        }
        let outcome = if self.session.has_permission(SUPER_PERMISSION) {
            self.load_admin().await
        } else {
            self.load_student().await
        };
        match outcome {
            Ok(d) => Some(d),
            Err(e) => {
                warn!(target: "dashboard", kind = e.kind(), "dashboard fetch failed: {}", e);
                None
            }
        }
    }

    async fn load_admin(&self) -> ApiResult<DashboardData> {
        let (stats, charts) = tokio::join!(
            self.get_json(ApiRequest::get(ADMIN_STATS)),
            self.get_json(ApiRequest::get(ADMIN_CHARTS)),
        );
        let mut stats = match stats? {
            Value::Object(m) => m,
            other => return Err(ApiError::decode(format!("dashboard stats is not an object: {}", other))),
        };
        stats.insert("charts".to_string(), charts?);
        Ok(DashboardData::Admin(Value::Object(stats)))
    }

    async fn load_student(&self) -> ApiResult<DashboardData> {
        let req = ApiRequest::get(LATEST_INSPECTION).with_query(vec![("limit".to_string(), "1".to_string())]);
        let page: Page<InspectionRecord> = serde_json::from_value(self.get_json(req).await?)?;
        Ok(DashboardData::Student { latest_inspection: page.records.into_iter().next() })
    }

    async fn get_json(&self, req: ApiRequest) -> ApiResult<Value> {
        Ok(self.transport.send(req).await?.into_result()?.unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::i18n::Messages;
    use crate::transport::{MockReply, MockTransport};
    use reqwest::Method;
    use serde_json::json;

    fn setup(permissions: &[&str]) -> (Arc<MockTransport>, ServiceContext) {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            Method::GET,
            "/api/v1/users/me/",
            MockReply::Json(200, json!({"username": "u", "roles": [], "permissions": permissions})),
        );
        let ctx = ServiceContext::with_transport(ClientConfig::default(), mock.clone(), Messages::default());
        (mock, ctx)
    }

    #[tokio::test]
    async fn anonymous_gets_nothing() {
        let (mock, ctx) = setup(&[]);
        assert_eq!(ctx.dashboard().load().await, None);
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn admin_merges_charts_into_stats() {
        let (mock, ctx) = setup(&[SUPER_PERMISSION]);
        assert!(ctx.session().resolve_identity().await);
        mock.on(Method::GET, ADMIN_STATS, MockReply::Json(200, json!({"total_students": 120, "pending": 4})));
        mock.on(Method::GET, ADMIN_CHARTS, MockReply::Json(200, json!({"by_status": [1, 2, 3]})));
        let data = ctx.dashboard().load().await.unwrap();
        assert!(data.is_admin());
        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            json!({"total_students": 120, "pending": 4, "charts": {"by_status": [1, 2, 3]}})
        );
    }

    #[tokio::test]
    async fn admin_failure_is_silent_none() {
        let (mock, ctx) = setup(&[SUPER_PERMISSION]);
        ctx.session().resolve_identity().await;
        mock.on(Method::GET, ADMIN_STATS, MockReply::Json(200, json!({"total_students": 1})));
        mock.on(Method::GET, ADMIN_CHARTS, MockReply::Json(500, json!({"detail": "boom"})));
        assert_eq!(ctx.dashboard().load().await, None);
        assert_eq!(ctx.notifier().issued(), 0);
    }

    #[tokio::test]
    async fn student_sees_latest_inspection_or_none() {
        let (mock, ctx) = setup(&["inspections:view_own"]);
        ctx.session().resolve_identity().await;
        mock.on(Method::GET, LATEST_INSPECTION, MockReply::Json(200, json!({"total": 0, "records": []})));
        let data = ctx.dashboard().load().await.unwrap();
        assert_eq!(data, DashboardData::Student { latest_inspection: None });
        assert_eq!(serde_json::to_value(&data).unwrap(), json!({"latestInspection": null}));
        let last = mock.requests().pop().unwrap();
        assert_eq!(last.query, vec![("limit".to_string(), "1".to_string())]);
    }
}
