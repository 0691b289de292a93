use serde::Serialize;
use uuid::Uuid;

use super::Feedback;
use crate::context::ServiceContext;
use crate::error::{ApiError, ApiResult};
use crate::models::{Announcement, TagType};
use crate::resource::{Page, QueryParams, ResourceClient};

pub const ENDPOINT: &str = "/api/v1/announcements";

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AnnouncementCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_en: Option<String>,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_type: Option<TagType>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AnnouncementUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_type: Option<TagType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Notice board. Reading is public; writes need an administrator session.
pub struct Announcements {
    crud: ResourceClient<Announcement>,
    feedback: Feedback,
}

impl Announcements {
    pub fn new(ctx: &ServiceContext) -> Self {
        Self {
            crud: ctx.resource(ENDPOINT),
            feedback: Feedback::new(ctx.notifier().clone(), ctx.messages().clone()),
        }
    }

    pub fn is_loading(&self) -> bool { self.crud.loading() }
    pub fn error(&self) -> Option<ApiError> { self.crud.error() }

    pub async fn list(&self, skip: u32, limit: u32) -> ApiResult<Page<Announcement>> {
        let q = QueryParams::new().push("skip", skip).push("limit", limit);
        self.crud.page(&q, &self.feedback.t("snackbar.failedToLoadData")).await
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<Announcement> {
        self.crud.try_get_by_id(&id.to_string(), &self.feedback.t("snackbar.failedToLoadData")).await
    }

    pub async fn create(&self, a: &AnnouncementCreate) -> ApiResult<Announcement> {
        let r = self.crud.try_create(a, &self.feedback.t("snackbar.failedToSaveAnnouncement")).await;
        self.feedback.confirm("snackbar.announcementCreated", r)
    }

    pub async fn update(&self, id: Uuid, a: &AnnouncementUpdate) -> ApiResult<Announcement> {
        let r = self.crud.try_update(&id.to_string(), a, &self.feedback.t("snackbar.failedToSaveAnnouncement")).await;
        self.feedback.confirm("snackbar.announcementUpdated", r)
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        let r = self.crud.try_remove(&id.to_string(), &self.feedback.t("snackbar.failedToDeleteAnnouncement")).await;
        self.feedback.confirm("snackbar.announcementDeleted", r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::i18n::Messages;
    use crate::transport::{MockReply, MockTransport, RequestBody};
    use reqwest::Method;
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (Arc<MockTransport>, ServiceContext) {
        let mock = Arc::new(MockTransport::new());
        let ctx = ServiceContext::with_transport(ClientConfig::default(), mock.clone(), Messages::default());
        (mock, ctx)
    }

    #[tokio::test]
    async fn list_pages_with_skip_and_limit() {
        let (mock, ctx) = setup();
        mock.on(
            Method::GET,
            "/api/v1/announcements/",
            MockReply::Json(200, json!({"total": 11, "records": [{
                "id": Uuid::nil(), "title": "Fire drill", "content": "Friday 10:00", "tag": "safety",
                "tag_type": "warning", "created_at": "2024-05-01T08:00:00", "updated_at": "2024-05-01T08:00:00"
            }]})),
        );
        let page = ctx.announcements().list(10, 10).await.unwrap();
        assert_eq!(page.total, 11);
        assert_eq!(page.records[0].tag_type, TagType::Warning);
        assert_eq!(
            mock.requests()[0].query,
            vec![("skip".to_string(), "10".to_string()), ("limit".to_string(), "10".to_string())]
        );
    }

    #[tokio::test]
    async fn create_sends_tag_type_lowercase() {
        let (mock, ctx) = setup();
        mock.on(
            Method::POST,
            ENDPOINT,
            MockReply::Json(201, json!({
                "id": Uuid::nil(), "title": "t", "content": "c", "tag": "notice", "tag_type": "danger",
                "created_at": "2024-05-01T08:00:00Z", "updated_at": "2024-05-01T08:00:00Z"
            })),
        );
        let a = AnnouncementCreate {
            title: "t".into(),
            content: "c".into(),
            tag: "notice".into(),
            tag_type: Some(TagType::Danger),
            ..Default::default()
        };
        ctx.announcements().create(&a).await.unwrap();
        assert_eq!(
            mock.requests()[0].body,
            RequestBody::Json(json!({"title": "t", "content": "c", "tag": "notice", "tag_type": "danger"}))
        );
    }

    #[tokio::test]
    async fn delete_requires_session() {
        let (mock, ctx) = setup();
        mock.on(Method::DELETE, &format!("{}/{}", ENDPOINT, Uuid::nil()), MockReply::Json(401, json!({"detail": "Not authenticated"})));
        let err = ctx.announcements().delete(Uuid::nil()).await.unwrap_err();
        assert!(err.is_unauthenticated());
        assert_eq!(ctx.notifier().current().message, "Not authenticated");
    }
}
