use serde::Serialize;

use super::Feedback;
use crate::context::ServiceContext;
use crate::error::{ApiError, ApiResult};
use crate::models::{Bed, Room};
use crate::resource::{Page, QueryParams, ResourceClient};

pub const ROOMS: &str = "/api/v1/rooms";
pub const BEDS: &str = "/api/v1/beds";

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RoomCreate {
    pub building_id: i64,
    pub room_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub household: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RoomUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub household: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BedCreate {
    pub room_id: i64,
    pub bed_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BedUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Rooms and the beds inside them. Two collections, one loading flag.
pub struct Rooms {
    rooms: ResourceClient<Room>,
    beds: ResourceClient<Bed>,
    feedback: Feedback,
}

impl Rooms {
    pub fn new(ctx: &ServiceContext) -> Self {
        Self {
            rooms: ctx.resource(ROOMS),
            beds: ctx.resource(BEDS),
            feedback: Feedback::new(ctx.notifier().clone(), ctx.messages().clone()),
        }
    }

    pub fn is_loading(&self) -> bool { self.rooms.loading() || self.beds.loading() }

    /// Room errors take precedence over bed errors.
    pub fn error(&self) -> Option<ApiError> { self.rooms.error().or_else(|| self.beds.error()) }

    pub async fn list_rooms(&self, params: &QueryParams) -> ApiResult<Page<Room>> {
        self.rooms.page(params, &self.feedback.t("snackbar.failedToLoadRooms")).await
    }

    pub async fn get_room(&self, id: i64) -> ApiResult<Room> {
        self.rooms.try_get_by_id(&id.to_string(), &self.feedback.t("snackbar.failedToLoadData")).await
    }

    pub async fn create_room(&self, room: &RoomCreate) -> ApiResult<Room> {
        let r = self.rooms.try_create(room, &self.feedback.t("snackbar.failedToSaveRoom")).await;
        self.feedback.confirm("snackbar.roomCreated", r)
    }

    pub async fn update_room(&self, id: i64, room: &RoomUpdate) -> ApiResult<Room> {
        let r = self.rooms.try_update(&id.to_string(), room, &self.feedback.t("snackbar.failedToSaveRoom")).await;
        self.feedback.confirm("snackbar.roomUpdated", r)
    }

    pub async fn delete_room(&self, id: i64) -> ApiResult<()> {
        let r = self.rooms.try_remove(&id.to_string(), &self.feedback.t("snackbar.failedToDeleteRoom")).await;
        self.feedback.confirm("snackbar.roomDeleted", r)
    }

    pub async fn list_beds(&self, params: &QueryParams) -> ApiResult<Page<Bed>> {
        self.beds.page(params, &self.feedback.t("snackbar.failedToLoadBeds")).await
    }

    pub async fn get_bed(&self, id: i64) -> ApiResult<Bed> {
        self.beds.try_get_by_id(&id.to_string(), &self.feedback.t("snackbar.failedToLoadData")).await
    }

    pub async fn create_bed(&self, bed: &BedCreate) -> ApiResult<Bed> {
        let r = self.beds.try_create(bed, &self.feedback.t("snackbar.failedToSaveBed")).await;
        self.feedback.confirm("snackbar.bedCreated", r)
    }

    pub async fn update_bed(&self, id: i64, bed: &BedUpdate) -> ApiResult<Bed> {
        let r = self.beds.try_update(&id.to_string(), bed, &self.feedback.t("snackbar.failedToSaveBed")).await;
        self.feedback.confirm("snackbar.bedUpdated", r)
    }

    pub async fn delete_bed(&self, id: i64) -> ApiResult<()> {
        let r = self.beds.try_remove(&id.to_string(), &self.feedback.t("snackbar.failedToDeleteBed")).await;
        self.feedback.confirm("snackbar.bedDeleted", r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::i18n::{Catalog, Messages};
    use crate::notify::Severity;
    use crate::transport::{MockReply, MockTransport};
    use reqwest::Method;
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (Arc<MockTransport>, ServiceContext) {
        let mut cat = Catalog::new();
        cat.insert("snackbar.bedDeleted", "Bed deleted");
        cat.insert("snackbar.failedToLoadRooms", "Could not load rooms");
        let mock = Arc::new(MockTransport::new());
        let ctx = ServiceContext::with_transport(ClientConfig::default(), mock.clone(), Messages::new(Arc::new(cat)));
        (mock, ctx)
    }

    #[tokio::test]
    async fn room_list_failure_uses_localized_fallback() {
        let (mock, ctx) = setup();
        mock.on(Method::GET, "/api/v1/rooms/", MockReply::Json(500, json!({"error": "db down"})));
        let rooms = ctx.rooms();
        assert!(rooms.list_rooms(&QueryParams::new()).await.is_err());
        assert_eq!(ctx.notifier().current().message, "Could not load rooms");
        assert_eq!(rooms.error().and_then(|e| e.status()), Some(500));
        assert!(!rooms.is_loading());
    }

    #[tokio::test]
    async fn bed_delete_announces_success() {
        let (mock, ctx) = setup();
        mock.on(Method::DELETE, "/api/v1/beds/100", MockReply::Empty(204));
        ctx.rooms().delete_bed(100).await.unwrap();
        let n = ctx.notifier().current();
        assert_eq!((n.message.as_str(), n.severity), ("Bed deleted", Severity::Success));
    }

    #[tokio::test]
    async fn bed_error_surfaces_when_rooms_are_clean() {
        let (mock, ctx) = setup();
        mock.on(Method::GET, "/api/v1/rooms/10", MockReply::Json(200, json!({"id": 10, "building_id": 1, "room_number": "101"})));
        mock.on(Method::GET, "/api/v1/beds/9", MockReply::Json(404, json!({"detail": "Bed not found"})));
        let rooms = ctx.rooms();
        assert_eq!(rooms.get_room(10).await.unwrap().room_number, "101");
        assert!(rooms.get_bed(9).await.is_err());
        assert_eq!(rooms.error().and_then(|e| e.detail().map(str::to_string)), Some("Bed not found".to_string()));
    }
}
