use reqwest::Method;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use super::Feedback;
use crate::context::ServiceContext;
use crate::error::{ApiError, ApiResult};
use crate::models::InspectionItem;
use crate::resource::{Page, QueryParams, ResourceClient};

pub const ENDPOINT: &str = "/api/v1/items";

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct InspectionItemCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_en: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct InspectionItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Checklist items inspected in every room.
pub struct Items {
    crud: ResourceClient<InspectionItem>,
    feedback: Feedback,
}

impl Items {
    pub fn new(ctx: &ServiceContext) -> Self {
        Self {
            crud: ctx.resource(ENDPOINT),
            feedback: Feedback::new(ctx.notifier().clone(), ctx.messages().clone()),
        }
    }

    pub fn is_loading(&self) -> bool { self.crud.loading() }
    pub fn error(&self) -> Option<ApiError> { self.crud.error() }

    pub async fn list(&self, params: &QueryParams) -> ApiResult<Page<InspectionItem>> {
        self.crud.page(params, &self.feedback.t("snackbar.failedToLoadItems")).await
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<InspectionItem> {
        self.crud.try_get_by_id(&id.to_string(), &self.feedback.t("snackbar.failedToLoadData")).await
    }

    pub async fn create(&self, item: &InspectionItemCreate) -> ApiResult<InspectionItem> {
        let r = self.crud.try_create(item, &self.feedback.t("snackbar.failedToSaveItem")).await;
        self.feedback.confirm("snackbar.itemCreated", r)
    }

    pub async fn update(&self, id: Uuid, item: &InspectionItemUpdate) -> ApiResult<InspectionItem> {
        let r = self.crud.try_update(&id.to_string(), item, &self.feedback.t("snackbar.failedToSaveItem")).await;
        self.feedback.confirm("snackbar.itemUpdated", r)
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        let r = self.crud.try_remove(&id.to_string(), &self.feedback.t("snackbar.failedToDeleteItem")).await;
        self.feedback.confirm("snackbar.itemDeleted", r)
    }

    /// Activate or deactivate several items at once; returns the updated items.
    pub async fn batch_update_status(&self, ids: &[Uuid], is_active: bool) -> ApiResult<Vec<InspectionItem>> {
        let body = json!({ "item_ids": ids, "is_active": is_active });
        let r = self
            .crud
            .call(Method::PUT, "batch-update-status", &body, &self.feedback.t("snackbar.batchUpdateItemStatusFailed"))
            .await;
        self.feedback.confirm("snackbar.batchUpdateItemStatusSuccess", r)
    }
}
