use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use super::Feedback;
use crate::context::ServiceContext;
use crate::error::{ApiError, ApiResult};
use crate::models::{InspectionRecord, InspectionStatus, ItemStatus};
use crate::resource::{Page, QueryParams, ResourceClient};

pub const ENDPOINT: &str = "/api/v1/inspections";

/// A photo attached to one checklist line, as base64 file content.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PhotoUpload {
    pub file_content: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetailCreate {
    pub item_id: Uuid,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<PhotoUpload>,
}

/// `student_id`/`room_id` may be omitted; the service then derives them from
/// the submitting student's account.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct InspectionCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<i64>,
    pub details: Vec<DetailCreate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_base64: Option<String>,
}

/// Filters for `/inspections/search`. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SearchParams {
    pub student_name: Option<String>,
    pub room_number: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<InspectionStatus>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

pub struct Inspections {
    crud: ResourceClient<InspectionRecord>,
    feedback: Feedback,
}

impl Inspections {
    pub fn new(ctx: &ServiceContext) -> Self {
        Self {
            crud: ctx.resource(ENDPOINT),
            feedback: Feedback::new(ctx.notifier().clone(), ctx.messages().clone()),
        }
    }

    pub fn is_loading(&self) -> bool { self.crud.loading() }
    pub fn error(&self) -> Option<ApiError> { self.crud.error() }

    pub async fn list(&self, params: &QueryParams) -> ApiResult<Page<InspectionRecord>> {
        self.crud.page(params, &self.feedback.t("snackbar.failedToLoadInspections")).await
    }

    pub async fn search(&self, params: &SearchParams) -> ApiResult<Page<InspectionRecord>> {
        let fallback = self.feedback.t("snackbar.failedToFetchRecords");
        let query = QueryParams::from_serialize(params).map_err(|e| self.crud.reject(e, &fallback))?;
        self.crud.fetch_path("search", &query, &fallback).await
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<InspectionRecord> {
        self.crud.try_get_by_id(&id.to_string(), &self.feedback.t("snackbar.failedToLoadRecord")).await
    }

    pub async fn create(&self, inspection: &InspectionCreate) -> ApiResult<InspectionRecord> {
        debug!(target: "inspections", details = inspection.details.len(), "submitting inspection");
        let r = self.crud.try_create(inspection, &self.feedback.t("snackbar.failedToSubmitInspection")).await;
        self.feedback.confirm("snackbar.inspectionSubmitted", r)
    }

    pub async fn update_status(&self, id: Uuid, status: InspectionStatus) -> ApiResult<InspectionRecord> {
        let r = self
            .crud
            .try_update(&id.to_string(), &json!({ "status": status }), &self.feedback.t("snackbar.failedToUpdateStatus"))
            .await;
        self.feedback.confirm("snackbar.statusUpdated", r)
    }

    /// Ask the service to mail the record's report. A blank recipient is
    /// rejected locally and nothing is sent.
    pub async fn email_report(&self, id: Uuid, recipient: &str) -> ApiResult<()> {
        let fallback = self.feedback.t("snackbar.failedToEmailReport");
        let recipient = recipient.trim();
        if recipient.is_empty() {
            let err = ApiError::input(self.feedback.t("snackbar.enterRecipientEmail"));
            return Err(self.crud.reject(err, &fallback));
        }
        let r = self
            .crud
            .send_action::<_, Value>(Method::POST, &format!("{}/email", id), &json!({ "recipient_email": recipient }), &fallback)
            .await
            .map(|_| ());
        self.feedback.confirm("snackbar.reportEmailed", r)
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        let r = self.crud.try_remove(&id.to_string(), &self.feedback.t("snackbar.failedToDeleteRecord")).await;
        self.feedback.confirm("snackbar.recordDeleted", r)
    }
}
