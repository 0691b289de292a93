use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::Feedback;
use crate::context::ServiceContext;
use crate::error::{ApiError, ApiResult};
use crate::models::Student;
use crate::resource::{Page, QueryParams, ResourceClient};

pub const ENDPOINT: &str = "/api/v1/students";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StudentCreate {
    pub student_id_number: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_foreign_student: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_card_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_id: Option<i64>,
}

/// Partial update. `bed_id: Some(None)` clears the bed.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct StudentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_foreign_student: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_card_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_id: Option<Option<i64>>,
}

pub struct Students {
    crud: ResourceClient<Student>,
    feedback: Feedback,
}

impl Students {
    pub fn new(ctx: &ServiceContext) -> Self {
        Self {
            crud: ctx.resource(ENDPOINT),
            feedback: Feedback::new(ctx.notifier().clone(), ctx.messages().clone()),
        }
    }

    pub fn is_loading(&self) -> bool { self.crud.loading() }
    pub fn error(&self) -> Option<ApiError> { self.crud.error() }

    pub async fn list(&self, params: &QueryParams) -> ApiResult<Page<Student>> {
        self.crud.page(params, &self.feedback.t("snackbar.failedToLoadData")).await
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<Student> {
        self.crud.try_get_by_id(&id.to_string(), &self.feedback.t("snackbar.failedToLoadData")).await
    }

    pub async fn create(&self, student: &StudentCreate) -> ApiResult<Student> {
        let fallback = self.feedback.t("snackbar.failedToSaveStudent");
        let r = self.crud.try_create(student, &fallback).await;
        self.feedback.confirm("snackbar.studentCreated", r)
    }

    pub async fn update(&self, id: Uuid, student: &StudentUpdate) -> ApiResult<Student> {
        let fallback = self.feedback.t("snackbar.failedToSaveStudent");
        let r = self.crud.try_update(&id.to_string(), student, &fallback).await;
        self.feedback.confirm("snackbar.studentUpdated", r)
    }

    /// `None` unassigns the student's bed.
    pub async fn assign_bed(&self, id: Uuid, bed_id: Option<i64>) -> ApiResult<Student> {
        let fallback = self.feedback.t("snackbar.failedToAssignBed");
        let r = self
            .crud
            .call(Method::PUT, &format!("{}/assign-bed", id), &json!({ "bed_id": bed_id }), &fallback)
            .await;
        self.feedback.confirm("snackbar.assignBedSuccess", r)
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        let fallback = self.feedback.t("snackbar.failedToDeleteStudent");
        let r = self.crud.try_remove(&id.to_string(), &fallback).await;
        self.feedback.confirm("snackbar.studentDeleted", r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::i18n::Messages;
    use crate::notify::Severity;
    use crate::transport::{MockReply, MockTransport, RequestBody};
    use std::sync::Arc;

    const SID: &str = "3b241101-e2bb-4255-8caf-4136c566a962";

    fn student_json() -> serde_json::Value {
        json!({"id": SID, "student_id_number": "S001", "full_name": "Lin Mei", "bed_id": 12})
    }

    fn setup() -> (Arc<MockTransport>, ServiceContext) {
        let mock = Arc::new(MockTransport::new());
        let ctx = ServiceContext::with_transport(ClientConfig::default(), mock.clone(), Messages::default());
        (mock, ctx)
    }

    #[tokio::test]
    async fn list_uses_trailing_slash_and_skips_empty_filters() {
        let (mock, ctx) = setup();
        mock.on(Method::GET, "/api/v1/students/", MockReply::Json(200, json!({"total": 1, "records": [student_json()]})));
        let q = QueryParams::new().push("skip", 0).push("limit", 10).push("search", "");
        let page = ctx.students().list(&q).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.records[0].full_name, "Lin Mei");
        let sent = &mock.requests()[0];
        assert!(sent.query.iter().all(|(k, _)| k != "search"));
    }

    #[tokio::test]
    async fn assign_bed_sends_null_to_unassign() {
        let (mock, ctx) = setup();
        let path = format!("/api/v1/students/{}/assign-bed", SID);
        mock.on(Method::PUT, &path, MockReply::Json(200, student_json()));
        let id = Uuid::parse_str(SID).unwrap();
        let s = ctx.students().assign_bed(id, None).await.unwrap();
        assert_eq!(s.student_id_number, "S001");
        assert_eq!(mock.requests()[0].body, RequestBody::Json(json!({"bed_id": null})));
        let n = ctx.notifier().current();
        assert_eq!(n.severity, Severity::Success);
        assert_eq!(n.message, "snackbar.assignBedSuccess");
    }

    #[tokio::test]
    async fn failed_create_notifies_once_and_rethrows() {
        let (mock, ctx) = setup();
        mock.on(Method::POST, ENDPOINT, MockReply::Json(409, json!({"detail": "Student ID already exists"})));
        let students = ctx.students();
        let err = students
            .create(&StudentCreate { student_id_number: "S001".into(), full_name: "Lin".into(), ..Default::default() })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(ctx.notifier().issued(), 1);
        assert_eq!(ctx.notifier().current().message, "Student ID already exists");
        assert_eq!(students.error(), Some(err));
    }

    #[test]
    fn update_serializes_only_set_fields() {
        let u = StudentUpdate { remarks: Some("moved".into()), bed_id: Some(None), ..Default::default() };
        assert_eq!(serde_json::to_value(&u).unwrap(), json!({"remarks": "moved", "bed_id": null}));
    }
}
