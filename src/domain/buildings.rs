use serde::Serialize;

use super::Feedback;
use crate::context::ServiceContext;
use crate::error::{ApiError, ApiResult};
use crate::models::Building;
use crate::resource::{Page, QueryParams, ResourceClient};

pub const ENDPOINT: &str = "/api/v1/buildings";

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BuildingCreate {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BuildingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

pub struct Buildings {
    crud: ResourceClient<Building>,
    feedback: Feedback,
}

impl Buildings {
    pub fn new(ctx: &ServiceContext) -> Self {
        Self {
            crud: ctx.resource(ENDPOINT),
            feedback: Feedback::new(ctx.notifier().clone(), ctx.messages().clone()),
        }
    }

    pub fn is_loading(&self) -> bool { self.crud.loading() }
    pub fn error(&self) -> Option<ApiError> { self.crud.error() }

    pub async fn list(&self, params: &QueryParams) -> ApiResult<Page<Building>> {
        self.crud.page(params, &self.feedback.t("snackbar.failedToLoadBuildings")).await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Building> {
        self.crud.try_get_by_id(&id.to_string(), &self.feedback.t("snackbar.failedToLoadData")).await
    }

    pub async fn create(&self, building: &BuildingCreate) -> ApiResult<Building> {
        let r = self.crud.try_create(building, &self.feedback.t("snackbar.failedToSaveBuilding")).await;
        self.feedback.confirm("snackbar.buildingCreated", r)
    }

    pub async fn update(&self, id: i64, building: &BuildingUpdate) -> ApiResult<Building> {
        let r = self.crud.try_update(&id.to_string(), building, &self.feedback.t("snackbar.failedToSaveBuilding")).await;
        self.feedback.confirm("snackbar.buildingUpdated", r)
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let r = self.crud.try_remove(&id.to_string(), &self.feedback.t("snackbar.failedToDeleteBuilding")).await;
        self.feedback.confirm("snackbar.buildingDeleted", r)
    }

    /// Every building with its rooms and their beds, in one round trip.
    pub async fn full_tree(&self) -> ApiResult<Vec<Building>> {
        self.crud
            .fetch_path("full-tree/", &QueryParams::new(), &self.feedback.t("snackbar.failedToLoadBuildingData"))
            .await
    }
}
