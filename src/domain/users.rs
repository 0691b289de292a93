use serde::Serialize;
use uuid::Uuid;

use super::Feedback;
use crate::context::ServiceContext;
use crate::error::{ApiError, ApiResult};
use crate::models::{Permission, Role, User};
use crate::resource::{Page, QueryParams, ResourceClient};

pub const USERS: &str = "/api/v1/users";
pub const ROLES: &str = "/api/v1/roles";
pub const PERMISSIONS: &str = "/api/v1/permissions";

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct UserCreate {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub email: String,
    pub student_id_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Role ids; replaces the user's current set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RoleCreate {
    pub name: String,
    /// Permission ids.
    pub permissions: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RoleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Uuid>>,
}

/// Account administration: users, roles and the permission catalog.
///
/// The three listings never fail outward. A failure is notified and an empty
/// page comes back, so an admin table simply renders empty.
pub struct Users {
    users: ResourceClient<User>,
    roles: ResourceClient<Role>,
    permissions: ResourceClient<Permission>,
    feedback: Feedback,
}

impl Users {
    pub fn new(ctx: &ServiceContext) -> Self {
        Self {
            users: ctx.resource(USERS),
            roles: ctx.resource(ROLES),
            permissions: ctx.resource(PERMISSIONS),
            feedback: Feedback::new(ctx.notifier().clone(), ctx.messages().clone()),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.users.loading() || self.roles.loading() || self.permissions.loading()
    }

    pub fn error(&self) -> Option<ApiError> {
        self.users.error().or_else(|| self.roles.error()).or_else(|| self.permissions.error())
    }

    pub async fn list_users(&self, params: &QueryParams) -> Page<User> {
        self.users.page(params, &self.feedback.t("snackbar.failedToLoadUsers")).await.unwrap_or_default()
    }

    pub async fn create_user(&self, user: &UserCreate) -> ApiResult<User> {
        let r = self.users.try_create(user, &self.feedback.t("snackbar.failedToSaveUser")).await;
        self.feedback.confirm("snackbar.userCreated", r)
    }

    pub async fn update_user(&self, id: Uuid, user: &UserUpdate) -> ApiResult<User> {
        let r = self.users.try_update(&id.to_string(), user, &self.feedback.t("snackbar.failedToSaveUser")).await;
        self.feedback.confirm("snackbar.userUpdated", r)
    }

    pub async fn list_roles(&self, params: &QueryParams) -> Page<Role> {
        self.roles.page(params, &self.feedback.t("snackbar.failedToLoadRoles")).await.unwrap_or_default()
    }

    pub async fn create_role(&self, role: &RoleCreate) -> ApiResult<Role> {
        let r = self.roles.try_create(role, &self.feedback.t("snackbar.failedToSaveRole")).await;
        self.feedback.confirm("snackbar.roleCreated", r)
    }

    pub async fn update_role(&self, id: Uuid, role: &RoleUpdate) -> ApiResult<Role> {
        let r = self.roles.try_update(&id.to_string(), role, &self.feedback.t("snackbar.failedToSaveRole")).await;
        self.feedback.confirm("snackbar.roleUpdated", r)
    }

    pub async fn delete_role(&self, id: Uuid) -> ApiResult<()> {
        let r = self.roles.try_remove(&id.to_string(), &self.feedback.t("snackbar.failedToDeleteRole")).await;
        self.feedback.confirm("snackbar.roleDeleted", r)
    }

    pub async fn list_permissions(&self, params: &QueryParams) -> Page<Permission> {
        self.permissions
            .page(params, &self.feedback.t("snackbar.failedToLoadPermissions"))
            .await
            .unwrap_or_default()
    }
}
