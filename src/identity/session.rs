use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::permission::{self, PermissionSnapshot};
use super::principal::Identity;
use crate::config::AuthEndpoints;
use crate::error::{ApiError, ApiResult};
use crate::tprintln;
use crate::transport::{ApiRequest, Transport};

/// Account-creation payload for the registration endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub student_id_number: String,
    pub email: String,
    pub bed_number: String,
}

/// Owns the one live `Identity`. The credential itself is an HttpOnly cookie
/// managed by the transport; this type only tracks who the server says we are.
///
/// Identity is replaced wholesale on every transition and starts absent.
/// Session operations never return transport errors: they resolve to a
/// boolean plus a state change.
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    endpoints: AuthEndpoints,
    identity: watch::Sender<Option<Arc<Identity>>>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>, endpoints: AuthEndpoints) -> Self {
        let (identity, _) = watch::channel(None);
        Self { transport, endpoints, identity }
    }

    /// The authenticated transport shared with the resource layer.
    pub fn transport(&self) -> Arc<dyn Transport> { self.transport.clone() }

    pub fn endpoints(&self) -> &AuthEndpoints { &self.endpoints }

    /// Submit credentials to the token endpoint, then resolve the identity.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        let req = ApiRequest::post(self.endpoints.token.as_str()).with_form(vec![
            ("grant_type".into(), "password".into()),
            ("username".into(), username.into()),
            ("password".into(), password.into()),
        ]);
        let outcome = match self.transport.send(req).await {
            Ok(resp) => resp.into_result().map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            warn!(target: "auth", user = username, kind = e.kind(), "login failed: {}", e.display_message("login failed"));
            self.clear();
            return false;
        }
        tprintln!("auth.login token accepted user={}", username);
        let ok = self.resolve_identity().await;
        if ok {
            info!(target: "auth", user = username, "login succeeded");
        }
        ok
    }

    /// Ask the service who we are. Covers the fresh-start case where the
    /// cookie jar still holds a valid credential but no identity is cached.
    pub async fn resolve_identity(&self) -> bool {
        match self.fetch_identity().await {
            Ok(identity) => {
                tprintln!("auth.identity user={} perms={}", identity.username, identity.permissions.len());
                self.identity.send_replace(Some(Arc::new(identity)));
                true
            }
            Err(e) if e.is_unauthenticated() => {
                debug!(target: "auth", "identity not resolved: not authenticated");
                self.clear();
                false
            }
            Err(e) => {
                error!(target: "auth", kind = e.kind(), "failed to resolve identity: {}", e);
                self.clear();
                false
            }
        }
    }

    async fn fetch_identity(&self) -> ApiResult<Identity> {
        let resp = self.transport.send(ApiRequest::get(self.endpoints.identity.as_str())).await?;
        match resp.into_result()? {
            Some(v) => Ok(serde_json::from_value(v)?),
            None => Err(ApiError::decode("identity endpoint returned no body")),
        }
    }

    /// Invalidate the server credential, then drop local identity regardless
    /// of how the server call went.
    pub async fn logout(&self) {
        let result = match self.transport.send(ApiRequest::post(self.endpoints.logout.as_str())).await {
            Ok(resp) => resp.into_result().map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(target: "auth", kind = e.kind(), "logout request failed: {}", e);
        }
        self.clear();
        info!(target: "auth", "logged out");
    }

    /// One-shot account creation. Failures are returned to the caller and do
    /// not touch the current identity.
    pub async fn register(&self, reg: &Registration) -> ApiResult<()> {
        let req = ApiRequest::post(self.endpoints.register.as_str()).with_json(reg)?;
        self.transport.send(req).await?.into_result()?;
        info!(target: "auth", user = %reg.username, "registration accepted");
        Ok(())
    }

    pub fn has_permission(&self, name: &str) -> bool {
        permission::has_permission(self.identity.borrow().as_deref(), name)
    }

    pub fn is_authenticated(&self) -> bool { self.identity.borrow().is_some() }

    pub fn identity(&self) -> Option<Arc<Identity>> { self.identity.borrow().clone() }

    pub fn permissions(&self) -> PermissionSnapshot { PermissionSnapshot::of(self.identity()) }

    /// Observe identity transitions (login, logout, failed resolve).
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Identity>>> { self.identity.subscribe() }

    fn clear(&self) {
        self.identity.send_replace(None);
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("endpoints", &self.endpoints)
            .field("identity", &self.identity.borrow().as_ref().map(|i| i.username.clone()))
            .finish()
    }
}
