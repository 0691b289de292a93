//! Permission-gated navigation.
//!
//! `NavigationGuard::before_each` runs before every screen transition. It may
//! suspend once, to resolve the identity on a fresh start, and then decides
//! between letting the navigation through and redirecting it.

use std::sync::Arc;

use tracing::debug;

use crate::identity::SessionManager;

/// Route names reachable without a session. Matched by prefix so
/// locale-suffixed names such as `login___en` count too.
pub const PUBLIC_ROUTES: [&str; 4] = ["login", "register", "forgot-password", "reset-password"];

/// Destination of a navigation attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    pub path: String,
    /// Permission tag from the page metadata, if the page is gated.
    pub required_permission: Option<String>,
}

impl Route {
    pub fn new<N: Into<String>, P: Into<String>>(name: N, path: P) -> Self {
        Self { name: name.into(), path: path.into(), required_permission: None }
    }

    pub fn with_permission<S: Into<String>>(mut self, permission: S) -> Self {
        self.required_permission = Some(permission.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    Redirect(String),
}

/// Locale-prefixed paths, `prefix_except_default` style: the default locale
/// uses bare paths, every other locale gets a `/{locale}` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleRouting {
    pub locale: String,
    pub default_locale: String,
}

impl LocaleRouting {
    pub fn new<S: Into<String>>(locale: S, default_locale: S) -> Self {
        Self { locale: locale.into(), default_locale: default_locale.into() }
    }

    pub fn path(&self, path: &str) -> String {
        if self.locale == self.default_locale {
            return path.to_string();
        }
        if path == "/" || path.is_empty() {
            format!("/{}", self.locale)
        } else if path.starts_with('/') {
            format!("/{}{}", self.locale, path)
        } else {
            format!("/{}/{}", self.locale, path)
        }
    }
}

impl Default for LocaleRouting {
    fn default() -> Self { Self::new(crate::config::DEFAULT_LOCALE, crate::config::DEFAULT_LOCALE) }
}

pub fn is_public_route(name: &str) -> bool {
    PUBLIC_ROUTES.iter().any(|p| name.starts_with(p))
}

pub struct NavigationGuard {
    session: Arc<SessionManager>,
    routing: LocaleRouting,
}

impl NavigationGuard {
    pub fn new(session: Arc<SessionManager>, routing: LocaleRouting) -> Self {
        Self { session, routing }
    }

    pub fn home_path(&self) -> String { self.routing.path("/") }

    pub fn login_path(&self) -> String { self.routing.path("/login") }

    pub async fn before_each(&self, to: &Route) -> Navigation {
        let public = is_public_route(&to.name);

        if self.session.identity().is_none() {
            self.session.resolve_identity().await;
        }

        let decision = if self.session.is_authenticated() {
            if public {
                Navigation::Redirect(self.home_path())
            } else {
                match to.required_permission.as_deref() {
                    Some(p) if !p.is_empty() && !self.session.has_permission(p) => Navigation::Redirect(self.home_path()),
                    _ => Navigation::Allow,
                }
            }
        } else if !public {
            Navigation::Redirect(self.login_path())
        } else {
            Navigation::Allow
        };
        debug!(target: "guard", route = %to.name, path = %to.path, ?decision, "navigation");
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthEndpoints;
    use crate::transport::{MockReply, MockTransport};
    use reqwest::Method;
    use serde_json::json;

    const ME: &str = "/api/v1/users/me/";

    fn guard_with(me: MockReply, routing: LocaleRouting) -> (Arc<MockTransport>, Arc<SessionManager>, NavigationGuard) {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::GET, ME, me);
        let sm = Arc::new(SessionManager::new(mock.clone(), AuthEndpoints::default()));
        let guard = NavigationGuard::new(sm.clone(), routing);
        (mock, sm, guard)
    }

    fn user(perms: &[&str]) -> MockReply {
        MockReply::Json(200, json!({"username": "u", "permissions": perms}))
    }

    #[test]
    fn public_routes_match_by_prefix() {
        assert!(is_public_route("login"));
        assert!(is_public_route("login___en"));
        assert!(is_public_route("reset-password___zh"));
        assert!(!is_public_route("index"));
        assert!(!is_public_route("admin-users"));
    }

    #[test]
    fn locale_paths() {
        let zh = LocaleRouting::new("zh", "zh");
        assert_eq!(zh.path("/"), "/");
        assert_eq!(zh.path("/login"), "/login");
        let en = LocaleRouting::new("en", "zh");
        assert_eq!(en.path("/"), "/en");
        assert_eq!(en.path("/login"), "/en/login");
    }

    #[tokio::test]
    async fn anonymous_protected_redirects_to_login() {
        let (mock, _sm, guard) = guard_with(MockReply::Json(401, json!({"detail": "Not authenticated"})), LocaleRouting::default());
        let nav = guard.before_each(&Route::new("rooms", "/rooms")).await;
        assert_eq!(nav, Navigation::Redirect("/login".into()));
        // first-load resolve attempt happened exactly once
        assert_eq!(mock.count(&Method::GET, ME), 1);

        let nav = guard.before_each(&Route::new("login", "/login")).await;
        assert_eq!(nav, Navigation::Allow);
    }

    #[tokio::test]
    async fn authenticated_public_redirects_home() {
        let (_mock, _sm, guard) = guard_with(user(&["read:rooms"]), LocaleRouting::new("en", "zh"));
        let nav = guard.before_each(&Route::new("login___en", "/en/login")).await;
        assert_eq!(nav, Navigation::Redirect("/en".into()));
    }

    #[tokio::test]
    async fn missing_permission_redirects_home() {
        let (_mock, _sm, guard) = guard_with(user(&["read:rooms"]), LocaleRouting::default());
        let to = Route::new("admin-users", "/admin/users").with_permission("admin:full_access");
        assert_eq!(guard.before_each(&to).await, Navigation::Redirect("/".into()));

        let rooms = Route::new("rooms", "/rooms").with_permission("read:rooms");
        assert_eq!(guard.before_each(&rooms).await, Navigation::Allow);

        // home is never gated, so there is no redirect loop
        assert_eq!(guard.before_each(&Route::new("index", "/")).await, Navigation::Allow);
    }

    #[tokio::test]
    async fn admin_passes_any_gate() {
        let (_mock, _sm, guard) = guard_with(user(&["admin:full_access"]), LocaleRouting::default());
        let to = Route::new("admin-roles", "/admin/roles").with_permission("roles:manage");
        assert_eq!(guard.before_each(&to).await, Navigation::Allow);
    }

    #[tokio::test]
    async fn cached_identity_skips_resolve() {
        let (mock, sm, guard) = guard_with(user(&[]), LocaleRouting::default());
        assert!(sm.resolve_identity().await);
        guard.before_each(&Route::new("index", "/")).await;
        guard.before_each(&Route::new("rooms", "/rooms")).await;
        assert_eq!(mock.count(&Method::GET, ME), 1);
    }
}
