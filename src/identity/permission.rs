use std::collections::HashSet;
use std::sync::Arc;

use super::principal::Identity;

/// Holding this permission satisfies every check.
pub const SUPER_PERMISSION: &str = "admin:full_access";

/// Pure permission predicate over an optional identity.
pub fn has_permission(identity: Option<&Identity>, name: &str) -> bool {
    let Some(id) = identity else { return false };
    id.permissions.iter().any(|p| p == SUPER_PERMISSION || p == name)
}

/// Immutable capability view of one identity, taken once per render pass.
/// The renderer asks `allows` for each gated element instead of re-reading
/// session state element by element.
#[derive(Debug, Clone, Default)]
pub struct PermissionSnapshot {
    identity: Option<Arc<Identity>>,
    granted: HashSet<String>,
    admin: bool,
}

impl PermissionSnapshot {
    pub fn of(identity: Option<Arc<Identity>>) -> Self {
        let granted: HashSet<String> = identity
            .as_ref()
            .map(|id| id.permissions.iter().cloned().collect())
            .unwrap_or_default();
        let admin = granted.contains(SUPER_PERMISSION);
        Self { identity, granted, admin }
    }

    pub fn allows(&self, name: &str) -> bool {
        self.identity.is_some() && (self.admin || self.granted.contains(name))
    }

    pub fn is_admin(&self) -> bool { self.admin }

    pub fn is_authenticated(&self) -> bool { self.identity.is_some() }

    pub fn identity(&self) -> Option<&Identity> { self.identity.as_deref() }

    /// Keep only the items whose required permission is granted (or absent).
    pub fn filter<'a, T, F>(&self, items: &'a [T], required: F) -> Vec<&'a T>
    where
        F: Fn(&T) -> Option<&str>,
    {
        items
            .iter()
            .filter(|it| required(it).map(|p| self.allows(p)).unwrap_or(true))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(perms: &[&str]) -> Identity {
        Identity {
            username: "u".into(),
            permissions: perms.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn super_permission_satisfies_everything() {
        let admin = ident(&["admin:full_access"]);
        for p in ["read:rooms", "users:delete", "", "anything:at_all"] {
            assert!(has_permission(Some(&admin), p), "admin should hold {p}");
        }
    }

    #[test]
    fn missing_permission_is_denied() {
        let reader = ident(&["read:rooms", "inspections:view"]);
        assert!(has_permission(Some(&reader), "read:rooms"));
        assert!(!has_permission(Some(&reader), "admin:full_access"));
        assert!(!has_permission(Some(&reader), "users:edit"));
        assert!(!has_permission(None, "read:rooms"));
    }

    #[test]
    fn snapshot_filters_gated_items() {
        let snap = PermissionSnapshot::of(Some(Arc::new(ident(&["rooms:view"]))));
        let menu = [("Rooms", Some("rooms:view")), ("Users", Some("users:view")), ("Home", None)];
        let shown: Vec<&str> = snap.filter(&menu, |m| m.1).into_iter().map(|m| m.0).collect();
        assert_eq!(shown, vec!["Rooms", "Home"]);
        assert!(!snap.is_admin());

        let anon = PermissionSnapshot::of(None);
        assert!(!anon.allows("rooms:view"));
        assert!(!anon.is_authenticated());
    }
}
