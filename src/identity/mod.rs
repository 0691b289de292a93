//! Session identity and permission checks.
//! Keep the public surface thin and split implementation across sub-modules.

mod permission;
mod principal;
mod session;

pub use permission::{has_permission, PermissionSnapshot, SUPER_PERMISSION};
pub use principal::{Identity, RoleRef, StudentLink};
pub use session::{Registration, SessionManager};
