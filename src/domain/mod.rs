//! Per-resource composables layered on `ResourceClient`.
//!
//! Each one adds the endpoint's paginated listing, its custom actions, and a
//! localized success notification after every mutation. Failures have already
//! been notified by the resource layer when they come back here, so they are
//! only passed on as `Err`.

use crate::error::ApiResult;
use crate::i18n::Messages;
use crate::notify::Notifier;

mod announcements;
mod buildings;
mod dashboard;
mod inspections;
mod items;
mod rooms;
mod search;
mod students;
mod users;

pub use announcements::{AnnouncementCreate, AnnouncementUpdate, Announcements};
pub use buildings::{BuildingCreate, BuildingUpdate, Buildings};
pub use dashboard::{Dashboard, DashboardData};
pub use inspections::{DetailCreate, InspectionCreate, Inspections, PhotoUpload, SearchParams};
pub use items::{InspectionItemCreate, InspectionItemUpdate, Items};
pub use rooms::{BedCreate, BedUpdate, RoomCreate, RoomUpdate, Rooms};
pub use search::{GlobalSearch, SearchResultItem, SEARCH_FAILED};
pub use students::{StudentCreate, StudentUpdate, Students};
pub use users::{RoleCreate, RoleUpdate, UserCreate, UserUpdate, Users};

/// Success/fallback message plumbing shared by the composables.
#[derive(Clone, Debug)]
pub(crate) struct Feedback {
    notifier: Notifier,
    messages: Messages,
}

impl Feedback {
    pub(crate) fn new(notifier: Notifier, messages: Messages) -> Self { Self { notifier, messages } }

    pub(crate) fn t(&self, key: &str) -> String { self.messages.t(key) }

    /// Announce `ok_key` when `result` succeeded; pass the result through.
    pub(crate) fn confirm<R>(&self, ok_key: &str, result: ApiResult<R>) -> ApiResult<R> {
        if result.is_ok() {
            self.notifier.success(self.messages.t(ok_key));
        }
        result
    }
}
