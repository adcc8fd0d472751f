//! Physical copy model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::{CopyCondition, CopyStatus};

/// One physical instance of an edition, trackable by code and location.
///
/// A copy is borrowable iff `status == Available` and `current_library_id`
/// equals the library offering it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookCopy {
    pub id: i32,
    /// Unique barcode
    pub code: String,
    pub edition_id: i32,
    /// Permanent home branch
    pub owning_library_id: i32,
    /// Present location
    pub current_library_id: i32,
    pub condition: CopyCondition,
    pub status: CopyStatus,
    pub acquired_at: DateTime<Utc>,
}

impl BookCopy {
    pub fn is_borrowable_at(&self, library_id: i32) -> bool {
        self.status == CopyStatus::Available && self.current_library_id == library_id
    }
}
