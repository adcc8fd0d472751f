//! Borrow (loan transaction) model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::{BorrowStatus, CopyCondition};
use super::fine_policy::FineSegment;

/// One loan transaction.
///
/// `user_id` is the billed account (the effective borrower after delegation
/// resolution); `beneficiary_id` is the account the copy was handed to. They
/// coincide for non-delegated loans. Mutated once on return, immutable
/// afterward except for administrative correction.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrow {
    pub id: i32,
    pub user_id: i32,
    pub beneficiary_id: i32,
    pub copy_id: i32,
    /// Lending library; fines are always scoped to it
    pub library_id: i32,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: BorrowStatus,
    #[schema(value_type = Option<String>)]
    pub fine_amount: Option<Decimal>,
    /// Ordered fine segments tiling [due_at, returned_at), kept for audit
    #[schema(value_type = Option<Vec<FineSegment>>)]
    pub fine_breakdown: Option<Json<Vec<FineSegment>>>,
    pub returned_to_library_id: Option<i32>,
    pub condition_at_borrow: CopyCondition,
    pub condition_at_return: Option<CopyCondition>,
    pub notes: Option<String>,
}

impl Borrow {
    /// Overdue is derived, never persisted
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == BorrowStatus::Borrowed && self.due_at < now
    }

    pub fn into_details(self, now: DateTime<Utc>) -> BorrowDetails {
        let is_overdue = self.is_overdue(now);
        BorrowDetails {
            borrow: self,
            is_overdue,
        }
    }
}

/// Borrow with the derived overdue flag, for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowDetails {
    #[serde(flatten)]
    pub borrow: Borrow,
    pub is_overdue: bool,
}

/// Borrow request payload
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBorrow {
    /// Acting user (the person at the desk)
    pub user_id: i32,
    /// Copy id (optional if a barcode is provided)
    pub copy_id: Option<i32>,
    /// Copy barcode
    #[validate(length(min = 1, max = 64))]
    pub copy_code: Option<String>,
    /// Library the copy is borrowed from
    pub library_id: i32,
    /// Verified child account borrowing on the acting user's limit
    pub on_behalf_of: Option<i32>,
}

/// Return request payload
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReturnBorrow {
    /// Acting user; must own the borrow (as billed account or beneficiary)
    pub user_id: i32,
    /// Defaults to the lending library
    pub returned_to_library_id: Option<i32>,
    pub condition: Option<CopyCondition>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}
