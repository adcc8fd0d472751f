//! Fine policy ledger models

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A daily fine rate effective for a library over a window of calendar days.
///
/// `effective_to` is the last covered day (a new policy closes its
/// predecessor at `new_from - 1 day`); `None` means the policy is currently
/// open. At most one open policy exists per library at any time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FinePolicy {
    pub id: i32,
    pub library_id: i32,
    #[schema(value_type = String)]
    pub daily_rate: Decimal,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl FinePolicy {
    /// Exclusive end of the covered day window, if closed.
    /// `effective_to` is inclusive, so coverage is `[from, to + 1 day)`.
    pub fn window_end(&self) -> Option<NaiveDate> {
        self.effective_to.map(|d| d + Duration::days(1))
    }

    pub fn covers(&self, day: NaiveDate) -> bool {
        day >= self.effective_from && self.window_end().map_or(true, |end| day < end)
    }
}

/// One billed slice of an overdue interval.
/// The breakdown stored on a borrow tiles `[due, returned)` exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FineSegment {
    pub start: NaiveDate,
    /// Exclusive
    pub end: NaiveDate,
    #[schema(value_type = String)]
    pub rate: Decimal,
    #[schema(value_type = String)]
    pub amount: Decimal,
}

impl FineSegment {
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Result of a fine calculation
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FineAssessment {
    #[schema(value_type = String)]
    pub total: Decimal,
    pub breakdown: Vec<FineSegment>,
}

impl FineAssessment {
    pub fn zero() -> Self {
        Self {
            total: Decimal::ZERO,
            breakdown: Vec::new(),
        }
    }
}
