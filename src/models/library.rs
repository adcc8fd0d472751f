//! Library (branch) directory model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A consortium branch. Read-only for the circulation core; branch
/// administration lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Library {
    pub id: i32,
    pub name: String,
    pub active: bool,
    pub loan_period_days: i32,
    /// Fallback daily fine rate when no policy covers an overdue day
    #[schema(value_type = String)]
    pub default_fine_rate: Decimal,
}
