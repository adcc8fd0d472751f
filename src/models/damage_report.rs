//! Damage report model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Opened when a copy comes back in damaged condition.
///
/// Flags the most recent borrowers (at most three) of the copy for potential
/// fee liability; the fee is the depreciated replacement cost, floored at 10%.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DamageReport {
    pub id: i32,
    pub copy_id: i32,
    /// The borrow whose return surfaced the damage
    pub borrow_id: i32,
    #[schema(value_type = String)]
    pub damage_fee: Decimal,
    #[schema(value_type = Vec<i32>)]
    pub flagged_user_ids: Json<Vec<i32>>,
    pub reported_at: DateTime<Utc>,
    pub notes: Option<String>,
}
