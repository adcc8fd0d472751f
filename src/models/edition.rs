//! Edition catalog model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A published form of a work (ISBN, format, publisher). Read-only for the
/// circulation core; catalog editing lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Edition {
    pub id: i32,
    pub work_title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub format: Option<String>,
    /// Basis for the depreciated damage fee
    #[schema(value_type = String)]
    pub replacement_cost: Decimal,
}
