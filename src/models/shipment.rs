//! Shipment (copy movement order) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::{ShipmentReason, ShipmentStatus};

/// A copy movement order between two branches.
///
/// Created by the circulation state machine (cross-branch return) or the
/// rebalancer; terminal at Delivered, which re-admits the copy at the
/// destination.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Shipment {
    pub id: i32,
    pub copy_id: i32,
    pub from_library_id: i32,
    pub to_library_id: i32,
    pub reason: ShipmentReason,
    pub status: ShipmentStatus,
    /// Staff member or system actor that triggered the shipment
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Shipment status update payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateShipmentStatus {
    pub status: ShipmentStatus,
}
