//! Reservation (waiting list) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::{MembershipTier, ReservationStatus};

/// A waiting-list entry for an edition.
///
/// Ordering is `(effective_priority DESC, created_at ASC)`. At most one
/// pending reservation exists per (user, edition); the data layer enforces
/// this with a partial unique index.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: i32,
    pub user_id: i32,
    pub edition_id: i32,
    pub preferred_library_id: Option<i32>,
    /// Per-edition sequence position, assigned at creation
    pub position: i32,
    pub status: ReservationStatus,
    /// Snapshot of the member tier when the reservation was made
    pub tier_at_creation: MembershipTier,
    pub effective_priority: i32,
    /// Stamped once when the one-time standard-tier boost is granted
    pub priority_boosted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reservation request payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReservation {
    pub edition_id: i32,
    pub preferred_library_id: Option<i32>,
}

/// Outcome of a batch priority pass
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct RecalculateOutcome {
    /// Reservations whose effective priority changed
    pub updated: u32,
    /// Reservations granted the one-time boost in this pass
    pub promoted: u32,
}
