//! Shared circulation enums
//!
//! Every status column in the database is a SMALLINT backed by one of these
//! closed enums; the `can_transition_to` tables are the authoritative
//! state-machine definitions for copies, borrows, reservations and shipments.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// CopyStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a physical copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[repr(i16)]
pub enum CopyStatus {
    Available = 0,
    Borrowed = 1,
    InTransit = 2,
    DamagedPulled = 3,
    Lost = 4,
}

impl CopyStatus {
    /// Valid copy transitions. DamagedPulled and Lost are terminal until
    /// manual restoration, which is outside this engine.
    pub fn can_transition_to(self, to: CopyStatus) -> bool {
        use CopyStatus::*;
        match (self, to) {
            (Available, Borrowed) => true,
            (Available, InTransit) => true,
            (Borrowed, Available) => true,
            (Borrowed, InTransit) => true,
            (Borrowed, DamagedPulled) => true,
            (Borrowed, Lost) => true,
            (InTransit, Available) => true,
            (Available, _)
            | (Borrowed, _)
            | (InTransit, _)
            | (DamagedPulled, _)
            | (Lost, _) => false,
        }
    }
}

impl std::fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CopyStatus::Available => "available",
            CopyStatus::Borrowed => "borrowed",
            CopyStatus::InTransit => "in transit",
            CopyStatus::DamagedPulled => "damaged (pulled)",
            CopyStatus::Lost => "lost",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// CopyCondition
// ---------------------------------------------------------------------------

/// Physical condition of a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[repr(i16)]
pub enum CopyCondition {
    New = 0,
    Good = 1,
    Fair = 2,
    Damaged = 3,
}

// ---------------------------------------------------------------------------
// BorrowStatus
// ---------------------------------------------------------------------------

/// Persisted borrow status. Overdue is derived from `due_at`, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[repr(i16)]
pub enum BorrowStatus {
    Borrowed = 0,
    Returned = 1,
}

// ---------------------------------------------------------------------------
// ReservationStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[repr(i16)]
pub enum ReservationStatus {
    Pending = 0,
    Fulfilled = 1,
    Cancelled = 2,
}

impl ReservationStatus {
    pub fn can_transition_to(self, to: ReservationStatus) -> bool {
        use ReservationStatus::*;
        match (self, to) {
            (Pending, Fulfilled) | (Pending, Cancelled) => true,
            (Pending, _) | (Fulfilled, _) | (Cancelled, _) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// ShipmentStatus
// ---------------------------------------------------------------------------

/// Shipment progress. The chain is strictly linear: no skipping, no reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[repr(i16)]
pub enum ShipmentStatus {
    Pending = 0,
    InTransit = 1,
    Delivered = 2,
}

impl ShipmentStatus {
    /// Next step in the linear chain, if any
    pub fn next(self) -> Option<ShipmentStatus> {
        match self {
            ShipmentStatus::Pending => Some(ShipmentStatus::InTransit),
            ShipmentStatus::InTransit => Some(ShipmentStatus::Delivered),
            ShipmentStatus::Delivered => None,
        }
    }

    pub fn can_transition_to(self, to: ShipmentStatus) -> bool {
        self.next() == Some(to)
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::InTransit => "in transit",
            ShipmentStatus::Delivered => "delivered",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// ShipmentReason
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[repr(i16)]
pub enum ShipmentReason {
    InterLibraryReturn = 0,
    Rebalancing = 1,
    Transfer = 2,
}

// ---------------------------------------------------------------------------
// MembershipTier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[repr(i16)]
pub enum MembershipTier {
    Standard = 0,
    Student = 1,
    Premium = 2,
    Faculty = 3,
}

impl MembershipTier {
    /// Premium and faculty members start at the high reservation base score
    pub fn has_priority_base(self) -> bool {
        matches!(self, MembershipTier::Premium | MembershipTier::Faculty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_transitions() {
        assert!(CopyStatus::Available.can_transition_to(CopyStatus::Borrowed));
        assert!(CopyStatus::Borrowed.can_transition_to(CopyStatus::DamagedPulled));
        assert!(CopyStatus::InTransit.can_transition_to(CopyStatus::Available));
        assert!(!CopyStatus::DamagedPulled.can_transition_to(CopyStatus::Available));
        assert!(!CopyStatus::Lost.can_transition_to(CopyStatus::Available));
        assert!(!CopyStatus::Available.can_transition_to(CopyStatus::Available));
    }

    #[test]
    fn test_shipment_chain_is_linear() {
        assert!(ShipmentStatus::Pending.can_transition_to(ShipmentStatus::InTransit));
        assert!(ShipmentStatus::InTransit.can_transition_to(ShipmentStatus::Delivered));
        // No skipping, no reversal
        assert!(!ShipmentStatus::Pending.can_transition_to(ShipmentStatus::Delivered));
        assert!(!ShipmentStatus::InTransit.can_transition_to(ShipmentStatus::Pending));
        assert!(!ShipmentStatus::Delivered.can_transition_to(ShipmentStatus::InTransit));
        assert_eq!(ShipmentStatus::Delivered.next(), None);
    }

    #[test]
    fn test_reservation_terminal_states() {
        assert!(ReservationStatus::Pending.can_transition_to(ReservationStatus::Cancelled));
        assert!(!ReservationStatus::Cancelled.can_transition_to(ReservationStatus::Pending));
        assert!(!ReservationStatus::Fulfilled.can_transition_to(ReservationStatus::Cancelled));
    }

    #[test]
    fn test_tier_priority_base() {
        assert!(MembershipTier::Premium.has_priority_base());
        assert!(MembershipTier::Faculty.has_priority_base());
        assert!(!MembershipTier::Standard.has_priority_base());
        assert!(!MembershipTier::Student.has_priority_base());
    }
}
