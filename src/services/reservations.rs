//! Reservation Priority Queue
//!
//! Waiting lists are per edition, ordered by
//! `(effective_priority DESC, created_at ASC)`. Priorities are recomputed on
//! demand rather than continuously; a standard-tier entry that has waited
//! fourteen days is promoted to the premium base exactly once.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::MembershipTier,
        reservation::{CreateReservation, RecalculateOutcome, Reservation},
    },
    repository::Repository,
    services::notifications::{send_availability_notice, NotificationDispatcher},
};

/// Base score for premium/faculty members, and for boosted entries
const PRIORITY_BASE_HIGH: i32 = 100;
/// Base score for standard/student members
const PRIORITY_BASE_LOW: i32 = 50;
/// Waiting days after which a low-base entry is promoted once
const BOOST_THRESHOLD_DAYS: i64 = 14;

/// Effective priority of a reservation at `now`, plus whether this
/// evaluation grants the one-time boost. A boost already stamped keeps the
/// high base forever but is never granted a second time.
pub fn priority_for(
    tier: MembershipTier,
    created_at: DateTime<Utc>,
    boosted_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (i32, bool) {
    let days_waiting = (now - created_at).num_days().max(0);
    let promote =
        !tier.has_priority_base() && boosted_at.is_none() && days_waiting >= BOOST_THRESHOLD_DAYS;
    let base = if tier.has_priority_base() || boosted_at.is_some() || promote {
        PRIORITY_BASE_HIGH
    } else {
        PRIORITY_BASE_LOW
    };
    (base + days_waiting as i32, promote)
}

/// Highest-priority pending entry under the on-demand ordering key
pub fn top_pending(pending: &[Reservation], now: DateTime<Utc>) -> Option<&Reservation> {
    pending.iter().max_by(|a, b| {
        let pa = priority_for(a.tier_at_creation, a.created_at, a.priority_boosted_at, now).0;
        let pb = priority_for(b.tier_at_creation, b.created_at, b.priority_boosted_at, now).0;
        // Higher priority wins; ties go to the earlier request
        pa.cmp(&pb).then(b.created_at.cmp(&a.created_at))
    })
}

/// Precedence rule for a borrow attempt against an edition's waiting list.
///
/// An empty queue admits anyone. A non-empty queue admits only the top
/// entry's holder, matched as either the billed account or the beneficiary
/// of the attempt; the matching reservation id is returned so the borrow
/// consumes it. Everyone else is rejected.
pub fn reservation_precedence(
    pending: &[Reservation],
    billed_id: i32,
    beneficiary_id: i32,
    now: DateTime<Utc>,
) -> AppResult<Option<i32>> {
    match top_pending(pending, now) {
        Some(next) if next.user_id == billed_id || next.user_id == beneficiary_id => {
            Ok(Some(next.id))
        }
        Some(_) => Err(AppError::ReservedForOther(
            "This edition is reserved for another user".to_string(),
        )),
        None => Ok(None),
    }
}

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl ReservationsService {
    pub fn new(repository: Repository, dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Create a reservation. Reservations exist only when the waitlist is the
    /// sole path to the edition: any available copy rejects the request.
    pub async fn create(
        &self,
        user_id: i32,
        request: CreateReservation,
    ) -> AppResult<Reservation> {
        let user = self.repository.users.get_by_id(user_id).await?;
        self.repository.editions.get_by_id(request.edition_id).await?;
        if let Some(library_id) = request.preferred_library_id {
            self.repository.libraries.get_by_id(library_id).await?;
        }

        let available = self
            .repository
            .copies
            .count_available_for_edition(request.edition_id)
            .await?;
        if available > 0 {
            return Err(AppError::InvalidState(
                "Copies of this edition are currently available; borrow one instead".to_string(),
            ));
        }

        let (priority, _) = priority_for(user.tier, Utc::now(), None, Utc::now());
        self.repository
            .reservations
            .create(
                user_id,
                request.edition_id,
                request.preferred_library_id,
                user.tier,
                priority,
            )
            .await
    }

    /// Cancel a pending reservation; owner-only and terminal
    pub async fn cancel(&self, id: i32, user_id: i32) -> AppResult<Reservation> {
        let reservation = self.repository.reservations.get_by_id(id).await?;
        if reservation.user_id != user_id {
            return Err(AppError::Authorization(
                "Only the reservation holder may cancel it".to_string(),
            ));
        }
        if !self.repository.reservations.cancel(id).await? {
            return Err(AppError::InvalidState(
                "Reservation is no longer pending".to_string(),
            ));
        }
        self.repository.reservations.get_by_id(id).await
    }

    /// Batch pass: recompute every pending priority and apply the one-time
    /// boost rule. Idempotent: a second run with no intervening state change
    /// promotes nothing and leaves all priorities unchanged.
    pub async fn recalculate_priorities(&self) -> AppResult<RecalculateOutcome> {
        let now = Utc::now();
        let pending = self.repository.reservations.list_pending().await?;

        let mut updated = 0u32;
        let mut promoted = 0u32;
        for reservation in pending {
            let (priority, promote) = priority_for(
                reservation.tier_at_creation,
                reservation.created_at,
                reservation.priority_boosted_at,
                now,
            );
            if priority != reservation.effective_priority || promote {
                self.repository
                    .reservations
                    .update_priority(reservation.id, priority, promote.then_some(now))
                    .await?;
            }
            if priority != reservation.effective_priority {
                updated += 1;
            }
            if promote {
                promoted += 1;
            }
        }

        tracing::info!(updated, promoted, "reservation priority pass finished");
        Ok(RecalculateOutcome { updated, promoted })
    }

    /// Notify the holder of the top pending reservation for an edition that a
    /// copy is ready. Fulfillment stays lazy: the reservation is consumed at
    /// borrow time by the precedence check, not here.
    pub async fn check_and_notify_next_user(&self, edition_id: i32) -> AppResult<Option<i32>> {
        let pending = self
            .repository
            .reservations
            .list_pending_for_edition(edition_id)
            .await?;
        let Some(next) = top_pending(&pending, Utc::now()) else {
            return Ok(None);
        };

        let user = self.repository.users.get_by_id(next.user_id).await?;
        let edition = self.repository.editions.get_by_id(edition_id).await?;
        send_availability_notice(self.dispatcher.as_ref(), &user, &edition).await?;
        Ok(Some(next.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::ReservationStatus;
    use chrono::Duration;

    fn reservation(
        id: i32,
        tier: MembershipTier,
        waited_days: i64,
        boosted: bool,
        now: DateTime<Utc>,
    ) -> Reservation {
        let created_at = now - Duration::days(waited_days);
        Reservation {
            id,
            user_id: id * 10,
            edition_id: 1,
            preferred_library_id: None,
            position: id,
            status: ReservationStatus::Pending,
            tier_at_creation: tier,
            effective_priority: 0,
            priority_boosted_at: boosted.then(|| created_at + Duration::days(14)),
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_premium_base_and_decay() {
        let now = Utc::now();
        let (p, promote) = priority_for(MembershipTier::Premium, now - Duration::days(3), None, now);
        assert_eq!(p, 103);
        assert!(!promote);
    }

    #[test]
    fn test_standard_entry_promoted_once_after_fourteen_days() {
        let now = Utc::now();
        let created = now - Duration::days(15);

        // First pass: promoted, priority 100 + 15
        let (p, promote) = priority_for(MembershipTier::Standard, created, None, now);
        assert_eq!(p, 115);
        assert!(promote);

        // Next day, boost already stamped: 100 + 16, no second boost
        let tomorrow = now + Duration::days(1);
        let (p, promote) = priority_for(MembershipTier::Standard, created, Some(now), tomorrow);
        assert_eq!(p, 116);
        assert!(!promote);
    }

    #[test]
    fn test_standard_entry_below_threshold_keeps_low_base() {
        let now = Utc::now();
        let (p, promote) =
            priority_for(MembershipTier::Student, now - Duration::days(13), None, now);
        assert_eq!(p, 63);
        assert!(!promote);
    }

    #[test]
    fn test_priority_is_idempotent_for_same_instant() {
        let now = Utc::now();
        let created = now - Duration::days(20);
        let (first, promote) = priority_for(MembershipTier::Standard, created, None, now);
        assert!(promote);
        // Re-evaluating after the boost is stamped yields the same score
        let (second, promote_again) =
            priority_for(MembershipTier::Standard, created, Some(now), now);
        assert_eq!(first, second);
        assert!(!promote_again);
    }

    #[test]
    fn test_top_pending_orders_by_priority_then_age() {
        let now = Utc::now();
        // Premium waited 2 days: 102. Standard waited 20 days, boosted: 120.
        let premium = reservation(1, MembershipTier::Premium, 2, false, now);
        let boosted = reservation(2, MembershipTier::Standard, 20, true, now);
        let fresh = reservation(3, MembershipTier::Standard, 1, false, now);

        let queue = vec![premium, boosted, fresh];
        assert_eq!(top_pending(&queue, now).unwrap().id, 2);
    }

    #[test]
    fn test_top_pending_breaks_ties_by_earliest_request() {
        let now = Utc::now();
        let older = reservation(1, MembershipTier::Premium, 5, false, now);
        let newer = reservation(2, MembershipTier::Premium, 5, false, now);
        // Same waiting time to the day; shift the newer one by an hour
        let mut newer = newer;
        newer.created_at = older.created_at + Duration::hours(1);

        let queue = vec![newer.clone(), older.clone()];
        assert_eq!(top_pending(&queue, now).unwrap().id, 1);
    }

    #[test]
    fn test_top_pending_empty_queue() {
        assert!(top_pending(&[], Utc::now()).is_none());
    }

    #[test]
    fn test_precedence_empty_queue_admits_anyone() {
        let fulfill = reservation_precedence(&[], 1, 1, Utc::now()).unwrap();
        assert_eq!(fulfill, None);
    }

    #[test]
    fn test_precedence_top_holder_takes_the_copy() {
        let now = Utc::now();
        // Head of the queue is reservation 1, held by user 10
        let head = reservation(1, MembershipTier::Premium, 10, false, now);
        let tail = reservation(2, MembershipTier::Standard, 2, false, now);
        let queue = vec![tail, head];

        // As the billed account
        assert_eq!(reservation_precedence(&queue, 10, 10, now).unwrap(), Some(1));
        // As the beneficiary of a delegated borrow
        assert_eq!(reservation_precedence(&queue, 99, 10, now).unwrap(), Some(1));
    }

    #[test]
    fn test_precedence_rejects_everyone_but_the_top_holder() {
        let now = Utc::now();
        let head = reservation(1, MembershipTier::Premium, 10, false, now);
        let second = reservation(2, MembershipTier::Standard, 2, false, now);
        let queue = vec![head, second];

        // Even the second-in-line holder (user 20) is turned away
        let err = reservation_precedence(&queue, 20, 20, now).unwrap_err();
        assert!(matches!(err, AppError::ReservedForOther(_)));
        let err = reservation_precedence(&queue, 30, 30, now).unwrap_err();
        assert!(matches!(err, AppError::ReservedForOther(_)));
    }
}
