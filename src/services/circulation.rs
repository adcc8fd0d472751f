//! Circulation State Machine
//!
//! Owns the borrow/return lifecycle: delegation resolution, limit and
//! availability checks, reservation precedence, fine persistence, damage
//! pulls and cross-branch return shipments. Post-return side effects go
//! through the outbox in `services::events` and never block the caller.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow::{Borrow, BorrowDetails, CreateBorrow, ReturnBorrow},
        copy::BookCopy,
        damage_report::DamageReport,
        enums::{BorrowStatus, CopyCondition},
        fine_policy::FineAssessment,
        user::User,
    },
    repository::borrows::{CopyOutcome, NewBorrow, ReturnFinalization},
    repository::Repository,
    services::events::{CirculationEvent, EventBus},
    services::fines::calculate_fine,
    services::reservations::reservation_precedence,
};

/// How many of the copy's most recent borrowers a damage report flags
const DAMAGE_FLAG_LIMIT: usize = 3;

/// Resolve who a loan bills and who actually walks out with the copy.
///
/// An explicit delegate must be a verified child of the acting user and
/// bills the acting user. An acting user who is itself a child account bills
/// its parent automatically. Called once at the top of borrow, before any
/// limit check.
pub fn resolve_effective_borrower(
    acting: &User,
    delegate: Option<&User>,
) -> AppResult<(i32, i32)> {
    match delegate {
        Some(child) => {
            if child.parent_id != Some(acting.id) {
                return Err(AppError::Validation(format!(
                    "User {} is not a verified child of user {}",
                    child.id, acting.id
                )));
            }
            Ok((acting.id, child.id))
        }
        None => match acting.parent_id {
            Some(parent_id) => Ok((parent_id, acting.id)),
            None => Ok((acting.id, acting.id)),
        },
    }
}

/// Depreciated replacement fee for a damaged copy: 10% of the replacement
/// cost per whole year of age, floored at 10%, rounded to cents.
pub fn damage_fee(
    replacement_cost: Decimal,
    acquired_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Decimal {
    let age_years = ((now - acquired_at).num_days() / 365).max(0);
    let depreciation = Decimal::from(age_years) * Decimal::new(10, 2);
    let factor = (Decimal::ONE - depreciation).max(Decimal::new(10, 2));
    (replacement_cost * factor).round_dp(2)
}

/// Everything the desk needs to hand back after a return
#[derive(Debug)]
pub struct ReturnSummary {
    pub borrow: Borrow,
    pub fine: FineAssessment,
    pub damage_report: Option<DamageReport>,
}

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    events: EventBus,
}

impl CirculationService {
    pub fn new(repository: Repository, events: EventBus) -> Self {
        Self { repository, events }
    }

    /// Open borrows for a user, with the derived overdue flag
    pub async fn get_user_borrows(&self, user_id: i32) -> AppResult<Vec<BorrowDetails>> {
        self.repository.users.get_by_id(user_id).await?;
        let now = Utc::now();
        let borrows = self.repository.borrows.list_open_for_user(user_id).await?;
        Ok(borrows.into_iter().map(|b| b.into_details(now)).collect())
    }

    /// Borrow a copy
    pub async fn borrow(&self, request: CreateBorrow) -> AppResult<Borrow> {
        let acting = self.repository.users.get_by_id(request.user_id).await?;
        let delegate = match request.on_behalf_of {
            Some(id) => Some(self.repository.users.get_by_id(id).await?),
            None => None,
        };
        let (billed_id, beneficiary_id) =
            resolve_effective_borrower(&acting, delegate.as_ref())?;
        let billed = if billed_id == acting.id {
            acting
        } else {
            self.repository.users.get_by_id(billed_id).await?
        };

        let library = self.repository.libraries.get_by_id(request.library_id).await?;
        if !library.active {
            return Err(AppError::InvalidState(format!(
                "Library {} is not active",
                library.id
            )));
        }

        let copy = self.lookup_copy(&request).await?;

        // Limit check runs against the billed account, after delegation
        let open = self.repository.borrows.count_open_for_user(billed_id).await?;
        if open >= billed.borrow_limit as i64 {
            return Err(AppError::LimitExceeded(format!(
                "User {} already has {}/{} open borrows",
                billed_id, open, billed.borrow_limit
            )));
        }

        if !copy.is_borrowable_at(library.id) {
            return Err(AppError::InvalidState(format!(
                "Copy {} is not available at library {}",
                copy.code, library.id
            )));
        }

        // Reservation precedence: a queued edition only lends to the head of
        // the queue, and that reservation is consumed by this borrow.
        let now = Utc::now();
        let pending = self
            .repository
            .reservations
            .list_pending_for_edition(copy.edition_id)
            .await?;
        let fulfill_reservation_id =
            reservation_precedence(&pending, billed_id, beneficiary_id, now)?;

        if let Some(existing) = self.repository.borrows.find_open_by_copy(copy.id).await? {
            if existing.user_id == billed_id && existing.beneficiary_id == beneficiary_id {
                return Err(AppError::DuplicateLoan(format!(
                    "Copy {} is already on loan to this borrower",
                    copy.code
                )));
            }
        }

        let borrow = self
            .repository
            .borrows
            .create(&NewBorrow {
                user_id: billed_id,
                beneficiary_id,
                copy_id: copy.id,
                library_id: library.id,
                borrowed_at: now,
                due_at: now + Duration::days(library.loan_period_days as i64),
                condition_at_borrow: copy.condition,
                fulfill_reservation_id,
            })
            .await?;

        tracing::info!(
            borrow_id = borrow.id,
            copy_id = copy.id,
            user_id = billed_id,
            beneficiary_id,
            "copy borrowed"
        );
        Ok(borrow)
    }

    /// Return a copy
    pub async fn return_copy(
        &self,
        borrow_id: i32,
        request: ReturnBorrow,
    ) -> AppResult<ReturnSummary> {
        let borrow = self.repository.borrows.get_by_id(borrow_id).await?;
        if borrow.status != BorrowStatus::Borrowed
            || (borrow.user_id != request.user_id && borrow.beneficiary_id != request.user_id)
        {
            return Err(AppError::NotFound(format!(
                "No open borrow {} for user {}",
                borrow_id, request.user_id
            )));
        }

        let copy = self.repository.copies.get_by_id(borrow.copy_id).await?;
        let lending_library = self.repository.libraries.get_by_id(borrow.library_id).await?;
        let destination_id = match request.returned_to_library_id {
            Some(id) => self.repository.libraries.get_by_id(id).await?.id,
            None => lending_library.id,
        };

        // Fine is always scoped to the lending library's policy history
        let now = Utc::now();
        let policies = self
            .repository
            .fine_policies
            .list_for_library(borrow.library_id)
            .await?;
        let fine = calculate_fine(&policies, lending_library.default_fine_rate, borrow.due_at, now);

        let damaged = request.condition == Some(CopyCondition::Damaged);
        let outcome = if damaged {
            self.damage_outcome(&copy, now).await?
        } else if destination_id != borrow.library_id {
            CopyOutcome::CrossBranch {
                dropped_at_library_id: destination_id,
                ship_to_library_id: borrow.library_id,
            }
        } else {
            CopyOutcome::SameBranch {
                library_id: destination_id,
            }
        };

        let (borrow, damage_report) = self
            .repository
            .borrows
            .finalize_return(&ReturnFinalization {
                borrow_id,
                returned_at: now,
                returned_to_library_id: destination_id,
                condition: request.condition,
                notes: request.notes,
                fine: fine.clone(),
                outcome,
            })
            .await?;

        tracing::info!(
            borrow_id,
            copy_id = copy.id,
            fine = %fine.total,
            damaged,
            "copy returned"
        );

        // Next-in-line notification and the rebalance sweep are fire-and-
        // forget; a full outbox is logged, never surfaced to the caller.
        if !damaged {
            self.events.publish(CirculationEvent::ReturnCompleted {
                copy_id: copy.id,
                edition_id: copy.edition_id,
            });
        }

        Ok(ReturnSummary {
            borrow,
            fine,
            damage_report,
        })
    }

    async fn lookup_copy(&self, request: &CreateBorrow) -> AppResult<BookCopy> {
        if let Some(id) = request.copy_id {
            self.repository.copies.get_by_id(id).await
        } else if let Some(code) = &request.copy_code {
            self.repository.copies.get_by_code(code).await
        } else {
            Err(AppError::Validation(
                "copy_id or copy_code is required".to_string(),
            ))
        }
    }

    async fn damage_outcome(&self, copy: &BookCopy, now: DateTime<Utc>) -> AppResult<CopyOutcome> {
        let edition = self.repository.editions.get_by_id(copy.edition_id).await?;
        let fee = damage_fee(edition.replacement_cost, copy.acquired_at, now);
        let flagged_user_ids = self
            .repository
            .borrows
            .recent_borrower_ids(copy.id, DAMAGE_FLAG_LIMIT)
            .await?;
        Ok(CopyOutcome::Damaged {
            fee,
            flagged_user_ids,
        })
    }
}
