//! Borrows repository for database operations
//!
//! The multi-row circulation writes (borrow creation, return finalization)
//! live here so each runs in a single transaction with status-guarded
//! updates; concurrent attempts on the same copy cannot both succeed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow::Borrow,
        damage_report::DamageReport,
        enums::{BorrowStatus, CopyCondition, CopyStatus, ReservationStatus, ShipmentReason, ShipmentStatus},
        fine_policy::FineAssessment,
    },
};

/// Input for creating a borrow
#[derive(Debug)]
pub struct NewBorrow {
    /// Billed account (effective borrower)
    pub user_id: i32,
    pub beneficiary_id: i32,
    pub copy_id: i32,
    pub library_id: i32,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub condition_at_borrow: CopyCondition,
    /// Pending reservation consumed by this borrow, if any
    pub fulfill_reservation_id: Option<i32>,
}

/// What happens to the copy when a borrow is finalized
#[derive(Debug)]
pub enum CopyOutcome {
    /// Returned at the lending branch; copy goes straight back on the shelf
    SameBranch { library_id: i32 },
    /// Returned elsewhere; copy enters transit back to the lending branch
    CrossBranch {
        dropped_at_library_id: i32,
        ship_to_library_id: i32,
    },
    /// Returned damaged; copy is pulled and a damage report opened
    Damaged {
        fee: Decimal,
        flagged_user_ids: Vec<i32>,
    },
}

/// Fully computed return, ready to persist
#[derive(Debug)]
pub struct ReturnFinalization {
    pub borrow_id: i32,
    pub returned_at: DateTime<Utc>,
    pub returned_to_library_id: i32,
    pub condition: Option<CopyCondition>,
    pub notes: Option<String>,
    pub fine: FineAssessment,
    pub outcome: CopyOutcome,
}

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrow by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrow> {
        sqlx::query_as::<_, Borrow>("SELECT * FROM borrows WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow with id {} not found", id)))
    }

    /// Open borrows for a billed account or beneficiary
    pub async fn list_open_for_user(&self, user_id: i32) -> AppResult<Vec<Borrow>> {
        let borrows = sqlx::query_as::<_, Borrow>(
            r#"
            SELECT * FROM borrows
            WHERE (user_id = $1 OR beneficiary_id = $1) AND status = $2
            ORDER BY due_at
            "#,
        )
        .bind(user_id)
        .bind(BorrowStatus::Borrowed)
        .fetch_all(&self.pool)
        .await?;
        Ok(borrows)
    }

    /// Count open borrows charged against a billed account
    pub async fn count_open_for_user(&self, user_id: i32) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM borrows WHERE user_id = $1 AND status = $2")
                .bind(user_id)
                .bind(BorrowStatus::Borrowed)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// The open borrow on a copy, if any
    pub async fn find_open_by_copy(&self, copy_id: i32) -> AppResult<Option<Borrow>> {
        let borrow = sqlx::query_as::<_, Borrow>(
            "SELECT * FROM borrows WHERE copy_id = $1 AND status = $2",
        )
        .bind(copy_id)
        .bind(BorrowStatus::Borrowed)
        .fetch_optional(&self.pool)
        .await?;
        Ok(borrow)
    }

    /// Distinct beneficiaries of a copy's borrow history, most recent first,
    /// at most `limit`
    pub async fn recent_borrower_ids(&self, copy_id: i32, limit: usize) -> AppResult<Vec<i32>> {
        let ids: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT beneficiary_id FROM borrows
            WHERE copy_id = $1
            GROUP BY beneficiary_id
            ORDER BY MAX(borrowed_at) DESC
            LIMIT $2
            "#,
        )
        .bind(copy_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Create a borrow: flip the copy, consume the winning reservation (if
    /// any) and insert the loan row, all in one transaction. The copy flip is
    /// guarded on (status, current_library) so a concurrent borrow of the
    /// same copy loses the race cleanly.
    pub async fn create(&self, new: &NewBorrow) -> AppResult<Borrow> {
        let mut tx = self.pool.begin().await?;

        let flipped = sqlx::query(
            "UPDATE copies SET status = $1 WHERE id = $2 AND status = $3 AND current_library_id = $4",
        )
        .bind(CopyStatus::Borrowed)
        .bind(new.copy_id)
        .bind(CopyStatus::Available)
        .bind(new.library_id)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            return Err(AppError::InvalidState(
                "Copy is not available at this library".to_string(),
            ));
        }

        if let Some(reservation_id) = new.fulfill_reservation_id {
            let fulfilled = sqlx::query(
                "UPDATE reservations SET status = $1, updated_at = now() WHERE id = $2 AND status = $3",
            )
            .bind(ReservationStatus::Fulfilled)
            .bind(reservation_id)
            .bind(ReservationStatus::Pending)
            .execute(&mut *tx)
            .await?;

            if fulfilled.rows_affected() == 0 {
                return Err(AppError::InvalidState(
                    "Reservation is no longer pending".to_string(),
                ));
            }
        }

        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            INSERT INTO borrows
                (user_id, beneficiary_id, copy_id, library_id, borrowed_at, due_at, status, condition_at_borrow)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(new.beneficiary_id)
        .bind(new.copy_id)
        .bind(new.library_id)
        .bind(new.borrowed_at)
        .bind(new.due_at)
        .bind(BorrowStatus::Borrowed)
        .bind(new.condition_at_borrow)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::DuplicateLoan("Copy already has an open loan".to_string())
            }
            _ => AppError::Database(e),
        })?;

        tx.commit().await?;
        Ok(borrow)
    }

    /// Finalize a return: stamp the borrow, apply the copy outcome and insert
    /// the follow-up row (shipment or damage report) in one transaction.
    pub async fn finalize_return(
        &self,
        f: &ReturnFinalization,
    ) -> AppResult<(Borrow, Option<DamageReport>)> {
        let mut tx = self.pool.begin().await?;

        let returned_condition = match &f.outcome {
            CopyOutcome::Damaged { .. } => Some(CopyCondition::Damaged),
            _ => f.condition,
        };

        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            UPDATE borrows
            SET status = $1, returned_at = $2, fine_amount = $3, fine_breakdown = $4,
                returned_to_library_id = $5, condition_at_return = $6,
                notes = COALESCE($7, notes)
            WHERE id = $8 AND status = $9
            RETURNING *
            "#,
        )
        .bind(BorrowStatus::Returned)
        .bind(f.returned_at)
        .bind(f.fine.total)
        .bind(Json(&f.fine.breakdown))
        .bind(f.returned_to_library_id)
        .bind(returned_condition)
        .bind(&f.notes)
        .bind(f.borrow_id)
        .bind(BorrowStatus::Borrowed)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::InvalidState("Borrow is already returned".to_string()))?;

        let mut damage_report = None;

        match &f.outcome {
            CopyOutcome::SameBranch { library_id } => {
                self.flip_copy(
                    &mut tx,
                    borrow.copy_id,
                    CopyStatus::Available,
                    *library_id,
                    f.condition,
                )
                .await?;
            }
            CopyOutcome::CrossBranch {
                dropped_at_library_id,
                ship_to_library_id,
            } => {
                self.flip_copy(
                    &mut tx,
                    borrow.copy_id,
                    CopyStatus::InTransit,
                    *dropped_at_library_id,
                    f.condition,
                )
                .await?;

                sqlx::query(
                    r#"
                    INSERT INTO shipments (copy_id, from_library_id, to_library_id, reason, status, created_by)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(borrow.copy_id)
                .bind(dropped_at_library_id)
                .bind(ship_to_library_id)
                .bind(ShipmentReason::InterLibraryReturn)
                .bind(ShipmentStatus::Pending)
                .bind(borrow.user_id)
                .execute(&mut *tx)
                .await?;
            }
            CopyOutcome::Damaged {
                fee,
                flagged_user_ids,
            } => {
                sqlx::query(
                    "UPDATE copies SET status = $1, condition = $2 WHERE id = $3 AND status = $4",
                )
                .bind(CopyStatus::DamagedPulled)
                .bind(CopyCondition::Damaged)
                .bind(borrow.copy_id)
                .bind(CopyStatus::Borrowed)
                .execute(&mut *tx)
                .await?;

                let report = sqlx::query_as::<_, DamageReport>(
                    r#"
                    INSERT INTO damage_reports (copy_id, borrow_id, damage_fee, flagged_user_ids, notes)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING *
                    "#,
                )
                .bind(borrow.copy_id)
                .bind(borrow.id)
                .bind(fee)
                .bind(Json(flagged_user_ids))
                .bind(&f.notes)
                .fetch_one(&mut *tx)
                .await?;
                damage_report = Some(report);
            }
        }

        tx.commit().await?;
        Ok((borrow, damage_report))
    }

    async fn flip_copy(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        copy_id: i32,
        status: CopyStatus,
        current_library_id: i32,
        condition: Option<CopyCondition>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE copies
            SET status = $1, current_library_id = $2, condition = COALESCE($3, condition)
            WHERE id = $4 AND status = $5
            "#,
        )
        .bind(status)
        .bind(current_library_id)
        .bind(condition)
        .bind(copy_id)
        .bind(CopyStatus::Borrowed)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
