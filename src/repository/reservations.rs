//! Reservations repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{MembershipTier, ReservationStatus},
        reservation::Reservation,
    },
};

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reservation by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))
    }

    /// Insert a pending reservation at the next sequence position.
    /// The partial unique index turns a concurrent duplicate into a clean
    /// DuplicatePending error.
    pub async fn create(
        &self,
        user_id: i32,
        edition_id: i32,
        preferred_library_id: Option<i32>,
        tier: MembershipTier,
        effective_priority: i32,
    ) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations
                (user_id, edition_id, preferred_library_id, position, status, tier_at_creation, effective_priority)
            SELECT $1, $2, $3, COALESCE(MAX(position), 0) + 1, $4, $5, $6
            FROM reservations WHERE edition_id = $2
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(edition_id)
        .bind(preferred_library_id)
        .bind(ReservationStatus::Pending)
        .bind(tier)
        .bind(effective_priority)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::DuplicatePending(
                "User already has a pending reservation for this edition".to_string(),
            ),
            _ => AppError::Database(e),
        })
    }

    /// Pending entries for an edition in queue order
    /// (effective_priority DESC, created_at ASC)
    pub async fn list_pending_for_edition(&self, edition_id: i32) -> AppResult<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT * FROM reservations
            WHERE edition_id = $1 AND status = $2
            ORDER BY effective_priority DESC, created_at ASC
            "#,
        )
        .bind(edition_id)
        .bind(ReservationStatus::Pending)
        .fetch_all(&self.pool)
        .await?;
        Ok(reservations)
    }

    /// All pending entries, for the batch priority pass
    pub async fn list_pending(&self) -> AppResult<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE status = $1 ORDER BY id",
        )
        .bind(ReservationStatus::Pending)
        .fetch_all(&self.pool)
        .await?;
        Ok(reservations)
    }

    /// Store a recomputed priority; the boost timestamp is only ever set,
    /// never overwritten or cleared.
    pub async fn update_priority(
        &self,
        id: i32,
        effective_priority: i32,
        boosted_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE reservations
            SET effective_priority = $1,
                priority_boosted_at = COALESCE(priority_boosted_at, $2),
                updated_at = now()
            WHERE id = $3
            "#,
        )
        .bind(effective_priority)
        .bind(boosted_at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Cancel a pending reservation. Returns false when it was not pending.
    pub async fn cancel(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE reservations SET status = $1, updated_at = now() WHERE id = $2 AND status = $3",
        )
        .bind(ReservationStatus::Cancelled)
        .bind(id)
        .bind(ReservationStatus::Pending)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
