//! Copies repository for database operations

use sqlx::{FromRow, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        copy::BookCopy,
        enums::CopyStatus,
    },
};

/// Minimal row for building rebalance snapshots
#[derive(Debug, Clone, FromRow)]
pub struct CirculationRow {
    pub id: i32,
    pub edition_id: i32,
    pub current_library_id: i32,
    pub status: CopyStatus,
}

#[derive(Clone)]
pub struct CopiesRepository {
    pool: Pool<Postgres>,
}

impl CopiesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get copy by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<BookCopy> {
        sqlx::query_as::<_, BookCopy>("SELECT * FROM copies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Copy with id {} not found", id)))
    }

    /// Get copy by barcode
    pub async fn get_by_code(&self, code: &str) -> AppResult<BookCopy> {
        sqlx::query_as::<_, BookCopy>("SELECT * FROM copies WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Copy with code {} not found", code)))
    }

    /// Count currently available copies of an edition across all branches
    pub async fn count_available_for_edition(&self, edition_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM copies WHERE edition_id = $1 AND status = $2",
        )
        .bind(edition_id)
        .bind(CopyStatus::Available)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// All in-circulation copies (available or borrowed) at active branches,
    /// in stable (edition, copy) order for deterministic rebalancing.
    pub async fn list_in_circulation(&self) -> AppResult<Vec<CirculationRow>> {
        let rows = sqlx::query_as::<_, CirculationRow>(
            r#"
            SELECT c.id, c.edition_id, c.current_library_id, c.status
            FROM copies c
            JOIN libraries l ON l.id = c.current_library_id
            WHERE c.status IN ($1, $2) AND l.active
            ORDER BY c.edition_id, c.id
            "#,
        )
        .bind(CopyStatus::Available)
        .bind(CopyStatus::Borrowed)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Flip an available copy to in-transit, guarded on its current state.
    /// Returns false when the copy moved since the snapshot was taken.
    pub async fn mark_in_transit(&self, copy_id: i32, expected_library_id: i32) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE copies SET status = $1 WHERE id = $2 AND status = $3 AND current_library_id = $4",
        )
        .bind(CopyStatus::InTransit)
        .bind(copy_id)
        .bind(CopyStatus::Available)
        .bind(expected_library_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
