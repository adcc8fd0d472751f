//! Fine policies repository for database operations

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::fine_policy::FinePolicy,
};

/// The day a superseded open policy closes. A new policy must start strictly
/// after the open one, which then covers through `new_from - 1 day`, keeping
/// the two windows adjacent with no overlap.
pub(crate) fn succession_close_date(
    open_from: NaiveDate,
    new_from: NaiveDate,
) -> AppResult<NaiveDate> {
    if new_from <= open_from {
        return Err(AppError::Validation(format!(
            "New policy must start after {} (current open policy)",
            open_from
        )));
    }
    Ok(new_from - Duration::days(1))
}

#[derive(Clone)]
pub struct FinePoliciesRepository {
    pool: Pool<Postgres>,
}

impl FinePoliciesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// All policies for a library, oldest first
    pub async fn list_for_library(&self, library_id: i32) -> AppResult<Vec<FinePolicy>> {
        let policies = sqlx::query_as::<_, FinePolicy>(
            "SELECT * FROM fine_policies WHERE library_id = $1 ORDER BY effective_from",
        )
        .bind(library_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(policies)
    }

    /// Insert a new open-ended policy, closing the previous open one at
    /// `effective_from - 1 day` in the same transaction. The partial unique
    /// index on (library_id) WHERE effective_to IS NULL makes concurrent
    /// creations race-safe.
    pub async fn create(
        &self,
        library_id: i32,
        daily_rate: Decimal,
        effective_from: NaiveDate,
    ) -> AppResult<FinePolicy> {
        let mut tx = self.pool.begin().await?;

        let open = sqlx::query_as::<_, FinePolicy>(
            "SELECT * FROM fine_policies WHERE library_id = $1 AND effective_to IS NULL FOR UPDATE",
        )
        .bind(library_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(open) = open {
            let close_at = succession_close_date(open.effective_from, effective_from)?;
            sqlx::query("UPDATE fine_policies SET effective_to = $1 WHERE id = $2")
                .bind(close_at)
                .bind(open.id)
                .execute(&mut *tx)
                .await?;
        }

        let policy = sqlx::query_as::<_, FinePolicy>(
            r#"
            INSERT INTO fine_policies (library_id, daily_rate, effective_from)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(library_id)
        .bind(daily_rate)
        .bind(effective_from)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_open_policy_closes_day_before_new_start() {
        let close = succession_close_date(date(2024, 1, 1), date(2024, 3, 15)).unwrap();
        assert_eq!(close, date(2024, 3, 14));
    }

    #[test]
    fn test_close_date_crosses_month_and_year_boundaries() {
        let close = succession_close_date(date(2023, 6, 1), date(2024, 1, 1)).unwrap();
        assert_eq!(close, date(2023, 12, 31));
        // Leap day
        let close = succession_close_date(date(2024, 1, 1), date(2024, 3, 1)).unwrap();
        assert_eq!(close, date(2024, 2, 29));
    }

    #[test]
    fn test_new_policy_must_start_strictly_after_open_one() {
        let err = succession_close_date(date(2024, 3, 15), date(2024, 3, 15)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = succession_close_date(date(2024, 3, 15), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
