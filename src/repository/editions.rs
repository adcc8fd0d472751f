//! Edition catalog repository (read-only lookups)

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::edition::Edition,
};

#[derive(Clone)]
pub struct EditionsRepository {
    pool: Pool<Postgres>,
}

impl EditionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get edition by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Edition> {
        sqlx::query_as::<_, Edition>("SELECT * FROM editions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Edition with id {} not found", id)))
    }
}
