//! Library directory repository (read-only lookups)

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::library::Library,
};

#[derive(Clone)]
pub struct LibrariesRepository {
    pool: Pool<Postgres>,
}

impl LibrariesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get library by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Library> {
        sqlx::query_as::<_, Library>("SELECT * FROM libraries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Library with id {} not found", id)))
    }

    /// List active branches, in stable id order
    pub async fn list_active(&self) -> AppResult<Vec<Library>> {
        let libraries =
            sqlx::query_as::<_, Library>("SELECT * FROM libraries WHERE active ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(libraries)
    }
}
