//! Shipments repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{CopyStatus, ShipmentReason, ShipmentStatus},
        shipment::Shipment,
    },
};

#[derive(Clone)]
pub struct ShipmentsRepository {
    pool: Pool<Postgres>,
}

impl ShipmentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get shipment by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Shipment> {
        sqlx::query_as::<_, Shipment>("SELECT * FROM shipments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Shipment with id {} not found", id)))
    }

    /// Shipments not yet delivered, oldest first
    pub async fn list_open(&self) -> AppResult<Vec<Shipment>> {
        let shipments = sqlx::query_as::<_, Shipment>(
            "SELECT * FROM shipments WHERE status <> $1 ORDER BY created_at",
        )
        .bind(ShipmentStatus::Delivered)
        .fetch_all(&self.pool)
        .await?;
        Ok(shipments)
    }

    /// Create a pending shipment
    pub async fn create(
        &self,
        copy_id: i32,
        from_library_id: i32,
        to_library_id: i32,
        reason: ShipmentReason,
        created_by: Option<i32>,
    ) -> AppResult<Shipment> {
        let shipment = sqlx::query_as::<_, Shipment>(
            r#"
            INSERT INTO shipments (copy_id, from_library_id, to_library_id, reason, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(copy_id)
        .bind(from_library_id)
        .bind(to_library_id)
        .bind(reason)
        .bind(ShipmentStatus::Pending)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(shipment)
    }

    /// Advance a shipment one step, guarded on the expected current status.
    /// Delivery re-admits the copy at the destination in the same
    /// transaction; that is the only path returning an in-transit copy to
    /// circulation.
    pub async fn advance(
        &self,
        id: i32,
        expected: ShipmentStatus,
        next: ShipmentStatus,
    ) -> AppResult<Shipment> {
        let mut tx = self.pool.begin().await?;

        let shipment = sqlx::query_as::<_, Shipment>(
            r#"
            UPDATE shipments
            SET status = $1,
                delivered_at = CASE WHEN $1 = $2 THEN now() ELSE delivered_at END
            WHERE id = $3 AND status = $4
            RETURNING *
            "#,
        )
        .bind(next)
        .bind(ShipmentStatus::Delivered)
        .bind(id)
        .bind(expected)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::InvalidState(format!("Shipment is no longer {}", expected))
        })?;

        if next == ShipmentStatus::Delivered {
            let readmitted = sqlx::query(
                "UPDATE copies SET status = $1, current_library_id = $2 WHERE id = $3 AND status = $4",
            )
            .bind(CopyStatus::Available)
            .bind(shipment.to_library_id)
            .bind(shipment.copy_id)
            .bind(CopyStatus::InTransit)
            .execute(&mut *tx)
            .await?;

            if readmitted.rows_affected() == 0 {
                return Err(AppError::InvalidState(
                    "Copy is not in transit; cannot deliver".to_string(),
                ));
            }
        }

        tx.commit().await?;
        Ok(shipment)
    }
}
