//! Shipment Tracker
//!
//! Shipments move through PENDING → IN_TRANSIT → DELIVERED, one step at a
//! time. Delivery is what puts an in-transit copy back on a shelf.

use crate::{
    error::{AppError, AppResult},
    models::shipment::Shipment,
    models::enums::ShipmentStatus,
    repository::Repository,
};

#[derive(Clone)]
pub struct ShipmentsService {
    repository: Repository,
}

impl ShipmentsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Shipments not yet delivered
    pub async fn list_open(&self) -> AppResult<Vec<Shipment>> {
        self.repository.shipments.list_open().await
    }

    /// Manually advance a shipment to the requested status. Only the next
    /// step in the linear chain is accepted; on delivery the copy re-enters
    /// circulation at the destination branch.
    pub async fn update_status(
        &self,
        shipment_id: i32,
        requested: ShipmentStatus,
    ) -> AppResult<Shipment> {
        let shipment = self.repository.shipments.get_by_id(shipment_id).await?;
        if !shipment.status.can_transition_to(requested) {
            return Err(AppError::InvalidState(format!(
                "Shipment {} cannot move from {} to {}",
                shipment_id, shipment.status, requested
            )));
        }

        let updated = self
            .repository
            .shipments
            .advance(shipment_id, shipment.status, requested)
            .await?;

        tracing::info!(
            shipment_id,
            copy_id = updated.copy_id,
            status = %updated.status,
            "shipment advanced"
        );
        Ok(updated)
    }
}
