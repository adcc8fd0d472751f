//! Business logic services

pub mod circulation;
pub mod events;
pub mod fines;
pub mod notifications;
pub mod rebalancer;
pub mod reservations;
pub mod shipments;

use std::sync::Arc;

use crate::error::AppResult;
use crate::repository::Repository;
use events::EventBus;
use notifications::NotificationDispatcher;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    repository: Repository,
    pub circulation: circulation::CirculationService,
    pub fines: fines::FinesService,
    pub reservations: reservations::ReservationsService,
    pub rebalancer: rebalancer::RebalancerService,
    pub shipments: shipments::ShipmentsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        dispatcher: Arc<dyn NotificationDispatcher>,
        events: EventBus,
    ) -> Self {
        Self {
            circulation: circulation::CirculationService::new(repository.clone(), events),
            fines: fines::FinesService::new(repository.clone()),
            reservations: reservations::ReservationsService::new(repository.clone(), dispatcher),
            rebalancer: rebalancer::RebalancerService::new(repository.clone()),
            shipments: shipments::ShipmentsService::new(repository.clone()),
            repository,
        }
    }

    /// Verify the database connection is usable, for the readiness probe
    pub async fn ping_database(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.repository.pool).await?;
        Ok(())
    }
}
