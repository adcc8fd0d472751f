//! Post-commit circulation events
//!
//! Cross-module side effects of a return (next-in-line notification, the
//! rebalance sweep) run on a background worker fed by this outbox channel.
//! Publishing never blocks or fails the committing request; worker failures
//! are logged and swallowed.

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::services::Services;

#[derive(Debug, Clone)]
pub enum CirculationEvent {
    ReturnCompleted { copy_id: i32, edition_id: i32 },
}

/// Sending half of the outbox
#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::Sender<CirculationEvent>,
}

impl EventBus {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<CirculationEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    /// Fire-and-forget publish; a full or closed channel only logs
    pub fn publish(&self, event: CirculationEvent) {
        if let Err(e) = self.tx.try_send(event) {
            tracing::warn!("dropping circulation event: {}", e);
        }
    }
}

/// Consume circulation events until the bus closes
pub fn spawn_worker(
    mut rx: mpsc::Receiver<CirculationEvent>,
    services: Arc<Services>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let event_id = Uuid::new_v4();
            match event {
                CirculationEvent::ReturnCompleted { copy_id, edition_id } => {
                    tracing::debug!(%event_id, copy_id, edition_id, "processing return event");

                    match services.reservations.check_and_notify_next_user(edition_id).await {
                        Ok(Some(reservation_id)) => {
                            tracing::info!(%event_id, reservation_id, "next-in-line notified")
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::warn!(%event_id, edition_id, "reservation notification failed: {}", e)
                        }
                    }

                    match services.rebalancer.run_sweep().await {
                        Ok(reports) => tracing::debug!(
                            %event_id,
                            editions_touched = reports.len(),
                            "rebalance sweep finished"
                        ),
                        Err(e) => tracing::warn!(%event_id, "rebalance sweep failed: {}", e),
                    }
                }
            }
        }
        tracing::debug!("circulation event worker stopped");
    })
}
