//! Inventory Rebalancer
//!
//! Detects per-edition imbalance across active branches and schedules
//! shipments to fix it. The planner is a pure function over an immutable
//! snapshot so it is unit-testable and deterministic: re-running it against
//! unchanged data reproduces the same shipments.

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::enums::{CopyStatus, ShipmentReason},
    repository::Repository,
};

/// Per-branch holdings of one edition.
///
/// The rebalance denominator counts copies in circulation (available or
/// borrowed); in-transit and pulled copies are excluded so a copy already
/// moving does not double-count against its destination.
#[derive(Debug, Clone, Default)]
pub struct LibraryHoldings {
    /// Copy ids currently on the shelf, in stable id order
    pub available_copy_ids: Vec<i32>,
    pub borrowed: u32,
}

impl LibraryHoldings {
    pub fn total(&self) -> usize {
        self.available_copy_ids.len() + self.borrowed as usize
    }
}

/// Immutable per-edition snapshot; map insertion order is sorted library id
#[derive(Debug, Clone)]
pub struct EditionSnapshot {
    pub edition_id: i32,
    pub holdings: IndexMap<i32, LibraryHoldings>,
}

/// One planned copy movement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentOrder {
    pub copy_id: i32,
    pub from_library_id: i32,
    pub to_library_id: i32,
}

/// Operator report for one rebalanced edition
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RebalanceReport {
    pub edition_id: i32,
    pub shipments_created: u32,
    pub pairs: Vec<ShipmentPair>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShipmentPair {
    pub from_library_id: i32,
    pub to_library_id: i32,
}

/// First-fit greedy pass for one edition.
///
/// A branch is empty at zero copies and overloaded above a 60% share of the
/// edition's in-circulation copies. Each overloaded branch donates from its
/// available pool only (never a borrowed copy), one copy per empty branch,
/// until either the pool or the empty list runs out. Not globally optimal;
/// deterministic for a given snapshot.
pub fn plan_edition(snapshot: &EditionSnapshot) -> Vec<ShipmentOrder> {
    let total: usize = snapshot.holdings.values().map(LibraryHoldings::total).sum();
    if total < 2 {
        return Vec::new();
    }

    let empties: Vec<i32> = snapshot
        .holdings
        .iter()
        .filter(|(_, h)| h.total() == 0)
        .map(|(id, _)| *id)
        .collect();
    // share > 60%, in integer arithmetic
    let overloaded: Vec<i32> = snapshot
        .holdings
        .iter()
        .filter(|(_, h)| h.total() * 5 > total * 3)
        .map(|(id, _)| *id)
        .collect();

    if empties.is_empty() || overloaded.is_empty() {
        return Vec::new();
    }

    let mut orders = Vec::new();
    let mut empties = empties.into_iter();
    let mut next_empty = empties.next();

    for from in overloaded {
        let pool = &snapshot.holdings[&from].available_copy_ids;
        for &copy_id in pool {
            let Some(to) = next_empty else {
                return orders;
            };
            orders.push(ShipmentOrder {
                copy_id,
                from_library_id: from,
                to_library_id: to,
            });
            next_empty = empties.next();
        }
    }

    orders
}

#[derive(Clone)]
pub struct RebalancerService {
    repository: Repository,
}

impl RebalancerService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Full consortium pass: snapshot every edition with at least two
    /// in-circulation copies, plan, and execute. Safe to re-run from
    /// scratch; copies that moved since the snapshot are skipped.
    pub async fn run_sweep(&self) -> AppResult<Vec<RebalanceReport>> {
        let snapshots = self.build_snapshots().await?;
        let mut reports = Vec::new();

        for snapshot in snapshots {
            let orders = plan_edition(&snapshot);
            if orders.is_empty() {
                continue;
            }

            let mut pairs = Vec::new();
            for order in orders {
                // Guarded flip: lose the race, skip the shipment
                let flipped = self
                    .repository
                    .copies
                    .mark_in_transit(order.copy_id, order.from_library_id)
                    .await?;
                if !flipped {
                    tracing::debug!(
                        copy_id = order.copy_id,
                        "copy moved since snapshot; skipping rebalance shipment"
                    );
                    continue;
                }
                self.repository
                    .shipments
                    .create(
                        order.copy_id,
                        order.from_library_id,
                        order.to_library_id,
                        ShipmentReason::Rebalancing,
                        None,
                    )
                    .await?;
                pairs.push(ShipmentPair {
                    from_library_id: order.from_library_id,
                    to_library_id: order.to_library_id,
                });
            }

            if !pairs.is_empty() {
                tracing::info!(
                    edition_id = snapshot.edition_id,
                    shipments = pairs.len(),
                    "rebalance shipments scheduled"
                );
                reports.push(RebalanceReport {
                    edition_id: snapshot.edition_id,
                    shipments_created: pairs.len() as u32,
                    pairs,
                });
            }
        }

        Ok(reports)
    }

    async fn build_snapshots(&self) -> AppResult<Vec<EditionSnapshot>> {
        let libraries = self.repository.libraries.list_active().await?;
        let rows = self.repository.copies.list_in_circulation().await?;

        let mut snapshots: Vec<EditionSnapshot> = Vec::new();
        for row in rows {
            if snapshots.last().map(|s| s.edition_id) != Some(row.edition_id) {
                let mut holdings = IndexMap::new();
                for library in &libraries {
                    holdings.insert(library.id, LibraryHoldings::default());
                }
                snapshots.push(EditionSnapshot {
                    edition_id: row.edition_id,
                    holdings,
                });
            }
            let snapshot = snapshots.last_mut().expect("snapshot just pushed");
            let entry = snapshot.holdings.entry(row.current_library_id).or_default();
            match row.status {
                CopyStatus::Available => entry.available_copy_ids.push(row.id),
                CopyStatus::Borrowed => entry.borrowed += 1,
                _ => {}
            }
        }

        snapshots.retain(|s| s.holdings.values().map(LibraryHoldings::total).sum::<usize>() >= 2);
        Ok(snapshots)
    }
}
