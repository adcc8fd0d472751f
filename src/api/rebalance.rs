//! Inventory rebalancing endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, services::rebalancer::RebalanceReport};

use super::AuthenticatedUser;

/// Trigger a full consortium rebalance sweep
#[utoipa::path(
    post,
    path = "/rebalance",
    tag = "rebalance",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sweep finished; one report per rebalanced edition", body = Vec<RebalanceReport>)
    )
)]
pub async fn trigger_rebalance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<RebalanceReport>>> {
    claims.require_staff()?;

    let reports = state.services.rebalancer.run_sweep().await?;
    Ok(Json(reports))
}
