//! Shipment tracking endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::shipment::{Shipment, UpdateShipmentStatus},
};

use super::AuthenticatedUser;

/// Shipments not yet delivered
#[utoipa::path(
    get,
    path = "/shipments",
    tag = "shipments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Open shipments", body = Vec<Shipment>)
    )
)]
pub async fn list_open_shipments(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Shipment>>> {
    claims.require_staff()?;

    let shipments = state.services.shipments.list_open().await?;
    Ok(Json(shipments))
}

/// Advance a shipment one step along its chain
#[utoipa::path(
    put,
    path = "/shipments/{id}/status",
    tag = "shipments",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Shipment ID")
    ),
    request_body = UpdateShipmentStatus,
    responses(
        (status = 200, description = "Shipment updated", body = Shipment),
        (status = 404, description = "Shipment not found"),
        (status = 422, description = "Transition not allowed")
    )
)]
pub async fn update_shipment_status(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(shipment_id): Path<i32>,
    Json(request): Json<UpdateShipmentStatus>,
) -> AppResult<Json<Shipment>> {
    claims.require_staff()?;

    let shipment = state
        .services
        .shipments
        .update_status(shipment_id, request.status)
        .await?;
    Ok(Json(shipment))
}
