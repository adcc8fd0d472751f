//! Reservation endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::reservation::{CreateReservation, RecalculateOutcome, Reservation},
};

use super::AuthenticatedUser;

/// Create a reservation for the authenticated user
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = CreateReservation,
    responses(
        (status = 201, description = "Reservation created", body = Reservation),
        (status = 404, description = "Edition or library not found"),
        (status = 409, description = "User already has a pending reservation"),
        (status = 422, description = "Copies are currently available")
    )
)]
pub async fn create_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateReservation>,
) -> AppResult<(StatusCode, Json<Reservation>)> {
    let reservation = state
        .services
        .reservations
        .create(claims.user_id(), request)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Cancel a pending reservation
#[utoipa::path(
    post,
    path = "/reservations/{id}/cancel",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Reservation cancelled", body = Reservation),
        (status = 403, description = "Not the reservation holder"),
        (status = 404, description = "Reservation not found"),
        (status = 422, description = "Reservation is not pending")
    )
)]
pub async fn cancel_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(reservation_id): Path<i32>,
) -> AppResult<Json<Reservation>> {
    let reservation = state
        .services
        .reservations
        .cancel(reservation_id, claims.user_id())
        .await?;
    Ok(Json(reservation))
}

/// Run the batch priority pass over all pending reservations
#[utoipa::path(
    post,
    path = "/reservations/recalculate",
    tag = "reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Priority pass finished", body = RecalculateOutcome)
    )
)]
pub async fn recalculate_priorities(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<RecalculateOutcome>> {
    claims.require_staff()?;

    let outcome = state.services.reservations.recalculate_priorities().await?;
    Ok(Json(outcome))
}
