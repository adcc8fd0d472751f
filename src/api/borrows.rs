//! Circulation (borrow/return) endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow::{Borrow, BorrowDetails, CreateBorrow, ReturnBorrow},
        damage_report::DamageReport,
        fine_policy::FineAssessment,
    },
};

use super::AuthenticatedUser;

/// Borrow response with the calculated due date
#[derive(Serialize, ToSchema)]
pub struct BorrowResponse {
    /// Borrow ID
    pub id: i32,
    /// Due date (ISO 8601 format)
    pub due_at: DateTime<Utc>,
    /// Status message
    pub message: String,
}

/// Return response with the fine assessment
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
    pub borrow: Borrow,
    pub fine: FineAssessment,
    /// Present when the copy came back damaged
    pub damage_report: Option<DamageReport>,
}

/// Get open borrows for a specific user
#[utoipa::path(
    get,
    path = "/users/{id}/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's open borrows", body = Vec<BorrowDetails>),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<BorrowDetails>>> {
    // Patrons may list their own loans; staff may list anyone's
    if claims.user_id() != user_id {
        claims.require_staff()?;
    }

    let borrows = state.services.circulation.get_user_borrows(user_id).await?;
    Ok(Json(borrows))
}

/// Borrow a copy
#[utoipa::path(
    post,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = CreateBorrow,
    responses(
        (status = 201, description = "Copy borrowed", body = BorrowResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "User, copy or library not found"),
        (status = 409, description = "Borrower already holds this copy"),
        (status = 422, description = "Copy unavailable, limit reached or reserved for another user")
    )
)]
pub async fn create_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBorrow>,
) -> AppResult<(StatusCode, Json<BorrowResponse>)> {
    claims.require_staff()?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let borrow = state.services.circulation.borrow(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse {
            id: borrow.id,
            due_at: borrow.due_at,
            message: "Copy borrowed successfully".to_string(),
        }),
    ))
}

/// Return a borrowed copy
#[utoipa::path(
    post,
    path = "/borrows/{id}/return",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrow ID")
    ),
    request_body = ReturnBorrow,
    responses(
        (status = 200, description = "Copy returned", body = ReturnResponse),
        (status = 404, description = "No open borrow for this user"),
        (status = 422, description = "Borrow already returned")
    )
)]
pub async fn return_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(borrow_id): Path<i32>,
    Json(request): Json<ReturnBorrow>,
) -> AppResult<Json<ReturnResponse>> {
    claims.require_staff()?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let summary = state
        .services
        .circulation
        .return_copy(borrow_id, request)
        .await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        borrow: summary.borrow,
        fine: summary.fine,
        damage_report: summary.damage_report,
    }))
}
