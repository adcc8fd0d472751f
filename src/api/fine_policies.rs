//! Fine policy endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::fine_policy::FinePolicy};

use super::AuthenticatedUser;

/// Create fine policy request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFinePolicyRequest {
    /// Daily fine rate in the consortium currency
    #[schema(value_type = String)]
    pub daily_rate: Decimal,
    /// First day the rate applies
    pub effective_from: NaiveDate,
}

/// Fine policy history for a library
#[utoipa::path(
    get,
    path = "/libraries/{id}/fine-policies",
    tag = "fine-policies",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Library ID")
    ),
    responses(
        (status = 200, description = "Policies, oldest first", body = Vec<FinePolicy>),
        (status = 404, description = "Library not found")
    )
)]
pub async fn get_fine_policies(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(library_id): Path<i32>,
) -> AppResult<Json<Vec<FinePolicy>>> {
    claims.require_staff()?;

    let policies = state.services.fines.get_policies(library_id).await?;
    Ok(Json(policies))
}

/// Create a new fine policy, closing the currently open one
#[utoipa::path(
    post,
    path = "/libraries/{id}/fine-policies",
    tag = "fine-policies",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Library ID")
    ),
    request_body = CreateFinePolicyRequest,
    responses(
        (status = 201, description = "Policy created", body = FinePolicy),
        (status = 400, description = "Invalid rate or start date"),
        (status = 404, description = "Library not found")
    )
)]
pub async fn create_fine_policy(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(library_id): Path<i32>,
    Json(request): Json<CreateFinePolicyRequest>,
) -> AppResult<(StatusCode, Json<FinePolicy>)> {
    claims.require_staff()?;

    let policy = state
        .services
        .fines
        .create_policy(library_id, request.daily_rate, request.effective_from)
        .await?;
    Ok((StatusCode::CREATED, Json(policy)))
}
