//! User directory model and API claims

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::MembershipTier;
use crate::error::{AppError, AppResult};

/// A patron account. Read-only for the circulation core; registration and
/// profile management live elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub tier: MembershipTier,
    /// Maximum concurrent open borrows charged to this account
    pub borrow_limit: i32,
    /// Set on verified child accounts; loans bill the parent
    pub parent_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// JWT claims extracted from the Authorization header.
/// Token issuance is handled by the gateway; this server only validates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// User id
    pub sub: i32,
    /// Role: "patron", "staff" or "admin"
    pub role: String,
    pub exp: usize,
}

impl UserClaims {
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let data = decode::<UserClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }

    pub fn user_id(&self) -> i32 {
        self.sub
    }

    pub fn is_staff(&self) -> bool {
        self.role == "staff" || self.role == "admin"
    }

    pub fn require_staff(&self) -> AppResult<()> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Staff privileges required".to_string(),
            ))
        }
    }
}
