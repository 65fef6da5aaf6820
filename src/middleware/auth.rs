use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::modules::auth::model::{AccessClaims, UserRole};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::verify_access_token;

/// Extractor that validates the bearer access token and exposes its claims.
#[derive(Debug)]
pub struct AuthUser(pub AccessClaims);

impl AuthUser {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid user ID in token")))
    }

    pub fn role(&self) -> UserRole {
        self.0.role
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::unauthorized(anyhow::anyhow!("Missing authorization header"))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized(anyhow::anyhow!("Invalid authorization header format"))
        })?;

        let claims = verify_access_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}
