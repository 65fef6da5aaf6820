//! Token service: stateless mint and verify for access and refresh tokens.
//!
//! Access and refresh tokens are signed with independent secrets and
//! independent expiries, so a leaked refresh token cannot mint access tokens
//! without going through rotation, and either secret can be rotated on its
//! own.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::modules::auth::model::{AccessClaims, RefreshClaims, UserRole};
use crate::utils::errors::AppError;

/// Creates a short-lived access token carrying `{userId, role}`.
pub fn create_access_token(
    user_id: Uuid,
    role: UserRole,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let exp = now + jwt_config.access_token_expiry;

    let claims = AccessClaims {
        sub: user_id.to_string(),
        role,
        exp: exp as usize,
        iat: now as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.access_secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create access token: {}", e)))
}

/// Creates a long-lived refresh token carrying only `{userId}`.
pub fn create_refresh_token(user_id: Uuid, jwt_config: &JwtConfig) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let exp = now + jwt_config.refresh_token_expiry;

    let claims = RefreshClaims {
        sub: user_id.to_string(),
        exp: exp as usize,
        iat: now as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.refresh_secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create refresh token: {}", e)))
}

/// Verifies an access token signature and expiry.
pub fn verify_access_token(token: &str, jwt_config: &JwtConfig) -> Result<AccessClaims, AppError> {
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.access_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| unauthorized_for(&e, "access"))
}

/// Verifies a refresh token signature and expiry.
pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshClaims, AppError> {
    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.refresh_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| unauthorized_for(&e, "refresh"))
}

fn unauthorized_for(err: &jsonwebtoken::errors::Error, kind: &str) -> AppError {
    match err.kind() {
        ErrorKind::ExpiredSignature => {
            AppError::unauthorized(anyhow::anyhow!("The {} token has expired", kind))
        }
        _ => AppError::unauthorized(anyhow::anyhow!("Invalid {} token", kind)),
    }
}
