use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    ChangePasswordDto, LoginRequest, LoginResponse, LogoutRequest, MeResponse, MessageResponse,
    RefreshRequest, RefreshResponse, RegisterRequestDto, User,
};
use super::service::AuthService;

/// Register a new credential record.
#[instrument(skip(state, dto))]
pub async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = AuthService::register(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Login and receive an access/refresh token pair plus the session's tokenId.
#[instrument(skip(state, dto))]
pub async fn login_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response =
        AuthService::login(&state.db, state.sessions.as_ref(), &state.jwt_config, dto).await?;
    Ok(Json(response))
}

/// Exchange a refresh token for a new token pair (rotates the stored token).
#[instrument(skip(state, dto))]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    let response =
        AuthService::refresh(&state.db, state.sessions.as_ref(), &state.jwt_config, dto).await?;
    Ok(Json(response))
}

/// Identity of the bearer token's holder.
#[instrument(skip(auth_user))]
pub async fn me(auth_user: AuthUser) -> Result<Json<MeResponse>, AppError> {
    Ok(Json(MeResponse {
        user_id: auth_user.user_id()?.to_string(),
        role: auth_user.role(),
    }))
}

/// Revoke one device session. Idempotent.
#[instrument(skip(state, auth_user, dto))]
pub async fn logout_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<LogoutRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::logout(state.sessions.as_ref(), auth_user.user_id()?, dto.token_id).await?;
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// Change the caller's password; revokes all refresh sessions on success.
#[instrument(skip(state, auth_user, dto))]
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<ChangePasswordDto>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::change_password(
        &state.db,
        state.sessions.as_ref(),
        auth_user.user_id()?,
        dto,
    )
    .await?;
    Ok(Json(MessageResponse {
        message: "Password changed".to_string(),
    }))
}
