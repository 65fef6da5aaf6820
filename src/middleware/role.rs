//! Role-based authorization middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};

use crate::middleware::auth::AuthUser;
use crate::modules::auth::model::UserRole;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Middleware that rejects any caller whose access token does not carry the
/// admin role. Mounted as a route layer on the management routers.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;

    if auth_user.role() != UserRole::Admin {
        return Err(AppError::forbidden(anyhow::anyhow!("Access denied")));
    }

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}
