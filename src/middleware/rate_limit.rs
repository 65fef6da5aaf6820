//! Per-IP login rate limiting.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;
use crate::utils::errors::AppError;

/// Middleware guarding the login route. Consumes one token from the
/// caller's bucket; an empty bucket is a 429.
///
/// Requests without connection info (router driven directly in tests) fall
/// back to a single shared key.
pub async fn login_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|connect_info| connect_info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    if state.login_limiter.check_key(&ip).is_err() {
        return Err(AppError::too_many_requests(anyhow::anyhow!(
            "Too many login attempts. Try again after 5 minutes."
        )));
    }

    Ok(next.run(req).await)
}
