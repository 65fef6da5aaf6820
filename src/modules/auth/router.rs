use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::middleware::rate_limit::login_rate_limit;
use crate::state::AppState;

use super::controller::{
    change_password, login_user, logout_user, me, refresh_token, register_user,
};

pub fn init_auth_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(register_user))
        .route(
            "/login",
            post(login_user).route_layer(middleware::from_fn_with_state(
                state.clone(),
                login_rate_limit,
            )),
        )
        .route("/refresh", post(refresh_token))
        .route("/me", get(me))
        .route("/logout", post(logout_user))
        .route("/change-password", patch(change_password))
}
