use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;

use crate::logging::logging_middleware;
use crate::middleware::role::require_admin;
use crate::modules::auth::router::init_auth_router;
use crate::modules::departments::router::init_departments_router;
use crate::modules::instructors::router::init_instructors_router;
use crate::modules::students::router::init_students_router;
use crate::state::AppState;

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .nest("/auth", init_auth_router(&state))
                .nest(
                    "/departments",
                    init_departments_router()
                        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
                )
                .nest(
                    "/students",
                    init_students_router()
                        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
                )
                .nest(
                    "/instructors",
                    init_instructors_router()
                        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
                ),
        )
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(logging_middleware))
}
