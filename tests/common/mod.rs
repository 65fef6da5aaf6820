// Each integration test binary uses its own subset of these helpers.
#![allow(dead_code)]

use std::sync::Arc;

use acadex::config::cors::CorsConfig;
use acadex::config::jwt::JwtConfig;
use acadex::config::rate_limit::RateLimitConfig;
use acadex::router::init_router;
use acadex::sessions::memory::InMemorySessionStore;
use acadex::state::AppState;
use acadex::utils::password::hash_password;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        access_secret: "test-access-secret-at-least-32-chars-xx".to_string(),
        refresh_secret: "test-refresh-secret-at-least-32-chars-x".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 604800,
    }
}

/// Application state with an in-memory session registry and no read cache.
pub fn test_state(pool: PgPool) -> AppState {
    AppState {
        db: pool,
        jwt_config: test_jwt_config(),
        cors_config: CorsConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        sessions: Arc::new(InMemorySessionStore::new()),
        cache: None,
        login_limiter: Arc::new(RateLimitConfig::default().login_limiter()),
    }
}

pub fn setup_test_app(pool: PgPool) -> Router {
    init_router(test_state(pool))
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

pub async fn create_test_department(pool: &PgPool, name: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>("INSERT INTO departments (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_test_admin(pool: &PgPool, email: &str, password: &str) -> Uuid {
    let hashed = hash_password(password).unwrap();

    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (email, password, role) VALUES ($1, $2, 'admin') RETURNING id",
    )
    .bind(email.to_lowercase())
    .bind(&hashed)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn authed_json_request(
    method: &str,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn authed_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Logs in through the API and returns the response body.
pub async fn login(app: &Router, email: &str, password: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({"email": email, "password": password}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await
}

/// Registers an admin directly in the database and returns a bearer token
/// for it.
pub async fn admin_token(pool: &PgPool, app: &Router) -> String {
    let email = generate_unique_email();
    create_test_admin(pool, &email, "Admin@123").await;
    let body = login(app, &email, "Admin@123").await;
    body["accessToken"].as_str().unwrap().to_string()
}
