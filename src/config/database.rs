//! PostgreSQL connection pool initialization.
//!
//! The database URL is read from the `DATABASE_URL` environment variable.

use sqlx::PgPool;
use std::env;

/// Initializes the PostgreSQL connection pool.
///
/// Called once during startup; the returned pool is cheaply cloneable and
/// lives in the application state.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is not set or the connection fails.
pub async fn init_db_pool() -> PgPool {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database")
}
