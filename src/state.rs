use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tracing::warn;

use crate::cache::RedisCache;
use crate::config::cors::CorsConfig;
use crate::config::database::init_db_pool;
use crate::config::jwt::JwtConfig;
use crate::config::rate_limit::{LoginRateLimiter, RateLimitConfig};
use crate::config::redis::RedisConfig;
use crate::sessions::{RedisSessionStore, SessionRegistry};

/// Shared application state.
///
/// The session registry is injected behind a trait object so tests can
/// substitute an in-memory implementation; the read cache is optional and
/// the application degrades to direct database reads without it.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub sessions: Arc<dyn SessionRegistry>,
    pub cache: Option<RedisCache>,
    pub login_limiter: Arc<LoginRateLimiter>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("jwt_config", &"<redacted>")
            .field("cache", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

pub async fn init_app_state() -> AppState {
    let redis_config = RedisConfig::from_env();

    // Sessions are correctness-critical; refuse to start without them.
    let sessions = RedisSessionStore::connect(&redis_config.url)
        .await
        .expect("Failed to connect to Redis for the session registry");

    // The read cache is not; start degraded if Redis refuses a second client.
    let cache = match RedisCache::new(
        &redis_config.url,
        Duration::from_secs(redis_config.cache_ttl_secs),
    )
    .await
    {
        Ok(cache) => Some(cache),
        Err(e) => {
            warn!(error = %e, "Read cache unavailable, serving from the database only");
            None
        }
    };

    AppState {
        db: init_db_pool().await,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        sessions: Arc::new(sessions),
        cache,
        login_limiter: Arc::new(RateLimitConfig::from_env().login_limiter()),
    }
}
