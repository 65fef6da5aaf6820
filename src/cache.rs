//! Redis read cache for list/detail responses.
//!
//! Strictly a side effect: a miss or a transport error degrades to a
//! database read, and failed writes/invalidations are logged and ignored.
//! Session storage does NOT go through this module; see [`crate::sessions`].

use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Redis cache client with connection pooling.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    default_ttl: Duration,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

/// Error type for cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RedisCache {
    /// Creates a new Redis cache client.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` if the connection fails.
    pub async fn new(redis_url: &str, default_ttl: Duration) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self { conn, default_ttl })
    }

    /// Gets a cached value by key.
    ///
    /// Returns `None` if the key doesn't exist, deserialization fails, or
    /// Redis is unreachable.
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut conn = self.conn.clone();

        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(value)) => {
                debug!(cache.key = %key, "Cache hit");
                match serde_json::from_str(&value) {
                    Ok(parsed) => Some(parsed),
                    Err(e) => {
                        error!(cache.key = %key, error = %e, "Failed to deserialize cached value");
                        None
                    }
                }
            }
            Ok(None) => {
                debug!(cache.key = %key, "Cache miss");
                None
            }
            Err(e) => {
                error!(cache.key = %key, error = %e, "Redis GET error");
                None
            }
        }
    }

    /// Sets a cached value with the default TTL; failures are logged, never
    /// propagated.
    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    pub async fn set<T>(&self, key: &str, value: &T)
    where
        T: Serialize,
    {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(cache.key = %key, error = %e, "Failed to serialize value for cache");
                return;
            }
        };

        let mut conn = self.conn.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(key, json, self.default_ttl.as_secs())
            .await
        {
            warn!(cache.key = %key, error = %e, "Redis SETEX error");
        }
    }

    /// Invalidates (deletes) a cached key; failures are logged.
    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    pub async fn invalidate(&self, key: &str) {
        let mut conn = self.conn.clone();

        if let Err(e) = conn.del::<_, ()>(key).await {
            warn!(cache.key = %key, error = %e, "Redis DEL error");
        }
    }

    /// Invalidates all keys matching a pattern via SCAN; failures are logged.
    #[instrument(skip(self), fields(cache.operation = "SCAN_DEL"))]
    pub async fn invalidate_pattern(&self, pattern: &str) {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;

        loop {
            let scanned: Result<(u64, Vec<String>), _> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await;

            let (next_cursor, keys) = match scanned {
                Ok(result) => result,
                Err(e) => {
                    warn!(cache.pattern = %pattern, error = %e, "Redis SCAN error");
                    return;
                }
            };

            if !keys.is_empty() {
                if let Err(e) = conn.del::<_, ()>(&keys).await {
                    warn!(cache.pattern = %pattern, error = %e, "Redis DEL error");
                    return;
                }
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }
    }
}

/// Cache key naming, one submodule per entity.
pub mod keys {
    use uuid::Uuid;

    /// Generates a short, stable hash from filter parameters.
    pub fn hash_filters<T: std::hash::Hash>(filters: &T) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hasher;

        let mut hasher = DefaultHasher::new();
        filters.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }

    pub mod students {
        use super::*;

        pub fn list(filters_hash: &str) -> String {
            format!("students:list:{}", filters_hash)
        }

        pub fn detail(id: Uuid) -> String {
            format!("students:detail:{}", id)
        }

        pub fn list_pattern() -> &'static str {
            "students:list:*"
        }
    }

    pub mod instructors {
        use super::*;

        pub fn list(filters_hash: &str) -> String {
            format!("instructors:list:{}", filters_hash)
        }

        pub fn detail(id: Uuid) -> String {
            format!("instructors:detail:{}", id)
        }

        pub fn list_pattern() -> &'static str {
            "instructors:list:*"
        }
    }

    pub mod departments {
        use super::*;

        pub fn list() -> &'static str {
            "departments:list"
        }

        pub fn detail(id: Uuid) -> String {
            format!("departments:detail:{}", id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::keys;
    use uuid::Uuid;

    #[test]
    fn test_student_key_generation() {
        let id = Uuid::nil();
        assert_eq!(
            keys::students::detail(id),
            format!("students:detail:{}", id)
        );
        assert!(keys::students::list("abc").starts_with("students:list:"));
    }

    #[test]
    fn test_hash_filters_consistency() {
        let filters = (Some("active"), Option::<Uuid>::None);
        assert_eq!(keys::hash_filters(&filters), keys::hash_filters(&filters));
    }

    #[test]
    fn test_hash_filters_distinguishes_values() {
        let all = (Option::<&str>::None, Option::<Uuid>::None);
        let active = (Some("active"), Option::<Uuid>::None);
        assert_ne!(keys::hash_filters(&all), keys::hash_filters(&active));
    }
}
