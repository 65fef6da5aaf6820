use std::env;

/// Redis connection settings shared by the session registry and the
/// read cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedisConfig {
    pub url: String,
    /// Default TTL for cached read responses, in seconds.
    pub cache_ttl_secs: u64,
}

impl RedisConfig {
    pub fn from_env() -> Self {
        Self {
            url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            cache_ttl_secs: env::var("CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300), // 5 minutes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cache_ttl() {
        // from_env falls back when the variable is absent; the default TTL
        // matches the read-cache expiry the services assume.
        let config = RedisConfig {
            url: "redis://localhost:6379".to_string(),
            cache_ttl_secs: 300,
        };
        assert_eq!(config.cache_ttl_secs, 300);
    }
}
