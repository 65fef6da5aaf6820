//! Login rate limiting configuration.
//!
//! The limiter uses a per-IP token bucket: `login_burst_size` tokens may be
//! consumed at once, and one token is replenished every
//! `login_replenish_secs` seconds. The defaults (burst 5, one per 60s)
//! bound login attempts to 5 per 5 minutes per IP.

use std::net::IpAddr;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

/// Keyed per-IP limiter guarding the login endpoint.
pub type LoginRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum tokens that can accumulate for one IP.
    pub login_burst_size: u32,
    /// Seconds between token replenishments.
    pub login_replenish_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_burst_size: 5,
            login_replenish_secs: 60,
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        Self {
            login_burst_size: std::env::var("RATE_LIMIT_LOGIN_BURST_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            login_replenish_secs: std::env::var("RATE_LIMIT_LOGIN_REPLENISH_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }

    /// Builds the keyed limiter for login attempts.
    ///
    /// # Panics
    ///
    /// Panics if the configured period or burst size is zero.
    #[must_use]
    pub fn login_limiter(&self) -> LoginRateLimiter {
        let quota = Quota::with_period(Duration::from_secs(self.login_replenish_secs))
            .expect("login replenish period must be non-zero")
            .allow_burst(
                NonZeroU32::new(self.login_burst_size).expect("login burst size must be non-zero"),
            );

        RateLimiter::keyed(quota)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.login_burst_size, 5);
        assert_eq!(config.login_replenish_secs, 60);
    }

    #[test]
    fn test_limiter_allows_burst_then_rejects() {
        let limiter = RateLimitConfig::default().login_limiter();
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

        for _ in 0..5 {
            assert!(limiter.check_key(&ip).is_ok());
        }
        assert!(limiter.check_key(&ip).is_err());
    }

    #[test]
    fn test_limiter_keys_are_independent() {
        let limiter = RateLimitConfig::default().login_limiter();
        let first = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let second = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        for _ in 0..5 {
            assert!(limiter.check_key(&first).is_ok());
        }
        assert!(limiter.check_key(&first).is_err());
        assert!(limiter.check_key(&second).is_ok());
    }
}
