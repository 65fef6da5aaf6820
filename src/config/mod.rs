//! Configuration modules for the Acadex API.
//!
//! Each submodule handles one configuration concern, loaded from
//! environment variables with sensible development defaults.
//!
//! # Modules
//!
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`database`]: PostgreSQL connection pool initialization
//! - [`jwt`]: Access/refresh token signing configuration
//! - [`rate_limit`]: Login rate limiting configuration
//! - [`redis`]: Redis connection settings for sessions and the read cache

pub mod cors;
pub mod database;
pub mod jwt;
pub mod rate_limit;
pub mod redis;
