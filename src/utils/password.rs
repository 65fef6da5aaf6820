use bcrypt::{DEFAULT_COST, hash, verify};

use crate::utils::errors::AppError;

/// Hashes a plaintext password with a fresh salt.
///
/// Called explicitly on every create/update path that persists a password;
/// there is no implicit pre-save hook.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to hash password: {}", e)))
}

/// Verifies a plaintext password against a stored bcrypt hash.
///
/// The comparison happens inside bcrypt; secrets are never compared as
/// plain strings.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to verify password: {}", e)))
}
