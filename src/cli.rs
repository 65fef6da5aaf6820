//! CLI seeding utilities.

use sqlx::PgPool;

use crate::utils::password::hash_password;

/// Creates the initial admin credential if the email is not taken.
///
/// Admin accounts are never created through the API; this is the only path.
pub async fn create_admin(pool: &PgPool, email: &str, password: &str) -> anyhow::Result<()> {
    let email = email.trim().to_lowercase();

    let existing = sqlx::query_scalar::<_, uuid::Uuid>(
        "SELECT id FROM users WHERE LOWER(email) = $1",
    )
    .bind(&email)
    .fetch_optional(pool)
    .await?;

    if existing.is_some() {
        anyhow::bail!("A user with email {} already exists", email);
    }

    let hashed_password =
        hash_password(password).map_err(|e| anyhow::anyhow!("{}", e.error))?;

    sqlx::query("INSERT INTO users (email, password, role) VALUES ($1, $2, 'admin')")
        .bind(&email)
        .bind(&hashed_password)
        .execute(pool)
        .await?;

    Ok(())
}
