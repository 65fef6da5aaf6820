use std::time::Duration;

use sqlx::PgPool;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::sessions::SessionRegistry;
use crate::utils::errors::AppError;
use crate::utils::jwt::{
    create_access_token, create_refresh_token, verify_refresh_token,
};
use crate::utils::password::{hash_password, verify_password};

use super::model::{
    ChangePasswordDto, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse,
    RegisterRequestDto, RoleAssignment, User, UserWithPassword,
};

const USER_COLUMNS: &str =
    "id, email, role, is_active, student_id, instructor_id, created_at, updated_at";

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto))]
    pub async fn register(db: &PgPool, dto: RegisterRequestDto) -> Result<User, AppError> {
        let email = dto.email.trim().to_lowercase();
        let assignment = RoleAssignment::from_parts(dto.role, dto.student_id, dto.instructor_id)?;

        let existing =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE LOWER(email) = $1")
                .bind(&email)
                .fetch_optional(db)
                .await?;

        if existing.is_some() {
            return Err(AppError::conflict(anyhow::anyhow!("User already exists")));
        }

        let hashed_password = hash_password(&dto.password)?;

        // The unique index on LOWER(email) is the real guard; a concurrent
        // duplicate insert surfaces here as a 409 through from_database.
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password, role, student_id, instructor_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&email)
        .bind(&hashed_password)
        .bind(assignment.role())
        .bind(assignment.student_id())
        .bind(assignment.instructor_id())
        .fetch_one(db)
        .await
        .map_err(AppError::from_database)?;

        Ok(user)
    }

    #[instrument(skip(db, sessions, dto, jwt_config))]
    pub async fn login(
        db: &PgPool,
        sessions: &dyn SessionRegistry,
        jwt_config: &JwtConfig,
        dto: LoginRequest,
    ) -> Result<LoginResponse, AppError> {
        let user = sqlx::query_as::<_, UserWithPassword>(
            "SELECT id, email, password, role, is_active FROM users WHERE LOWER(email) = $1",
        )
        .bind(dto.email.trim().to_lowercase())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("Invalid credentials")))?;

        if !user.is_active {
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "Account is deactivated"
            )));
        }

        if !verify_password(&dto.password, &user.password)? {
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "Invalid credentials"
            )));
        }

        // Fresh random slot per device session; the caller presents it back
        // on refresh and logout.
        let token_id = Uuid::new_v4();

        let access_token = create_access_token(user.id, user.role, jwt_config)?;
        let refresh_token = create_refresh_token(user.id, jwt_config)?;

        sessions
            .put(
                user.id,
                token_id,
                &refresh_token,
                Duration::from_secs(jwt_config.refresh_token_expiry as u64),
            )
            .await?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_id,
            role: user.role,
        })
    }

    #[instrument(skip(db, sessions, dto, jwt_config))]
    pub async fn refresh(
        db: &PgPool,
        sessions: &dyn SessionRegistry,
        jwt_config: &JwtConfig,
        dto: RefreshRequest,
    ) -> Result<RefreshResponse, AppError> {
        let claims = verify_refresh_token(&dto.refresh_token, jwt_config)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid refresh token")))?;

        // An absent slot is plainly invalid (revoked, expired, or a guessed
        // tokenId) and revokes nothing further. A slot that exists under a
        // DIFFERENT value means this token was rotated out and is being
        // replayed: treat the user as compromised and drop every session
        // they hold. The 401 stands even if the sweep fails.
        match sessions.get(user_id, dto.token_id).await? {
            None => {
                return Err(AppError::unauthorized(anyhow::anyhow!(
                    "Invalid refresh token"
                )));
            }
            Some(stored_token) if stored_token != dto.refresh_token => {
                warn!(user_id = %user_id, token_id = %dto.token_id, "Refresh token reuse detected");
                if let Err(e) = sessions.revoke_all(user_id).await {
                    error!(user_id = %user_id, error = %e, "Failed to revoke sessions after reuse detection");
                }
                return Err(AppError::unauthorized(anyhow::anyhow!(
                    "Refresh token reuse detected"
                )));
            }
            Some(_) => {}
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("User not found")))?;

        if !user.is_active {
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "Account is deactivated"
            )));
        }

        let access_token = create_access_token(user.id, user.role, jwt_config)?;
        let refresh_token = create_refresh_token(user.id, jwt_config)?;

        // Rotation keeps the same slot: overwrite the entry with the new
        // token and a full TTL. The old token is dead from here on.
        sessions
            .put(
                user.id,
                dto.token_id,
                &refresh_token,
                Duration::from_secs(jwt_config.refresh_token_expiry as u64),
            )
            .await?;

        Ok(RefreshResponse {
            access_token,
            refresh_token,
        })
    }

    #[instrument(skip(sessions))]
    pub async fn logout(
        sessions: &dyn SessionRegistry,
        user_id: Uuid,
        token_id: Uuid,
    ) -> Result<(), AppError> {
        sessions.revoke(user_id, token_id).await?;
        Ok(())
    }

    #[instrument(skip(db, sessions, dto))]
    pub async fn change_password(
        db: &PgPool,
        sessions: &dyn SessionRegistry,
        user_id: Uuid,
        dto: ChangePasswordDto,
    ) -> Result<(), AppError> {
        let user = sqlx::query_as::<_, UserWithPassword>(
            "SELECT id, email, password, role, is_active FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        if !verify_password(&dto.old_password, &user.password)? {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Old password is incorrect"
            )));
        }

        let hashed_password = hash_password(&dto.new_password)?;

        sqlx::query("UPDATE users SET password = $1, updated_at = now() WHERE id = $2")
            .bind(&hashed_password)
            .bind(user_id)
            .execute(db)
            .await?;

        // Refresh sessions minted under the old password die with it.
        if let Err(e) = sessions.revoke_all(user_id).await {
            error!(user_id = %user_id, error = %e, "Failed to revoke sessions after password change");
        }

        Ok(())
    }
}
