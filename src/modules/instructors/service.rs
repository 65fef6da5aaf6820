use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::cache::{RedisCache, keys};
use crate::lifecycle::{LifecycleStatus, ensure_transition};
use crate::utils::errors::AppError;
use crate::utils::password::hash_password;

use super::model::{
    CreateInstructorDto, Instructor, InstructorFilterParams, InstructorStatus,
    UpdateInstructorDto,
};

const INSTRUCTOR_COLUMNS: &str = "id, first_name, last_name, email, phone, dob, gender, address, \
     hire_date, status, is_active, department_id, created_at, updated_at";

const DEFAULT_INSTRUCTOR_PASSWORD: &str = "Instructor@123";

async fn invalidate_instructor_caches(cache: Option<&RedisCache>, id: Option<Uuid>) {
    let Some(cache) = cache else { return };

    cache
        .invalidate_pattern(keys::instructors::list_pattern())
        .await;
    if let Some(id) = id {
        cache.invalidate(&keys::instructors::detail(id)).await;
    }
}

pub struct InstructorService;

impl InstructorService {
    /// Creates the instructor and its credential record in one transaction.
    #[instrument(skip(db, cache, dto))]
    pub async fn create_instructor(
        db: &PgPool,
        cache: Option<&RedisCache>,
        dto: CreateInstructorDto,
    ) -> Result<Instructor, AppError> {
        let email = dto.email.trim().to_lowercase();

        let mut tx = db.begin().await?;

        let exists =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM instructors WHERE LOWER(email) = $1")
                .bind(&email)
                .fetch_optional(&mut *tx)
                .await?;

        if exists.is_some() {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Instructor with this email already exists"
            )));
        }

        let instructor = sqlx::query_as::<_, Instructor>(&format!(
            "INSERT INTO instructors (first_name, last_name, email, phone, dob, gender, address, department_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {INSTRUCTOR_COLUMNS}"
        ))
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&email)
        .bind(&dto.phone)
        .bind(dto.dob)
        .bind(&dto.gender)
        .bind(&dto.address)
        .bind(dto.department_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from_database)?;

        let hashed_password = hash_password(DEFAULT_INSTRUCTOR_PASSWORD)?;

        sqlx::query(
            "INSERT INTO users (email, password, role, instructor_id) VALUES ($1, $2, 'instructor', $3)",
        )
        .bind(&email)
        .bind(&hashed_password)
        .bind(instructor.id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from_database)?;

        tx.commit().await?;

        invalidate_instructor_caches(cache, None).await;

        Ok(instructor)
    }

    #[instrument(skip(db, cache))]
    pub async fn get_all_instructors(
        db: &PgPool,
        cache: Option<&RedisCache>,
        filters: InstructorFilterParams,
    ) -> Result<Vec<Instructor>, AppError> {
        let status_filter = filters.status.map(InstructorStatus::as_str);
        let cache_key =
            keys::instructors::list(&keys::hash_filters(&(status_filter, filters.department)));

        if let Some(cache) = cache {
            if let Some(cached) = cache.get::<Vec<Instructor>>(&cache_key).await {
                return Ok(cached);
            }
        }

        let instructors = sqlx::query_as::<_, Instructor>(&format!(
            "SELECT {INSTRUCTOR_COLUMNS} FROM instructors
             WHERE is_active = TRUE
               AND ($1::text IS NULL OR status = $1)
               AND ($2::uuid IS NULL OR department_id = $2)
             ORDER BY created_at DESC"
        ))
        .bind(status_filter)
        .bind(filters.department)
        .fetch_all(db)
        .await?;

        if let Some(cache) = cache {
            cache.set(&cache_key, &instructors).await;
        }

        Ok(instructors)
    }

    #[instrument(skip(db, cache))]
    pub async fn get_instructor_by_id(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
    ) -> Result<Instructor, AppError> {
        let cache_key = keys::instructors::detail(id);

        if let Some(cache) = cache {
            if let Some(cached) = cache.get::<Instructor>(&cache_key).await {
                return Ok(cached);
            }
        }

        let instructor = sqlx::query_as::<_, Instructor>(&format!(
            "SELECT {INSTRUCTOR_COLUMNS} FROM instructors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Instructor not found")))?;

        if let Some(cache) = cache {
            cache.set(&cache_key, &instructor).await;
        }

        Ok(instructor)
    }

    #[instrument(skip(db, cache, dto))]
    pub async fn update_instructor(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
        dto: UpdateInstructorDto,
    ) -> Result<Instructor, AppError> {
        let mut tx = db.begin().await?;

        let existing = sqlx::query_as::<_, Instructor>(&format!(
            "SELECT {INSTRUCTOR_COLUMNS} FROM instructors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Instructor not found")))?;

        let email = match dto.email {
            Some(new_email) => {
                let new_email = new_email.trim().to_lowercase();
                if new_email != existing.email {
                    let taken = sqlx::query_scalar::<_, Uuid>(
                        "SELECT id FROM users WHERE LOWER(email) = $1",
                    )
                    .bind(&new_email)
                    .fetch_optional(&mut *tx)
                    .await?;

                    if taken.is_some() {
                        return Err(AppError::conflict(anyhow::anyhow!("Email already in use")));
                    }

                    sqlx::query(
                        "UPDATE users SET email = $1, updated_at = now() WHERE instructor_id = $2",
                    )
                    .bind(&new_email)
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .map_err(AppError::from_database)?;
                }
                new_email
            }
            None => existing.email,
        };

        let instructor = sqlx::query_as::<_, Instructor>(&format!(
            "UPDATE instructors
             SET first_name = $1, last_name = $2, email = $3, phone = $4, dob = $5,
                 gender = $6, address = $7, department_id = $8, updated_at = now()
             WHERE id = $9
             RETURNING {INSTRUCTOR_COLUMNS}"
        ))
        .bind(dto.first_name.unwrap_or(existing.first_name))
        .bind(dto.last_name.unwrap_or(existing.last_name))
        .bind(&email)
        .bind(dto.phone.or(existing.phone))
        .bind(dto.dob.or(existing.dob))
        .bind(dto.gender.or(existing.gender))
        .bind(dto.address.or(existing.address))
        .bind(dto.department_id.unwrap_or(existing.department_id))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from_database)?;

        tx.commit().await?;

        invalidate_instructor_caches(cache, Some(id)).await;

        Ok(instructor)
    }

    /// Soft delete: keeps the row and status, deactivates the credential.
    #[instrument(skip(db, cache))]
    pub async fn soft_delete_instructor(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
    ) -> Result<Instructor, AppError> {
        let mut tx = db.begin().await?;

        let instructor = sqlx::query_as::<_, Instructor>(&format!(
            "UPDATE instructors SET is_active = FALSE, updated_at = now()
             WHERE id = $1
             RETURNING {INSTRUCTOR_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Instructor not found")))?;

        sqlx::query(
            "UPDATE users SET is_active = FALSE, updated_at = now() WHERE instructor_id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        invalidate_instructor_caches(cache, Some(id)).await;

        Ok(instructor)
    }

    #[instrument(skip(db, cache))]
    pub async fn change_status(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
        target: InstructorStatus,
    ) -> Result<Instructor, AppError> {
        let mut tx = db.begin().await?;

        let existing = sqlx::query_as::<_, Instructor>(&format!(
            "SELECT {INSTRUCTOR_COLUMNS} FROM instructors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Instructor not found")))?;

        ensure_transition(existing.status, target)?;

        let instructor = sqlx::query_as::<_, Instructor>(&format!(
            "UPDATE instructors SET status = $1, updated_at = now()
             WHERE id = $2
             RETURNING {INSTRUCTOR_COLUMNS}"
        ))
        .bind(target)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET is_active = $1, updated_at = now() WHERE instructor_id = $2")
            .bind(target.grants_access())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        invalidate_instructor_caches(cache, Some(id)).await;

        Ok(instructor)
    }
}
