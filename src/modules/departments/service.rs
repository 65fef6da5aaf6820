use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::cache::{RedisCache, keys};
use crate::lifecycle::ensure_transition;
use crate::utils::errors::AppError;

use super::model::{
    AssignHeadDto, CreateDepartmentDto, Department, DepartmentStatus, UpdateDepartmentDto,
};

const DEPARTMENT_COLUMNS: &str =
    "id, name, building, head_of_department, status, is_active, created_at, updated_at";

async fn invalidate_department_caches(cache: Option<&RedisCache>, id: Option<Uuid>) {
    let Some(cache) = cache else { return };

    cache.invalidate(keys::departments::list()).await;
    if let Some(id) = id {
        cache.invalidate(&keys::departments::detail(id)).await;
    }
}

pub struct DepartmentService;

impl DepartmentService {
    #[instrument(skip(db, cache, dto))]
    pub async fn create_department(
        db: &PgPool,
        cache: Option<&RedisCache>,
        dto: CreateDepartmentDto,
    ) -> Result<Department, AppError> {
        let exists =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM departments WHERE LOWER(name) = LOWER($1)")
                .bind(&dto.name)
                .fetch_optional(db)
                .await?;

        if exists.is_some() {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Department already exists"
            )));
        }

        let department = sqlx::query_as::<_, Department>(&format!(
            "INSERT INTO departments (name, building) VALUES ($1, $2) RETURNING {DEPARTMENT_COLUMNS}"
        ))
        .bind(&dto.name)
        .bind(&dto.building)
        .fetch_one(db)
        .await
        .map_err(AppError::from_database)?;

        invalidate_department_caches(cache, None).await;

        Ok(department)
    }

    #[instrument(skip(db, cache))]
    pub async fn get_all_departments(
        db: &PgPool,
        cache: Option<&RedisCache>,
    ) -> Result<Vec<Department>, AppError> {
        if let Some(cache) = cache {
            if let Some(cached) = cache.get::<Vec<Department>>(keys::departments::list()).await {
                return Ok(cached);
            }
        }

        let departments = sqlx::query_as::<_, Department>(&format!(
            "SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE is_active = TRUE
             ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await?;

        if let Some(cache) = cache {
            cache.set(keys::departments::list(), &departments).await;
        }

        Ok(departments)
    }

    /// Detail lookups return soft-deleted departments too; only listings
    /// filter them out.
    #[instrument(skip(db, cache))]
    pub async fn get_department_by_id(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
    ) -> Result<Department, AppError> {
        let cache_key = keys::departments::detail(id);

        if let Some(cache) = cache {
            if let Some(cached) = cache.get::<Department>(&cache_key).await {
                return Ok(cached);
            }
        }

        let department = sqlx::query_as::<_, Department>(&format!(
            "SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Department not found")))?;

        if let Some(cache) = cache {
            cache.set(&cache_key, &department).await;
        }

        Ok(department)
    }

    #[instrument(skip(db, cache, dto))]
    pub async fn update_department(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
        dto: UpdateDepartmentDto,
    ) -> Result<Department, AppError> {
        let existing = sqlx::query_as::<_, Department>(&format!(
            "SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE id = $1 AND is_active = TRUE"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Department not found")))?;

        if let Some(name) = &dto.name {
            let conflict = sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM departments WHERE LOWER(name) = LOWER($1) AND id <> $2",
            )
            .bind(name)
            .bind(id)
            .fetch_optional(db)
            .await?;

            if conflict.is_some() {
                return Err(AppError::conflict(anyhow::anyhow!(
                    "Department name already exists"
                )));
            }
        }

        let name = dto.name.unwrap_or(existing.name);
        let building = dto.building.or(existing.building);

        let department = sqlx::query_as::<_, Department>(&format!(
            "UPDATE departments SET name = $1, building = $2, updated_at = now()
             WHERE id = $3
             RETURNING {DEPARTMENT_COLUMNS}"
        ))
        .bind(&name)
        .bind(&building)
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(AppError::from_database)?;

        invalidate_department_caches(cache, Some(id)).await;

        Ok(department)
    }

    /// Soft delete: the row is kept, listings stop returning it.
    #[instrument(skip(db, cache))]
    pub async fn soft_delete_department(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
    ) -> Result<Department, AppError> {
        let department = sqlx::query_as::<_, Department>(&format!(
            "UPDATE departments SET is_active = FALSE, updated_at = now()
             WHERE id = $1 AND is_active = TRUE
             RETURNING {DEPARTMENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Department not found")))?;

        invalidate_department_caches(cache, Some(id)).await;

        Ok(department)
    }

    #[instrument(skip(db, cache))]
    pub async fn change_status(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
        target: DepartmentStatus,
    ) -> Result<Department, AppError> {
        let department = sqlx::query_as::<_, Department>(&format!(
            "SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Department not found")))?;

        ensure_transition(department.status, target)?;

        let department = sqlx::query_as::<_, Department>(&format!(
            "UPDATE departments SET status = $1, updated_at = now()
             WHERE id = $2
             RETURNING {DEPARTMENT_COLUMNS}"
        ))
        .bind(target)
        .bind(id)
        .fetch_one(db)
        .await?;

        invalidate_department_caches(cache, Some(id)).await;

        Ok(department)
    }

    #[instrument(skip(db, cache, dto))]
    pub async fn assign_head(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
        dto: AssignHeadDto,
    ) -> Result<Department, AppError> {
        let instructor =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM instructors WHERE id = $1")
                .bind(dto.instructor_id)
                .fetch_optional(db)
                .await?;

        if instructor.is_none() {
            return Err(AppError::not_found(anyhow::anyhow!("Instructor not found")));
        }

        let department = sqlx::query_as::<_, Department>(&format!(
            "UPDATE departments SET head_of_department = $1, updated_at = now()
             WHERE id = $2 AND is_active = TRUE
             RETURNING {DEPARTMENT_COLUMNS}"
        ))
        .bind(dto.instructor_id)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Department not found")))?;

        invalidate_department_caches(cache, Some(id)).await;

        Ok(department)
    }
}
