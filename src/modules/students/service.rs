use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::cache::{RedisCache, keys};
use crate::lifecycle::{LifecycleStatus, ensure_transition};
use crate::utils::errors::AppError;
use crate::utils::password::hash_password;

use super::model::{
    CreateStudentDto, Student, StudentFilterParams, StudentStatus, UpdateStudentDto,
};

const STUDENT_COLUMNS: &str = "id, first_name, last_name, email, phone, dob, gender, address, \
     admission_date, status, is_active, department_id, created_at, updated_at";

/// Initial credential password for admin-created students; changed by the
/// student via change-password.
const DEFAULT_STUDENT_PASSWORD: &str = "Student@123";

async fn invalidate_student_caches(cache: Option<&RedisCache>, id: Option<Uuid>) {
    let Some(cache) = cache else { return };

    cache
        .invalidate_pattern(keys::students::list_pattern())
        .await;
    if let Some(id) = id {
        cache.invalidate(&keys::students::detail(id)).await;
    }
}

pub struct StudentService;

impl StudentService {
    /// Creates the student and its credential record in one transaction.
    #[instrument(skip(db, cache, dto))]
    pub async fn create_student(
        db: &PgPool,
        cache: Option<&RedisCache>,
        dto: CreateStudentDto,
    ) -> Result<Student, AppError> {
        let email = dto.email.trim().to_lowercase();

        let mut tx = db.begin().await?;

        let exists =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM students WHERE LOWER(email) = $1")
                .bind(&email)
                .fetch_optional(&mut *tx)
                .await?;

        if exists.is_some() {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Student with this email already exists"
            )));
        }

        let student = sqlx::query_as::<_, Student>(&format!(
            "INSERT INTO students (first_name, last_name, email, phone, dob, gender, address, department_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {STUDENT_COLUMNS}"
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

        let hashed_password = hash_password(DEFAULT_STUDENT_PASSWORD)?;

        sqlx::query(
            "INSERT INTO users (email, password, role, student_id) VALUES ($1, $2, 'student', $3)",
        )
        .bind(&email)
        .bind(&hashed_password)
        .bind(student.id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from_database)?;

        tx.commit().await?;

        invalidate_student_caches(cache, None).await;

        Ok(student)
    }

    #[instrument(skip(db, cache))]
    pub async fn get_all_students(
        db: &PgPool,
        cache: Option<&RedisCache>,
        filters: StudentFilterParams,
    ) -> Result<Vec<Student>, AppError> {
        let status_filter = filters.status.map(StudentStatus::as_str);
        let cache_key =
            keys::students::list(&keys::hash_filters(&(status_filter, filters.department)));

        if let Some(cache) = cache {
            if let Some(cached) = cache.get::<Vec<Student>>(&cache_key).await {
                return Ok(cached);
            }
        }

        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students
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
            cache.set(&cache_key, &students).await;
        }

        Ok(students)
    }

    /// Detail lookups return soft-deleted students too; only listings
    /// filter them out.
    #[instrument(skip(db, cache))]
    pub async fn get_student_by_id(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
    ) -> Result<Student, AppError> {
        let cache_key = keys::students::detail(id);

        if let Some(cache) = cache {
            if let Some(cached) = cache.get::<Student>(&cache_key).await {
                return Ok(cached);
            }
        }

        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))?;

        if let Some(cache) = cache {
            cache.set(&cache_key, &student).await;
        }

        Ok(student)
    }

    /// Updates the student; an email change propagates to the credential
    /// record inside the same transaction.
    #[instrument(skip(db, cache, dto))]
    pub async fn update_student(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
        dto: UpdateStudentDto,
    ) -> Result<Student, AppError> {
        let mut tx = db.begin().await?;

        let existing = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))?;

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
                        "UPDATE users SET email = $1, updated_at = now() WHERE student_id = $2",
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

        let student = sqlx::query_as::<_, Student>(&format!(
            "UPDATE students
             SET first_name = $1, last_name = $2, email = $3, phone = $4, dob = $5,
                 gender = $6, address = $7, department_id = $8, updated_at = now()
             WHERE id = $9
             RETURNING {STUDENT_COLUMNS}"
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

        invalidate_student_caches(cache, Some(id)).await;

        Ok(student)
    }

    /// Soft delete: keeps the row, forces suspended, and deactivates the
    /// credential record, all in one transaction.
    #[instrument(skip(db, cache))]
    pub async fn soft_delete_student(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
    ) -> Result<Student, AppError> {
        let mut tx = db.begin().await?;

        let student = sqlx::query_as::<_, Student>(&format!(
            "UPDATE students SET is_active = FALSE, status = 'suspended', updated_at = now()
             WHERE id = $1
             RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))?;

        sqlx::query("UPDATE users SET is_active = FALSE, updated_at = now() WHERE student_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        invalidate_student_caches(cache, Some(id)).await;

        Ok(student)
    }

    /// Applies the transition table and synchronizes credential access in
    /// one transaction.
    #[instrument(skip(db, cache))]
    pub async fn change_status(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
        target: StudentStatus,
    ) -> Result<Student, AppError> {
        let mut tx = db.begin().await?;

        let existing = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))?;

        ensure_transition(existing.status, target)?;

        let student = sqlx::query_as::<_, Student>(&format!(
            "UPDATE students SET status = $1, updated_at = now()
             WHERE id = $2
             RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(target)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET is_active = $1, updated_at = now() WHERE student_id = $2")
            .bind(target.grants_access())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        invalidate_student_caches(cache, Some(id)).await;

        Ok(student)
    }
}
