//! Credential records, token claims, and auth DTOs.
//!
//! The wire format is camelCase JSON. Password hashes live only in
//! [`UserWithPassword`], which is never serializable; every response type
//! here omits the hash by construction.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::utils::errors::AppError;

/// Credential role. Each role fixes which profile link may be populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Student,
    Instructor,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Student => "student",
            UserRole::Instructor => "instructor",
        }
    }
}

/// Role plus its matching profile link, enforced at construction: an admin
/// links to nothing, a student may link to a student profile, an instructor
/// to an instructor profile, never more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAssignment {
    Admin,
    Student(Option<Uuid>),
    Instructor(Option<Uuid>),
}

impl RoleAssignment {
    /// Builds the assignment from the loose request fields, rejecting any
    /// link that does not match the role.
    pub fn from_parts(
        role: UserRole,
        student_id: Option<Uuid>,
        instructor_id: Option<Uuid>,
    ) -> Result<Self, AppError> {
        match (role, student_id, instructor_id) {
            (UserRole::Admin, None, None) => Ok(RoleAssignment::Admin),
            (UserRole::Student, student_id, None) => Ok(RoleAssignment::Student(student_id)),
            (UserRole::Instructor, None, instructor_id) => {
                Ok(RoleAssignment::Instructor(instructor_id))
            }
            _ => Err(AppError::bad_request(anyhow::anyhow!(
                "Profile link does not match role {}",
                role.as_str()
            ))),
        }
    }

    pub fn role(self) -> UserRole {
        match self {
            RoleAssignment::Admin => UserRole::Admin,
            RoleAssignment::Student(_) => UserRole::Student,
            RoleAssignment::Instructor(_) => UserRole::Instructor,
        }
    }

    pub fn student_id(self) -> Option<Uuid> {
        match self {
            RoleAssignment::Student(id) => id,
            _ => None,
        }
    }

    pub fn instructor_id(self) -> Option<Uuid> {
        match self {
            RoleAssignment::Instructor(id) => id,
            _ => None,
        }
    }
}

/// A credential record as returned to callers. No password field exists on
/// this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub student_id: Option<Uuid>,
    pub instructor_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Credential row including the password hash; fetched only by login and
/// change-password, never serialized.
#[derive(Debug, FromRow)]
pub struct UserWithPassword {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub is_active: bool,
}

/// Access token claims: `{userId, role}` plus the standard timestamps.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
}

/// Refresh token claims: the user alone. The session registry, not the
/// token, decides whether a refresh is still live.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequestDto {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub role: UserRole,
    pub student_id: Option<Uuid>,
    pub instructor_id: Option<Uuid>,
}

/// Login request. The password is deliberately unconstrained here: an empty
/// or short password must fail verification with a 401, not validation with
/// a 400.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Names the device session slot; must be presented back on refresh and
    /// logout.
    pub token_id: Uuid,
    pub role: UserRole,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
    pub token_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub token_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordDto {
    #[validate(length(min = 6))]
    pub old_password: String,
    #[validate(length(min = 6))]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
