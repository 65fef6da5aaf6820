use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::lifecycle::LifecycleStatus;

/// Student lifecycle. Graduation is terminal; suspension is reversible.
/// Only an active student's credential may authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum StudentStatus {
    Active,
    Suspended,
    Graduated,
}

impl LifecycleStatus for StudentStatus {
    const ENTITY: &'static str = "Student";
    const ALL: &'static [Self] = &[Self::Active, Self::Suspended, Self::Graduated];

    fn as_str(self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::Suspended => "suspended",
            StudentStatus::Graduated => "graduated",
        }
    }

    fn allowed_transitions(self) -> &'static [Self] {
        match self {
            StudentStatus::Active => &[Self::Suspended, Self::Graduated],
            StudentStatus::Suspended => &[Self::Active],
            StudentStatus::Graduated => &[],
        }
    }

    fn grants_access(self) -> bool {
        matches!(self, StudentStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub dob: Option<chrono::NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub admission_date: chrono::NaiveDate,
    pub status: StudentStatus,
    pub is_active: bool,
    pub department_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentDto {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub dob: Option<chrono::NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub department_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentDto {
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<chrono::NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub department_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStudentStatusDto {
    pub status: StudentStatus,
}

/// List filters; both are optional and combine.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFilterParams {
    pub status: Option<StudentStatus>,
    pub department: Option<Uuid>,
}
