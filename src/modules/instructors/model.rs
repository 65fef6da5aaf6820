use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::lifecycle::LifecycleStatus;

/// Instructor lifecycle. Retirement is terminal; leave is reversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum InstructorStatus {
    Active,
    Onleave,
    Retired,
}

impl LifecycleStatus for InstructorStatus {
    const ENTITY: &'static str = "Instructor";
    const ALL: &'static [Self] = &[Self::Active, Self::Onleave, Self::Retired];

    fn as_str(self) -> &'static str {
        match self {
            InstructorStatus::Active => "active",
            InstructorStatus::Onleave => "onleave",
            InstructorStatus::Retired => "retired",
        }
    }

    fn allowed_transitions(self) -> &'static [Self] {
        match self {
            InstructorStatus::Active => &[Self::Onleave, Self::Retired],
            InstructorStatus::Onleave => &[Self::Active],
            InstructorStatus::Retired => &[],
        }
    }

    fn grants_access(self) -> bool {
        matches!(self, InstructorStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Instructor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub dob: Option<chrono::NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub hire_date: chrono::NaiveDate,
    pub status: InstructorStatus,
    pub is_active: bool,
    pub department_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstructorDto {
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
pub struct UpdateInstructorDto {
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
pub struct ChangeInstructorStatusDto {
    pub status: InstructorStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorFilterParams {
    pub status: Option<InstructorStatus>,
    pub department: Option<Uuid>,
}
