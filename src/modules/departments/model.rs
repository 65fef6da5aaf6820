use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::lifecycle::LifecycleStatus;

/// Department lifecycle. Archiving is reversible; there is no terminal
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum DepartmentStatus {
    Active,
    Archived,
}

impl LifecycleStatus for DepartmentStatus {
    const ENTITY: &'static str = "Department";
    const ALL: &'static [Self] = &[Self::Active, Self::Archived];

    fn as_str(self) -> &'static str {
        match self {
            DepartmentStatus::Active => "active",
            DepartmentStatus::Archived => "archived",
        }
    }

    fn allowed_transitions(self) -> &'static [Self] {
        match self {
            DepartmentStatus::Active => &[Self::Archived],
            DepartmentStatus::Archived => &[Self::Active],
        }
    }

    // Departments have no linked credential; nothing consumes this mapping.
    fn grants_access(self) -> bool {
        matches!(self, DepartmentStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub building: Option<String>,
    pub head_of_department: Option<Uuid>,
    pub status: DepartmentStatus,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartmentDto {
    #[validate(length(min = 1))]
    pub name: String,
    pub building: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartmentDto {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub building: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDepartmentStatusDto {
    pub status: DepartmentStatus,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignHeadDto {
    pub instructor_id: Uuid,
}
