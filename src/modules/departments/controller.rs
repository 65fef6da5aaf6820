use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::instrument;
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    AssignHeadDto, ChangeDepartmentStatusDto, CreateDepartmentDto, Department,
    UpdateDepartmentDto,
};
use super::service::DepartmentService;

#[instrument(skip(state, dto))]
pub async fn create_department(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateDepartmentDto>,
) -> Result<(StatusCode, Json<Department>), AppError> {
    let department =
        DepartmentService::create_department(&state.db, state.cache.as_ref(), dto).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

#[instrument(skip(state))]
pub async fn get_departments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Department>>, AppError> {
    let departments =
        DepartmentService::get_all_departments(&state.db, state.cache.as_ref()).await?;
    Ok(Json(departments))
}

#[instrument(skip(state))]
pub async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Department>, AppError> {
    let department =
        DepartmentService::get_department_by_id(&state.db, state.cache.as_ref(), id).await?;
    Ok(Json(department))
}

#[instrument(skip(state, dto))]
pub async fn update_department(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateDepartmentDto>,
) -> Result<Json<Department>, AppError> {
    let department =
        DepartmentService::update_department(&state.db, state.cache.as_ref(), id, dto).await?;
    Ok(Json(department))
}

#[instrument(skip(state))]
pub async fn delete_department(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Department>, AppError> {
    let department =
        DepartmentService::soft_delete_department(&state.db, state.cache.as_ref(), id).await?;
    Ok(Json(department))
}

#[instrument(skip(state, dto))]
pub async fn change_department_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<ChangeDepartmentStatusDto>,
) -> Result<Json<Department>, AppError> {
    let department =
        DepartmentService::change_status(&state.db, state.cache.as_ref(), id, dto.status).await?;
    Ok(Json(department))
}

#[instrument(skip(state, dto))]
pub async fn assign_head(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AssignHeadDto>,
) -> Result<Json<Department>, AppError> {
    let department =
        DepartmentService::assign_head(&state.db, state.cache.as_ref(), id, dto).await?;
    Ok(Json(department))
}
