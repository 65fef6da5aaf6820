use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::instrument;
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    ChangeInstructorStatusDto, CreateInstructorDto, Instructor, InstructorFilterParams,
    UpdateInstructorDto,
};
use super::service::InstructorService;

#[instrument(skip(state, dto))]
pub async fn create_instructor(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateInstructorDto>,
) -> Result<(StatusCode, Json<Instructor>), AppError> {
    let instructor =
        InstructorService::create_instructor(&state.db, state.cache.as_ref(), dto).await?;
    Ok((StatusCode::CREATED, Json(instructor)))
}

#[instrument(skip(state))]
pub async fn get_instructors(
    State(state): State<AppState>,
    Query(filters): Query<InstructorFilterParams>,
) -> Result<Json<Vec<Instructor>>, AppError> {
    let instructors =
        InstructorService::get_all_instructors(&state.db, state.cache.as_ref(), filters).await?;
    Ok(Json(instructors))
}

#[instrument(skip(state))]
pub async fn get_instructor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Instructor>, AppError> {
    let instructor =
        InstructorService::get_instructor_by_id(&state.db, state.cache.as_ref(), id).await?;
    Ok(Json(instructor))
}

#[instrument(skip(state, dto))]
pub async fn update_instructor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateInstructorDto>,
) -> Result<Json<Instructor>, AppError> {
    let instructor =
        InstructorService::update_instructor(&state.db, state.cache.as_ref(), id, dto).await?;
    Ok(Json(instructor))
}

#[instrument(skip(state))]
pub async fn delete_instructor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Instructor>, AppError> {
    let instructor =
        InstructorService::soft_delete_instructor(&state.db, state.cache.as_ref(), id).await?;
    Ok(Json(instructor))
}

#[instrument(skip(state, dto))]
pub async fn change_instructor_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<ChangeInstructorStatusDto>,
) -> Result<Json<Instructor>, AppError> {
    let instructor =
        InstructorService::change_status(&state.db, state.cache.as_ref(), id, dto.status).await?;
    Ok(Json(instructor))
}
