use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::instrument;
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    ChangeStudentStatusDto, CreateStudentDto, Student, StudentFilterParams, UpdateStudentDto,
};
use super::service::StudentService;

#[instrument(skip(state, dto))]
pub async fn create_student(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateStudentDto>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let student = StudentService::create_student(&state.db, state.cache.as_ref(), dto).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

#[instrument(skip(state))]
pub async fn get_students(
    State(state): State<AppState>,
    Query(filters): Query<StudentFilterParams>,
) -> Result<Json<Vec<Student>>, AppError> {
    let students =
        StudentService::get_all_students(&state.db, state.cache.as_ref(), filters).await?;
    Ok(Json(students))
}

#[instrument(skip(state))]
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Student>, AppError> {
    let student = StudentService::get_student_by_id(&state.db, state.cache.as_ref(), id).await?;
    Ok(Json(student))
}

#[instrument(skip(state, dto))]
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateStudentDto>,
) -> Result<Json<Student>, AppError> {
    let student = StudentService::update_student(&state.db, state.cache.as_ref(), id, dto).await?;
    Ok(Json(student))
}

#[instrument(skip(state))]
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Student>, AppError> {
    let student =
        StudentService::soft_delete_student(&state.db, state.cache.as_ref(), id).await?;
    Ok(Json(student))
}

#[instrument(skip(state, dto))]
pub async fn change_student_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<ChangeStudentStatusDto>,
) -> Result<Json<Student>, AppError> {
    let student =
        StudentService::change_status(&state.db, state.cache.as_ref(), id, dto.status).await?;
    Ok(Json(student))
}
