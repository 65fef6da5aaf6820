use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    change_student_status, create_student, delete_student, get_student, get_students,
    update_student,
};

pub fn init_students_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_student).get(get_students))
        .route(
            "/{id}",
            get(get_student).patch(update_student).delete(delete_student),
        )
        .route("/{id}/status", patch(change_student_status))
}
