use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    change_instructor_status, create_instructor, delete_instructor, get_instructor,
    get_instructors, update_instructor,
};

pub fn init_instructors_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_instructor).get(get_instructors))
        .route(
            "/{id}",
            get(get_instructor)
                .patch(update_instructor)
                .delete(delete_instructor),
        )
        .route("/{id}/status", patch(change_instructor_status))
}
