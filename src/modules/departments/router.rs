use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    assign_head, change_department_status, create_department, delete_department, get_department,
    get_departments, update_department,
};

pub fn init_departments_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_department).get(get_departments))
        .route(
            "/{id}",
            get(get_department)
                .patch(update_department)
                .delete(delete_department),
        )
        .route("/{id}/status", patch(change_department_status))
        .route("/{id}/head", patch(assign_head))
}
