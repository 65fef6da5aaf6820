mod common;

use axum::http::StatusCode;
use common::{
    admin_token, authed_json_request, authed_request, body_json, create_test_department,
    generate_unique_email, json_request, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

async fn create_student(
    app: &axum::Router,
    token: &str,
    department_id: uuid::Uuid,
    email: &str,
) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/students",
            token,
            json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": email,
                "departmentId": department_id,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_student_also_creates_credential(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let token = admin_token(&pool, &app).await;
    let department_id = create_test_department(&pool, "CS").await;
    let email = generate_unique_email();

    let student = create_student(&app, &token, department_id, &email).await;
    assert_eq!(student["status"], "active");
    assert_eq!(student["isActive"], true);

    // The credential record was created in the same transaction, with the
    // default password.
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({"email": email, "password": "Student@123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["role"], "student");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_student_duplicate_email_conflict(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let token = admin_token(&pool, &app).await;
    let department_id = create_test_department(&pool, "CS").await;
    let email = generate_unique_email();

    create_student(&app, &token, department_id, &email).await;

    let response = app
        .oneshot(authed_json_request(
            "POST",
            "/api/students",
            &token,
            json!({
                "firstName": "Ada",
                "lastName": "Again",
                "email": email.to_uppercase(),
                "departmentId": department_id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_status_transition_table_enforced(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let token = admin_token(&pool, &app).await;
    let department_id = create_test_department(&pool, "CS").await;

    let student =
        create_student(&app, &token, department_id, &generate_unique_email()).await;
    let id = student["id"].as_str().unwrap().to_string();
    let status_uri = format!("/api/students/{}/status", id);

    // active -> graduated is legal...
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "PATCH",
            &status_uri,
            &token,
            json!({"status": "graduated"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // ...graduated is terminal.
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "PATCH",
            &status_uri,
            &token,
            json!({"status": "active"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The stored status was left untouched by the rejected transition.
    let response = app
        .oneshot(authed_request(
            "GET",
            &format!("/api/students/{}", id),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["status"], "graduated");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_suspension_deactivates_credential(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let token = admin_token(&pool, &app).await;
    let department_id = create_test_department(&pool, "CS").await;
    let email = generate_unique_email();

    let student = create_student(&app, &token, department_id, &email).await;
    let id = student["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "PATCH",
            &format!("/api/students/{}/status", id),
            &token,
            json!({"status": "suspended"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The suspended student cannot authenticate.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({"email": email, "password": "Student@123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Reinstating restores access.
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "PATCH",
            &format!("/api/students/{}/status", id),
            &token,
            json!({"status": "active"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({"email": email, "password": "Student@123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_soft_delete_student(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let token = admin_token(&pool, &app).await;
    let department_id = create_test_department(&pool, "CS").await;
    let email = generate_unique_email();

    let student = create_student(&app, &token, department_id, &email).await;
    let id = student["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(authed_request(
            "DELETE",
            &format!("/api/students/{}", id),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Non-destructive: the record is still there, suspended and inactive.
    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            &format!("/api/students/{}", id),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["isActive"], false);
    assert_eq!(body["status"], "suspended");

    // Listings exclude it.
    let response = app
        .clone()
        .oneshot(authed_request("GET", "/api/students", &token))
        .await
        .unwrap();
    let listed = body_json(response)
        .await
        .as_array()
        .unwrap()
        .iter()
        .any(|s| s["id"].as_str() == Some(&id));
    assert!(!listed);

    // The credential is deactivated with it.
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({"email": email, "password": "Student@123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_student_email_propagates_to_credential(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let token = admin_token(&pool, &app).await;
    let department_id = create_test_department(&pool, "CS").await;

    let student =
        create_student(&app, &token, department_id, &generate_unique_email()).await;
    let id = student["id"].as_str().unwrap();
    let new_email = generate_unique_email();

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "PATCH",
            &format!("/api/students/{}", id),
            &token,
            json!({"email": new_email}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({"email": new_email, "password": "Student@123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_students_with_status_filter(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let token = admin_token(&pool, &app).await;
    let department_id = create_test_department(&pool, "CS").await;

    let graduate =
        create_student(&app, &token, department_id, &generate_unique_email()).await;
    create_student(&app, &token, department_id, &generate_unique_email()).await;

    let graduate_id = graduate["id"].as_str().unwrap();
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "PATCH",
            &format!("/api/students/{}/status", graduate_id),
            &token,
            json!({"status": "graduated"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(authed_request(
            "GET",
            "/api/students?status=graduated",
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let students = body.as_array().unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["id"].as_str(), Some(graduate_id));
}
