use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application error carried through every service and handler.
///
/// Wraps an HTTP status with the underlying cause and an optional list of
/// field-level details (populated by the validation layer). Converted into
/// the standard `{success, statusCode, message, errors}` envelope at the
/// HTTP boundary.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
    pub errors: Vec<String>,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
            errors: Vec::new(),
        }
    }

    /// Attach field-level detail messages to the error envelope.
    pub fn with_details(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn unauthorized<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNAUTHORIZED, err)
    }

    pub fn forbidden<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::FORBIDDEN, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::CONFLICT, err)
    }

    pub fn too_many_requests<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::TOO_MANY_REQUESTS, err)
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    /// Maps storage-layer failures to the error taxonomy: unique-index
    /// violations become 409, foreign-key violations (a request referencing
    /// a missing row) become 400, everything else is a 500.
    pub fn from_database(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::conflict(anyhow::anyhow!("Duplicate field value"));
            }
            if db_err.is_foreign_key_violation() {
                return Self::bad_request(anyhow::anyhow!("Referenced record does not exist"));
            }
        }
        Self::internal(Error::from(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status.as_u16(), error = %self.error, "Request failed");
        }

        let body = Json(json!({
            "success": false,
            "statusCode": self.status.as_u16(),
            "message": self.error.to_string(),
            "errors": self.errors,
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_map_status() {
        assert_eq!(
            AppError::bad_request(anyhow::anyhow!("x")).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::unauthorized(anyhow::anyhow!("x")).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::forbidden(anyhow::anyhow!("x")).status,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::not_found(anyhow::anyhow!("x")).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::conflict(anyhow::anyhow!("x")).status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::too_many_requests(anyhow::anyhow!("x")).status,
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_blanket_from_is_internal() {
        let err: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_from_database_row_not_found() {
        let err = AppError::from_database(sqlx::Error::RowNotFound);
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_with_details() {
        let err = AppError::bad_request(anyhow::anyhow!("Validation error"))
            .with_details(vec!["email is invalid".to_string()]);
        assert_eq!(err.errors.len(), 1);
    }
}
