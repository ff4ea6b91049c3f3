//! API error types and HTTP response mapping.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;
use venueops_core::error::CoreError;

use crate::envelope::StandardResponse;

/// API result type.
pub type ApiResult<T> = Result<T, ApiError>;

/// An error rendered as a failed envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    #[must_use]
    pub fn missing_auth() -> Self {
        Self::unauthorized("Authorization header required")
    }

    #[must_use]
    pub fn invalid_token() -> Self {
        Self::unauthorized("Invalid or expired token")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(StandardResponse::<()>::failure(self.message)),
        )
            .into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::Validation(message) => Self::unprocessable(message),
            e @ CoreError::RecurrenceParse(_) => Self::unprocessable(e.to_string()),
            CoreError::NotFound(message) => Self::not_found(message),
            e @ (CoreError::Database(_) | CoreError::Migration(_)) => {
                error!(error = %e, "persistence failure");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::unprocessable(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::unprocessable(value.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        Self::unprocessable(value.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let cases = [
            (CoreError::Validation("title must not be blank".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (CoreError::RecurrenceParse("bad".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (CoreError::NotFound("Task not found".into()), StatusCode::NOT_FOUND),
            (CoreError::Database(sqlx_error()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (core, status) in cases {
            assert_eq!(ApiError::from(core).status(), status);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = ApiError::from(CoreError::Database(sqlx_error()));
        assert_eq!(err.message(), "Internal server error");
    }

    fn sqlx_error() -> sqlx::Error {
        sqlx::Error::PoolTimedOut
    }
}
