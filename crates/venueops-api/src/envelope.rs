//! The `{isSuccess, data, message}` body every endpoint returns.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct StandardResponse<T> {
    #[serde(rename = "isSuccess")]
    pub is_success: bool,
    pub data: Option<T>,
    pub message: String,
}

impl<T> StandardResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            is_success: true,
            data: Some(data),
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            data: None,
            message: message.into(),
        }
    }
}

/// A successful envelope paired with its HTTP status.
#[derive(Debug)]
pub struct Envelope<T> {
    status: StatusCode,
    body: StandardResponse<T>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: StandardResponse::success(data, message),
        }
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED,
            body: StandardResponse::success(data, message),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
