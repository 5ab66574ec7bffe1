use crate::error::Error;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// The JSON body of every response except preflight.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ApiResponse {
    pub fn ok<T: Into<String>>(message: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    /// Attach `data`, which is left out if it does not serialize.
    pub fn with_data<T: Serialize>(self, data: &T) -> Self {
        Self {
            data: serde_json::to_value(data).ok(),
            ..self
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// A failed request: a status and the message reported to the client.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new<T: Into<String>>(status: StatusCode, message: T) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let status = if e.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse {
            success: false,
            message: self.message,
            data: None,
        };
        (self.status, Json(body)).into_response()
    }
}
