//! JSON error responses

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// JSON request body whose rejections use the [`ApiError`] body shape
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Error returned by API handlers as `{"status":"error","message":...}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<marionette_core::Error> for ApiError {
    fn from(error: marionette_core::Error) -> Self {
        use marionette_core::Error;
        let status = match error {
            Error::EmptyInput | Error::Config(_) | Error::Parse(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({"status": "error", "message": self.message}));
        (self.status, body).into_response()
    }
}
