use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use snip_core::ShortenerError;
use tracing::error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    Shortener(ShortenerError),
    InvalidJson(String),
    Internal,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

impl From<ShortenerError> for AppError {
    fn from(err: ShortenerError) -> Self {
        AppError::Shortener(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidJson(rejection.body_text())
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        const INTERNAL: &str = "internal server error";

        match self {
            AppError::Shortener(err @ ShortenerError::EmptyUrl) => {
                (StatusCode::BAD_REQUEST, "empty_url", err.to_string())
            }
            AppError::Shortener(err @ ShortenerError::InvalidUrl(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_url", err.to_string())
            }
            AppError::Shortener(err @ ShortenerError::InvalidExpiration(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_expiration", err.to_string())
            }
            AppError::Shortener(err @ ShortenerError::NotFound) => {
                (StatusCode::NOT_FOUND, "not_found", err.to_string())
            }
            AppError::Shortener(
                err @ (ShortenerError::TooManyCollisions { .. } | ShortenerError::Storage(_)),
            ) => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    INTERNAL.to_string(),
                )
            }
            AppError::InvalidJson(message) => {
                (StatusCode::BAD_REQUEST, "invalid_json", message.clone())
            }
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                INTERNAL.to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = self.parts();
        (status, Json(ErrorResponse { error, message })).into_response()
    }
}
