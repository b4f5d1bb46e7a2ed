//! API error taxonomy and its HTTP mapping
//!
//! Validation and not-found failures return a specific, actionable
//! message; storage and model failures are logged with their cause and
//! answered with a generic body so internal detail never leaks.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::assistant::CoachError;
use crate::workout::WorkoutError;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed or out-of-range input, rejected before core logic runs
    Validation(String),
    Unauthorized,
    NotFound,
    Conflict(&'static str),
    /// Storage or other internal failure; detail goes to the log only
    Internal,
    /// Model call failed or timed out; no session mutation happened
    Assistant,
}

impl From<WorkoutError> for ApiError {
    fn from(err: WorkoutError) -> Self {
        match err {
            WorkoutError::InvalidInput(msg) => ApiError::Validation(msg.to_string()),
            WorkoutError::NotFound => ApiError::NotFound,
            WorkoutError::Storage(cause) => {
                error!(%cause, "storage failure");
                ApiError::Internal
            }
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(cause: rusqlite::Error) -> Self {
        error!(%cause, "storage failure");
        ApiError::Internal
    }
}

impl From<CoachError> for ApiError {
    fn from(cause: CoachError) -> Self {
        error!(%cause, "assistant failure");
        ApiError::Assistant
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "invalid token".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.to_string()),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()),
            ApiError::Assistant => (StatusCode::BAD_GATEWAY, "assistant unavailable".to_string()),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
