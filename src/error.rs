use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// A single invalid field, surfaced to the caller so the form can be
/// corrected and retried.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad input shape or range; carries field-level messages.
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// Bad credentials. Deliberately generic: does not say which of
    /// email/password was wrong.
    #[error("invalid credentials")]
    Auth,

    /// Row missing or owned by someone else. The two cases are
    /// indistinguishable to the caller.
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Session(#[from] tower_sessions::session::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(fields) => {
                let mut errors = serde_json::Map::new();
                for f in fields {
                    errors.entry(f.field.to_string()).or_insert(json!(f.message));
                }
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "errors": errors })),
                )
                    .into_response()
            }
            ApiError::Auth => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid credentials" })),
            )
                .into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Task not found" })),
            )
                .into_response(),
            ApiError::Store(e) => {
                error!(error = %e, "database failure");
                internal_error()
            }
            ApiError::Session(e) => {
                error!(error = %e, "session store failure");
                internal_error()
            }
            ApiError::Internal(e) => {
                error!(error = %e, "internal failure");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Something went wrong" })),
    )
        .into_response()
}
