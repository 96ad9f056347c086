use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Invalid(String),

    #[error("validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{0}")]
    Conflict(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("permission denied")]
    Forbidden,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(errors) => {
                let details: HashMap<String, Vec<String>> = errors
                    .field_errors()
                    .into_iter()
                    .map(|(field, field_errors)| {
                        let messages = field_errors
                            .iter()
                            .map(|e| match &e.message {
                                Some(message) => message.to_string(),
                                None => e.code.to_string(),
                            })
                            .collect();
                        (field.to_string(), messages)
                    })
                    .collect();
                let body = Json(json!({
                    "error": "one or more fields are invalid",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message.to_string()),
            AppError::Invalid(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message),
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "authentication required".to_string())
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, "permission denied".to_string()),
            ref e @ (AppError::Database(_) | AppError::Session(_)) => {
                tracing::error!("internal server error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
