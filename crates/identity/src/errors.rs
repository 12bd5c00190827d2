use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Identity service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Identity store lock poisoned")]
    Poisoned,
}

/// Errors surfaced by the identity service handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Identity(IdentityError::InvalidIdentifier(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::Identity(e) => {
                error!("Identity provider error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
