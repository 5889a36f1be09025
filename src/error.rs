//! Error types for the finance tracker

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::api::ApiResponse;

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Error, Debug)]
pub enum TrackerError {

    // =============================
    // Domain Errors
    // =============================

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Background task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl TrackerError {
    pub fn invalid(message: impl Into<String>) -> Self {
        TrackerError::InvalidInput(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        TrackerError::NotFound(what.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            TrackerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
            TrackerError::Conflict(_) => StatusCode::CONFLICT,
            TrackerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            TrackerError::Config(_)
            | TrackerError::DatabaseError(_)
            | TrackerError::Sql(_)
            | TrackerError::SerializationError(_)
            | TrackerError::IoError(_)
            | TrackerError::PasswordHash(_)
            | TrackerError::TaskJoin(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Storage failures are logged in full but reported generically.
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ApiResponse::error(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            TrackerError::invalid("term").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TrackerError::not_found("loan 7").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            TrackerError::Conflict("email".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            TrackerError::Unauthorized("token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            TrackerError::DatabaseError("down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display_includes_detail() {
        let err = TrackerError::invalid("term_months must be positive");
        assert_eq!(err.to_string(), "Invalid input: term_months must be positive");
    }
}
