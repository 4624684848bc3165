//! Unified error model
//! One taxonomy for the whole service; each variant knows its HTTP status
//! and its user-safe message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User with such email already exists")]
    UserAlreadyExists,

    #[error("Verification code is invalid")]
    VerificationCodeInvalid,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session does not match client")]
    SessionMismatch,

    #[error("Access forbidden")]
    AccessForbidden,

    #[error("User doesn't exist")]
    UserNotFound,

    #[error("Project doesn't exist")]
    ProjectNotFound,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InvalidCredentials
            | AppError::UserAlreadyExists
            | AppError::VerificationCodeInvalid => StatusCode::BAD_REQUEST,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::SessionNotFound
            | AppError::SessionMismatch
            | AppError::AccessForbidden => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::ProjectNotFound => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Storage(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to echo to a client. Store driver details stay in the
    /// server log only.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => "Storage unavailable".to_string(),
            AppError::Storage(_) => "File storage unavailable".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::RateLimitExceeded => "Rate limit exceeded".to_string(),
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            AppError::UserAlreadyExists => "User with such email already exists".to_string(),
            AppError::VerificationCodeInvalid => "Verification code is invalid".to_string(),
            AppError::InvalidToken => "Invalid token".to_string(),
            // Replay and expiry surface identically on refresh
            AppError::SessionNotFound | AppError::SessionMismatch => "Invalid request".to_string(),
            AppError::AccessForbidden => "Access forbidden".to_string(),
            AppError::UserNotFound => "User doesn't exist".to_string(),
            AppError::ProjectNotFound => "Project doesn't exist".to_string(),
        }
    }

    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }

    pub fn validation(msg: &str) -> Self {
        AppError::Validation(msg.to_string())
    }

    pub fn internal(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

/// Error response DTO
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
    pub request_id: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code(),
                message: self.user_message(),
                request_id,
            },
        };

        tracing::error!(
            code = self.code(),
            message = %self,
            request_id = %error_response.error.request_id,
            "Application error"
        );

        (status, Json(error_response)).into_response()
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::InvalidCredentials.code(), 400);
        assert_eq!(AppError::UserAlreadyExists.code(), 400);
        assert_eq!(AppError::VerificationCodeInvalid.code(), 400);
        assert_eq!(AppError::Validation("bad".to_string()).code(), 400);
        assert_eq!(AppError::InvalidToken.code(), 401);
        assert_eq!(AppError::SessionNotFound.code(), 403);
        assert_eq!(AppError::SessionMismatch.code(), 403);
        assert_eq!(AppError::AccessForbidden.code(), 403);
        assert_eq!(AppError::UserNotFound.code(), 404);
        assert_eq!(AppError::ProjectNotFound.code(), 404);
        assert_eq!(AppError::Internal("boom".to_string()).code(), 500);
    }

    #[test]
    fn test_user_message_no_sensitive_info() {
        let error = AppError::Database(sqlx::Error::RowNotFound);
        let message = error.user_message();
        assert_eq!(message, "Storage unavailable");
        assert!(!message.contains("sqlx"));
    }

    #[test]
    fn test_replay_and_mismatch_share_user_message() {
        // Refresh failures must not leak which check tripped
        assert_eq!(
            AppError::SessionNotFound.user_message(),
            AppError::SessionMismatch.user_message()
        );
    }
}
