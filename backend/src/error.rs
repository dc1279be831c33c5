//! Error handling for the Pro Connect backend
//!
//! Business conditions (no match, no candidates) are returned as structured
//! results by the domain components; only the conditions below surface as
//! HTTP errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors. The three login failures stay distinct on
    // purpose: "not registered", "wrong credentials", and "not verified"
    // are separate user-facing messages.
    #[error("Email not registered")]
    EmailNotRegistered,

    #[error("Invalid password")]
    InvalidCredentials,

    #[error("Email not verified")]
    AccountNotVerified,

    // OTP errors
    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("OTP expired")]
    OtpExpired,

    #[error("Account already verified")]
    AlreadyVerified,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    // External service errors
    #[error("Text extraction error: {0}")]
    ExtractionError(String),

    #[error("Mailer error: {0}")]
    MailerError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::EmailNotRegistered => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "EMAIL_NOT_REGISTERED".to_string(),
                    message: "Email not registered".to_string(),
                    field: None,
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_CREDENTIALS".to_string(),
                    message: "Invalid password".to_string(),
                    field: None,
                },
            ),
            AppError::AccountNotVerified => (
                StatusCode::FORBIDDEN,
                ErrorDetail {
                    code: "ACCOUNT_NOT_VERIFIED".to_string(),
                    message: "Email not verified".to_string(),
                    field: None,
                },
            ),
            AppError::InvalidOtp => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_OTP".to_string(),
                    message: "Invalid OTP".to_string(),
                    field: None,
                },
            ),
            AppError::OtpExpired => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "OTP_EXPIRED".to_string(),
                    message: "OTP expired".to_string(),
                    field: None,
                },
            ),
            AppError::AlreadyVerified => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "ALREADY_VERIFIED".to_string(),
                    message: "Account already verified".to_string(),
                    field: None,
                },
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(message) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: None,
                },
            ),
            AppError::DuplicateEntry(what) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message: format!("A record with this {} already exists", what),
                    field: Some(what.clone()),
                },
            ),
            AppError::Conflict(message) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONFLICT".to_string(),
                    message: message.clone(),
                    field: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::InvalidStateTransition(message) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "INVALID_STATE_TRANSITION".to_string(),
                    message: message.clone(),
                    field: None,
                },
            ),
            AppError::ExtractionError(message) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "EXTRACTION_ERROR".to_string(),
                    message: format!("Text extraction error: {}", message),
                    field: None,
                },
            ),
            AppError::MailerError(message) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "MAILER_ERROR".to_string(),
                    message: format!("Mail delivery error: {}", message),
                    field: None,
                },
            ),
            AppError::StorageError(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "STORAGE_ERROR".to_string(),
                    message: format!("Storage error: {}", message),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(_) | AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging; internal detail never reaches the body.
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
