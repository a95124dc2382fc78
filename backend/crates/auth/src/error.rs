//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system. Every variant maps
//! to exactly one HTTP status; the JSON envelope is rendered by the
//! kernel conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{
    app_error::{AppError, FieldError},
    kind::ErrorKind,
};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Input validation failed (carries per-field details)
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// No token in Authorization header, cookie, or body
    #[error("Authentication token not provided")]
    MissingToken,

    /// Malformed token or bad signature
    #[error("Invalid token")]
    InvalidToken,

    /// Token signature is fine but the token is past its expiry
    #[error("Token has expired")]
    TokenExpired,

    /// Authenticated identity required but absent
    #[error("Authentication required")]
    Unauthenticated,

    /// Wrong email or password (deliberately indistinguishable)
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Account has been deactivated
    #[error("Account is deactivated")]
    AccountDisabled,

    /// Account is locked (too many failed attempts)
    #[error("Account is temporarily locked due to multiple failed login attempts")]
    AccountLocked,

    /// Role lacks the required capability
    #[error("Insufficient permissions")]
    Forbidden,

    /// User does not exist
    #[error("User not found")]
    UserNotFound,

    /// Email already registered
    #[error("A user with this email already exists")]
    EmailTaken,

    /// Reset token unknown, already used, or past its expiry
    #[error("Invalid or expired password reset token")]
    InvalidResetToken,

    /// Verification token unknown or already used
    #[error("Invalid verification token")]
    InvalidVerificationToken,

    /// Email is already verified, nothing to resend
    #[error("Email is already verified")]
    EmailAlreadyVerified,

    /// Password confirmation on a sensitive operation failed
    #[error("Current password is incorrect")]
    InvalidCurrentPassword,

    /// New password equals the current one
    #[error("New password must be different from the current password")]
    PasswordUnchanged,

    /// Request body exceeded the configured limit
    #[error("Request body too large")]
    PayloadTooLarge,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_)
            | AuthError::InvalidResetToken
            | AuthError::InvalidVerificationToken
            | AuthError::EmailAlreadyVerified
            | AuthError::InvalidCurrentPassword
            | AuthError::PasswordUnchanged => StatusCode::BAD_REQUEST,
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::Unauthenticated
            | AuthError::InvalidCredentials
            | AuthError::AccountDisabled => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AuthError::AccountLocked => StatusCode::LOCKED,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_)
            | AuthError::InvalidResetToken
            | AuthError::InvalidVerificationToken
            | AuthError::EmailAlreadyVerified
            | AuthError::InvalidCurrentPassword
            | AuthError::PasswordUnchanged => ErrorKind::BadRequest,
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::Unauthenticated
            | AuthError::InvalidCredentials
            | AuthError::AccountDisabled => ErrorKind::Unauthorized,
            AuthError::Forbidden => ErrorKind::Forbidden,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::PayloadTooLarge => ErrorKind::PayloadTooLarge,
            AuthError::AccountLocked => ErrorKind::Locked,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    ///
    /// Internal details (SQL errors, messages of `Internal`) are never
    /// forwarded to clients; they are logged instead.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::Validation(errors) => AppError::validation(errors.clone()),
            AuthError::Database(_) => AppError::internal("Internal server error"),
            AuthError::Internal(_) => AppError::internal("Internal server error"),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountLocked => {
                tracing::warn!("Request for a locked account");
            }
            AuthError::EmailTaken => {
                tracing::warn!("Registration attempt with an existing email");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AuthError::Validation(vec![]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::MissingToken.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidToken.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::TokenExpired.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::AccountDisabled.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::UserNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AuthError::EmailTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::PayloadTooLarge.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(AuthError::AccountLocked.status_code(), StatusCode::LOCKED);
        assert_eq!(
            AuthError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let err = AuthError::Internal("secret detail".into());
        let app = err.to_app_error();
        assert!(!app.message().contains("secret detail"));
    }

    #[test]
    fn test_validation_keeps_field_errors() {
        let err = AuthError::Validation(vec![FieldError::new("email", "Invalid email format")]);
        let app = err.to_app_error();
        assert_eq!(app.field_errors().len(), 1);
        assert_eq!(app.status_code(), 400);
    }
}
