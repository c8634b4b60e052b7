use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, FieldErrors};
use thiserror::Error;
use uuid::Uuid;

/// Message shown for any failed login
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Error)]
pub enum UserError {
    /// Missing, or not the caller
    #[error("User not found: {0}")]
    NotFound(Uuid),

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Another user already holds the token; the caller draws a new one
    #[error("Auth token already in use")]
    TokenTaken,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => AppError::NotFound(format!("User {} not found", id)),
            UserError::DuplicateEmail(_) => {
                AppError::Validation(FieldErrors::single("email", "has already been taken"))
            }
            UserError::InvalidCredentials => {
                AppError::UnprocessableEntity(INVALID_CREDENTIALS.to_string())
            }
            UserError::TokenTaken => {
                AppError::InternalServerError("Auth token collision escaped retry".to_string())
            }
            UserError::PasswordHash(msg) => {
                AppError::InternalServerError(format!("Password hash error: {}", msg))
            }
            UserError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
