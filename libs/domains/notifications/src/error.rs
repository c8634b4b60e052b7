//! Error types for the notifications domain.

use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Errors that can occur in the notifications domain.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The queue is at capacity; the notification was not accepted.
    #[error("Notification queue is full")]
    QueueFull,

    /// The worker has stopped and no longer accepts notifications.
    #[error("Notification queue is closed")]
    QueueClosed,

    /// Email provider error.
    #[error("Email provider error: {0}")]
    ProviderError(String),

    /// Template rendering error.
    #[error("Template rendering error: {0}")]
    TemplateError(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl NotificationError {
    /// Whether sending again may succeed.
    ///
    /// Bad addresses and broken templates fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NotificationError::ProviderError(_))
    }
}

impl From<handlebars::RenderError> for NotificationError {
    fn from(err: handlebars::RenderError) -> Self {
        NotificationError::TemplateError(err.to_string())
    }
}

impl From<core_config::ConfigError> for NotificationError {
    fn from(err: core_config::ConfigError) -> Self {
        NotificationError::ConfigError(err.to_string())
    }
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::QueueFull | NotificationError::QueueClosed => {
                AppError::ServiceUnavailable(err.to_string())
            }
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl IntoResponse for NotificationError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
