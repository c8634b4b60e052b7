use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, FieldErrors};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum OrderError {
    /// Missing, or placed by someone other than the caller
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// The placing transaction failed without committing; safe to retry
    #[error("Transient store error: {0}")]
    Transient(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl From<FieldErrors> for OrderError {
    fn from(errors: FieldErrors) -> Self {
        OrderError::Validation(errors)
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(id) => AppError::NotFound(format!("Order {} not found", id)),
            OrderError::Validation(fields) => AppError::Validation(fields),
            OrderError::Transient(msg) => {
                tracing::warn!("Order transaction aborted: {}", msg);
                AppError::ServiceUnavailable(
                    "The order could not be placed, please try again".to_string(),
                )
            }
            OrderError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
