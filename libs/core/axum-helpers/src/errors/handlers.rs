use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{ErrorResponse, NOT_FOUND};

/// Fallback for unmatched routes, same body as a missing resource.
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::message(NOT_FOUND))).into_response()
}
