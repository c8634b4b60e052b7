//! UUID path parameter extractors.
//!
//! An id that does not parse cannot name an existing resource, so it is
//! reported exactly like a missing one (404).

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

/// Extractor for a single UUID path parameter.
///
/// ```ignore
/// async fn show(UuidPath(id): UuidPath) -> String {
///     format!("Product ID: {}", id)
/// }
///
/// let app = Router::new().route("/products/{id}", get(show));
/// ```
pub struct UuidPath(pub Uuid);

/// Extractor for routes with two UUID parameters, in path order.
pub struct UuidPathPair(pub Uuid, pub Uuid);

/// Parse a raw path segment, mapping failures to not-found.
pub fn parse_path_uuid(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("Invalid UUID: {}", raw)))
}

impl<S> FromRequestParts<S> for UuidPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| e.into_response())?;

        parse_path_uuid(&id)
            .map(UuidPath)
            .map_err(IntoResponse::into_response)
    }
}

impl<S> FromRequestParts<S> for UuidPathPair
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((first, second)) = Path::<(String, String)>::from_request_parts(parts, state)
            .await
            .map_err(|e| e.into_response())?;

        let first = parse_path_uuid(&first).map_err(IntoResponse::into_response)?;
        let second = parse_path_uuid(&second).map_err(IntoResponse::into_response)?;
        Ok(UuidPathPair(first, second))
    }
}
