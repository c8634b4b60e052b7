//! Reusable OpenAPI response types for consistent API documentation.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Missing or unknown auth token",
    content_type = "application/json",
    example = json!({ "errors": "Not authenticated" })
)]
pub struct UnauthorizedResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Resource not found, or not owned by the caller",
    content_type = "application/json",
    example = json!({ "errors": "Not found" })
)]
pub struct NotFoundResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Validation failed",
    content_type = "application/json",
    example = json!({
        "errors": {
            "title": ["can't be blank"],
            "price": ["is not a number"]
        }
    })
)]
pub struct ValidationErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Temporarily unavailable, safe to retry",
    content_type = "application/json",
    example = json!({ "errors": "Order could not be placed, please retry" })
)]
pub struct ServiceUnavailableResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({ "errors": "Internal server error" })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);
