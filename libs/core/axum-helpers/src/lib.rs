//! # Axum Helpers
//!
//! Shared web plumbing for the marketplace services.
//!
//! ## Modules
//!
//! - **[`auth`]**: opaque bearer-token authentication (`AuthUser`, `TokenResolver`)
//! - **[`errors`]**: `AppError` and the `{"errors": ...}` response body
//! - **[`extractors`]**: UUID path and validated JSON extractors
//! - **[`http`]**: CORS and security-header middleware
//! - **[`server`]**: router assembly, health checks, graceful shutdown

pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{AuthUser, SharedTokenResolver, TokenResolver, authenticate, extract_token};

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app,
    create_router, health_router, run_health_checks, serve_with_cleanup, shutdown_signal,
};

pub use errors::{AppError, ErrorResponse, FieldErrors};

pub use extractors::{UuidPath, UuidPathPair, ValidatedJson, parse_path_uuid};
