//! Opaque bearer-token authentication.
//!
//! The [`authenticate`] middleware resolves the `Authorization` header
//! through a [`TokenResolver`] and stores the resulting [`AuthUser`] in the
//! request extensions. Protected handlers take `AuthUser` as an argument;
//! the extractor rejects with 401 when no identity was resolved.
//!
//! ```ignore
//! let resolver: SharedTokenResolver = Arc::new(users_service);
//!
//! let app = Router::new()
//!     .nest("/products", products::handlers::router(products_service))
//!     .layer(axum::middleware::from_fn_with_state(resolver, authenticate));
//!
//! async fn create(user: AuthUser, ValidatedJson(input): ValidatedJson<CreateProduct>) { /* ... */ }
//! ```

pub mod middleware;

pub use middleware::{authenticate, extract_token};

use crate::errors::AppError;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Identity resolved from a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// Looks up the user owning a token.
#[async_trait]
pub trait TokenResolver: Send + Sync {
    /// `Ok(None)` for tokens that belong to nobody.
    async fn resolve(&self, token: &str) -> Result<Option<AuthUser>, AppError>;
}

pub type SharedTokenResolver = Arc<dyn TokenResolver>;

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
