//! Users Domain
//!
//! Accounts, sessions and the opaque auth tokens that identify callers.
//!
//! # Features
//!
//! - Signup, profile, self-only update and delete (with cascade)
//! - Password hashing with Argon2
//! - Login/logout issuing and rotating 64-character tokens
//! - [`TokenResolver`](axum_helpers::TokenResolver) implementation for the
//!   authentication middleware
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /users and /sessions endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Password hashing, token issuance, self-only checks
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← In-memory or Postgres (transactional cascade delete)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← User, request bodies, responses
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum_helpers::SharedTokenResolver;
//! use domain_users::{handlers, repository::InMemoryUserRepository, service::UserService};
//!
//! let service = UserService::new(InMemoryUserRepository::new());
//! let resolver: SharedTokenResolver = Arc::new(service.clone());
//!
//! let router = handlers::router(service);
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{UserError, UserResult};
pub use models::{
    LoginRequest, SessionResponse, SignupRequest, UpdateUserRequest, User, UserResponse,
};
pub use postgres::PostgresUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::{RandomTokens, TokenGenerator, UserService};
