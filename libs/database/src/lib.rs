//! Database access shared by the marketplace services.
//!
//! # Features
//!
//! - `postgres` (default): PostgreSQL through SeaORM
//! - `config`: `core_config::FromEnv` for [`postgres::PostgresConfig`]
//!
//! ```ignore
//! use database::postgres::{self, PostgresConfig};
//! use database::common::RetryConfig;
//! use migration::Migrator;
//!
//! let db = postgres::connect_from_config_with_retry(
//!     PostgresConfig::from_env()?,
//!     Some(RetryConfig::new().with_max_retries(5)),
//! )
//! .await?;
//! postgres::run_migrations::<Migrator>(&db, "marketplace_api").await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult, RetryConfig, retry_with_backoff, retry_with_backoff_if};
