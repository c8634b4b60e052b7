//! Shared application state.

use domain_notifications::SharedNotifier;

/// Handed to the route builders once at startup; the domain services take
/// what they need from it (cheap `Arc` clones).
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL database connection pool
    pub db: database::postgres::DatabaseConnection,
    /// Producer side of the order confirmation queue
    pub notifier: SharedNotifier,
}
