//! Orders Domain
//!
//! Order placement against shared, finite stock, and per-user order
//! history.
//!
//! Placing an order reads and locks the requested products, runs the pure
//! [`engine`] (build placements, check stock, compute the total), writes
//! the order and its placements, takes the stock with conditional updates
//! and commits. Only then is a summary handed to the notification queue.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_notifications::ChannelNotifier;
//! use domain_orders::{InMemoryOrderRepository, OrderService, handlers};
//! use domain_products::InMemoryProductRepository;
//!
//! let products = InMemoryProductRepository::new();
//! let (notifier, _receiver) = ChannelNotifier::channel(64);
//!
//! let service = OrderService::new(
//!     InMemoryOrderRepository::new(products.store()),
//!     Arc::new(notifier),
//! );
//! let router = handlers::router(service);
//! ```

pub mod engine;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{OrderError, OrderResult};
pub use models::{CreateOrder, Order, OrderList, OrderParams, OrderProduct, ProductOrderLine};
pub use postgres::PgOrderRepository;
pub use repository::{InMemoryOrderRepository, OrderRepository, OrderStore, StoredOrder};
pub use service::OrderService;
