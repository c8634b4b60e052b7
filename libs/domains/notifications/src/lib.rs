//! Notifications Domain
//!
//! Order confirmation emails, sent outside the request that placed the order.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Order Service  │  ← Publishes an OrderSummary after commit
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ ChannelNotifier │  ← Bounded mpsc queue, never blocks the request
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │  Confirmation   │  ← Renders the email, retries with backoff
//! │     Worker      │
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ Email Provider  │  ← SMTP or in-memory mock
//! └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_notifications::{ChannelNotifier, OrderConfirmationWorker, providers::MockProvider};
//!
//! let (notifier, receiver) = ChannelNotifier::channel(1024);
//! let worker = OrderConfirmationWorker::new(receiver, Arc::new(MockProvider::new()))?;
//! tokio::spawn(worker.run(shutdown.subscribe()));
//!
//! // later, from the order service
//! notifier.notify(summary)?;
//! ```

pub mod error;
pub mod models;
pub mod notifier;
pub mod providers;
pub mod templates;
pub mod worker;

pub use error::{NotificationError, NotificationResult};
pub use models::{OrderConfirmationData, OrderSummary, OrderedProduct};
pub use notifier::{ChannelNotifier, OrderNotifier, SharedNotifier};
pub use providers::{EmailContent, EmailProvider, SentEmail};
pub use templates::{RenderedEmail, TemplateEngine};
pub use worker::{OrderConfirmationWorker, WorkerConfig};
