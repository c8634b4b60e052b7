//! Handoff from request handlers to the confirmation worker.

use crate::error::{NotificationError, NotificationResult};
use crate::models::OrderSummary;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Accepts order summaries for asynchronous delivery.
///
/// `notify` must not block: callers run it right after committing an order
/// and the response must not wait on email delivery.
pub trait OrderNotifier: Send + Sync {
    fn notify(&self, summary: OrderSummary) -> NotificationResult<()>;
}

pub type SharedNotifier = Arc<dyn OrderNotifier>;

/// [`OrderNotifier`] backed by a bounded `mpsc` channel.
#[derive(Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<OrderSummary>,
}

impl ChannelNotifier {
    pub fn new(sender: mpsc::Sender<OrderSummary>) -> Self {
        Self { sender }
    }

    /// Create a notifier and the receiving end for a worker.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OrderSummary>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(sender), receiver)
    }
}

impl OrderNotifier for ChannelNotifier {
    fn notify(&self, summary: OrderSummary) -> NotificationResult<()> {
        let order_id = summary.order_id;
        self.sender.try_send(summary).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => NotificationError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => NotificationError::QueueClosed,
        })?;

        debug!(order_id = %order_id, "Queued order confirmation");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn summary() -> OrderSummary {
        OrderSummary {
            order_id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            email: "buyer@example.com".to_string(),
            total: Decimal::new(1999, 2),
            products: vec![],
        }
    }

    #[tokio::test]
    async fn test_notify_delivers_to_receiver() {
        let (notifier, mut receiver) = ChannelNotifier::channel(4);
        let sent = summary();

        notifier.notify(sent.clone()).unwrap();

        assert_eq!(receiver.recv().await.unwrap(), sent);
    }

    #[tokio::test]
    async fn test_full_queue_is_rejected() {
        let (notifier, _receiver) = ChannelNotifier::channel(1);

        notifier.notify(summary()).unwrap();
        let result = notifier.notify(summary());

        assert!(matches!(result, Err(NotificationError::QueueFull)));
    }

    #[tokio::test]
    async fn test_closed_queue_is_rejected() {
        let (notifier, receiver) = ChannelNotifier::channel(4);
        drop(receiver);

        let result = notifier.notify(summary());

        assert!(matches!(result, Err(NotificationError::QueueClosed)));
    }
}
