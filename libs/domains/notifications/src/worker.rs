//! Background worker that turns order summaries into confirmation emails.

use crate::error::{NotificationError, NotificationResult};
use crate::models::{OrderConfirmationData, OrderSummary};
use crate::providers::{EmailContent, SharedEmailProvider};
use crate::templates::TemplateEngine;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse};
use database::{RetryConfig, retry_with_backoff_if};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, instrument, warn};

/// Sender identity and delivery policy for confirmation emails.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub from_email: String,
    pub from_name: String,
    pub retry: RetryConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            from_email: "no-reply@marketplace.com".to_string(),
            from_name: "Marketplace".to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl FromEnv for WorkerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            from_email: env_or_default("SMTP_FROM_EMAIL", &defaults.from_email),
            from_name: env_or_default("SMTP_FROM_NAME", &defaults.from_name),
            retry: defaults
                .retry
                .with_max_retries(env_parse("EMAIL_MAX_RETRIES", 3u32)?),
        })
    }
}

/// Consumes [`OrderSummary`] values from the queue and emails the buyer.
///
/// Provider failures are retried with exponential backoff. An email that
/// still fails is logged and dropped so one bad message cannot stall the
/// queue.
pub struct OrderConfirmationWorker {
    receiver: mpsc::Receiver<OrderSummary>,
    provider: SharedEmailProvider,
    templates: TemplateEngine,
    config: WorkerConfig,
}

impl OrderConfirmationWorker {
    pub fn new(
        receiver: mpsc::Receiver<OrderSummary>,
        provider: SharedEmailProvider,
    ) -> NotificationResult<Self> {
        Self::with_config(receiver, provider, WorkerConfig::default())
    }

    pub fn with_config(
        receiver: mpsc::Receiver<OrderSummary>,
        provider: SharedEmailProvider,
        config: WorkerConfig,
    ) -> NotificationResult<Self> {
        Ok(Self {
            receiver,
            provider,
            templates: TemplateEngine::new()?,
            config,
        })
    }

    /// Run until shutdown is signalled or every sender is gone.
    ///
    /// On shutdown the queue is closed and whatever is already queued is
    /// still delivered.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(provider = self.provider.name(), "Starting order confirmation worker");

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Received shutdown signal, draining notification queue");
                        break;
                    }
                }

                next = self.receiver.recv() => match next {
                    Some(summary) => self.process(summary).await,
                    None => {
                        info!("Notification queue closed, stopping worker");
                        return;
                    }
                },
            }
        }

        self.receiver.close();
        while let Some(summary) = self.receiver.recv().await {
            self.process(summary).await;
        }

        info!("Order confirmation worker stopped");
    }

    #[instrument(skip(self, summary), fields(order_id = %summary.order_id))]
    async fn process(&self, summary: OrderSummary) {
        let content = match self.build_email(&summary) {
            Ok(content) => content,
            Err(e) => {
                error!(error = %e, "Failed to render order confirmation, dropping");
                return;
            }
        };

        let provider = &self.provider;
        let content = &content;
        let result = retry_with_backoff_if(
            || provider.send(content),
            self.config.retry.clone(),
            NotificationError::is_retryable,
        )
        .await;

        match result {
            Ok(sent) => info!(
                to = %summary.email,
                message_id = ?sent.message_id,
                "Order confirmation sent"
            ),
            Err(e) => warn!(
                to = %summary.email,
                error = %e,
                "Giving up on order confirmation"
            ),
        }
    }

    fn build_email(&self, summary: &OrderSummary) -> NotificationResult<EmailContent> {
        let rendered = self
            .templates
            .render_order_confirmation(&OrderConfirmationData::from(summary))?;

        Ok(EmailContent {
            from_email: self.config.from_email.clone(),
            from_name: self.config.from_name.clone(),
            to_email: summary.email.clone(),
            subject: rendered.subject,
            html_body: rendered.html,
            text_body: rendered.text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderedProduct;
    use crate::notifier::{ChannelNotifier, OrderNotifier};
    use crate::providers::{MockEmailProvider, MockProvider};
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use uuid::Uuid;

    fn fast_config() -> WorkerConfig {
        WorkerConfig {
            retry: RetryConfig::new()
                .with_max_retries(3)
                .with_initial_delay(1)
                .without_jitter(),
            ..WorkerConfig::default()
        }
    }

    fn summary(email: &str) -> OrderSummary {
        OrderSummary {
            order_id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            email: email.to_string(),
            total: Decimal::new(4550, 2),
            products: vec![
                OrderedProduct {
                    product_id: Uuid::now_v7(),
                    title: "Kettle".to_string(),
                    price: Decimal::new(2000, 2),
                    quantity: 2,
                },
                OrderedProduct {
                    product_id: Uuid::now_v7(),
                    title: "Tea".to_string(),
                    price: Decimal::new(550, 2),
                    quantity: 1,
                },
            ],
        }
    }

    /// Queue summaries, then shut down and wait for the drain to finish.
    async fn deliver(provider: SharedEmailProvider, summaries: Vec<OrderSummary>) {
        let (notifier, receiver) = ChannelNotifier::channel(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = OrderConfirmationWorker::with_config(receiver, provider, fast_config())
            .unwrap();

        for summary in summaries {
            notifier.notify(summary).unwrap();
        }

        let handle = tokio::spawn(worker.run(shutdown_rx));
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sends_confirmation_to_buyer() {
        let provider = MockProvider::new();
        let order = summary("buyer@example.com");
        let order_id = order.order_id;

        deliver(Arc::new(provider.clone()), vec![order]).await;

        let sent = provider.sent_emails().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to_email, "buyer@example.com");
        assert_eq!(sent[0].from_email, "no-reply@marketplace.com");
        assert_eq!(sent[0].subject, "Order Confirmation");
        assert!(sent[0].text_body.contains(&format!("Order: #{}", order_id)));
        assert!(sent[0].text_body.contains("You ordered 2 products"));
    }

    #[tokio::test]
    async fn test_retries_transient_provider_failures() {
        let provider = MockProvider::failing_first(2);

        deliver(Arc::new(provider.clone()), vec![summary("buyer@example.com")]).await;

        assert_eq!(provider.sent_count().await, 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries_and_keeps_going() {
        let provider = MockProvider::failing_first(4);

        deliver(
            Arc::new(provider.clone()),
            vec![summary("first@example.com"), summary("second@example.com")],
        )
        .await;

        assert!(!provider.was_sent_to("first@example.com").await);
        assert!(provider.was_sent_to("second@example.com").await);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let mut provider = MockEmailProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_send()
            .times(1)
            .returning(|email| Err(NotificationError::InvalidEmail(email.to_email.clone())));

        deliver(Arc::new(provider), vec![summary("broken")]).await;
    }

    #[tokio::test]
    async fn test_stops_when_all_senders_are_dropped() {
        let (notifier, receiver) = ChannelNotifier::channel(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let provider = MockProvider::new();
        let worker = OrderConfirmationWorker::with_config(
            receiver,
            Arc::new(provider.clone()),
            fast_config(),
        )
        .unwrap();

        notifier.notify(summary("buyer@example.com")).unwrap();
        drop(notifier);

        worker.run(shutdown_rx).await;
        assert_eq!(provider.sent_count().await, 1);
    }

    #[test]
    fn test_worker_config_from_env() {
        temp_env::with_vars(
            [
                ("SMTP_FROM_EMAIL", Some("orders@shop.test")),
                ("SMTP_FROM_NAME", None),
                ("EMAIL_MAX_RETRIES", Some("5")),
            ],
            || {
                let config = WorkerConfig::from_env().unwrap();
                assert_eq!(config.from_email, "orders@shop.test");
                assert_eq!(config.from_name, "Marketplace");
                assert_eq!(config.retry.max_retries, 5);
            },
        );
    }
}
