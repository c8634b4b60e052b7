//! Email provider implementations.
//!
//! This module contains the `EmailProvider` trait and the providers the
//! application can be configured with.

mod mock;
mod smtp;

pub use mock::MockProvider;
pub use smtp::{SmtpConfig, SmtpProvider};

use crate::error::NotificationResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Represents a sent email with provider-specific message ID.
#[derive(Debug, Clone)]
pub struct SentEmail {
    /// Provider-specific message ID for tracking.
    pub message_id: Option<String>,
    /// Whether the email was accepted for delivery.
    pub accepted: bool,
}

/// Email content ready for sending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailContent {
    pub from_email: String,
    pub from_name: String,
    pub to_email: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Trait for email sending providers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Send an email.
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail>;

    /// Get the provider name for logging.
    fn name(&self) -> &'static str;

    /// Check if the provider is reachable.
    async fn health_check(&self) -> NotificationResult<bool>;
}

pub type SharedEmailProvider = Arc<dyn EmailProvider>;
