//! In-memory provider that records every email instead of sending it.

use super::{EmailContent, EmailProvider, SentEmail};
use crate::error::{NotificationError, NotificationResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Captures sent emails; can be told to fail a number of sends first.
#[derive(Clone, Default)]
pub struct MockProvider {
    sent: Arc<Mutex<Vec<EmailContent>>>,
    failures_left: Arc<AtomicU32>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose first `failures` sends return a provider error.
    pub fn failing_first(failures: u32) -> Self {
        Self {
            sent: Arc::default(),
            failures_left: Arc::new(AtomicU32::new(failures)),
        }
    }

    pub async fn sent_emails(&self) -> Vec<EmailContent> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn was_sent_to(&self, email: &str) -> bool {
        self.sent.lock().await.iter().any(|e| e.to_email == email)
    }
}

#[async_trait]
impl EmailProvider for MockProvider {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail> {
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(NotificationError::ProviderError("Mock failure".to_string()));
        }

        self.sent.lock().await.push(email.clone());

        Ok(SentEmail {
            message_id: Some(format!("mock-{}", Uuid::now_v7())),
            accepted: true,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    async fn health_check(&self) -> NotificationResult<bool> {
        Ok(true)
    }
}
