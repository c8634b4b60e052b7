//! Notification payloads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable snapshot of a committed order, handed to the worker.
///
/// Everything needed to render the email is captured at commit time so
/// the worker never reads the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub total: Decimal,
    pub products: Vec<OrderedProduct>,
}

/// One line of an order as shown in the confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedProduct {
    pub product_id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub quantity: i32,
}

impl OrderSummary {
    /// Number of products on the order, one per placement.
    pub fn product_count(&self) -> usize {
        self.products.len()
    }
}

/// Template data for the order confirmation email.
#[derive(Debug, Clone, Serialize)]
pub struct OrderConfirmationData {
    pub order_id: String,
    pub total: String,
    pub product_count: usize,
    pub products: Vec<OrderedProductLine>,
}

/// Pre-formatted line for the template.
#[derive(Debug, Clone, Serialize)]
pub struct OrderedProductLine {
    pub title: String,
    pub quantity: i32,
    pub price: String,
}

impl From<&OrderSummary> for OrderConfirmationData {
    fn from(summary: &OrderSummary) -> Self {
        Self {
            order_id: summary.order_id.to_string(),
            total: summary.total.to_string(),
            product_count: summary.product_count(),
            products: summary
                .products
                .iter()
                .map(|p| OrderedProductLine {
                    title: p.title.clone(),
                    quantity: p.quantity,
                    price: p.price.to_string(),
                })
                .collect(),
        }
    }
}
