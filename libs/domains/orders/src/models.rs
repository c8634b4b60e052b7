use chrono::{DateTime, Utc};
use domain_notifications::{OrderSummary, OrderedProduct};
use domain_products::Product;
use pagination::{ListMeta, Page};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A placed order with the products it references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Sum of quantity × price at the time of purchase
    #[schema(value_type = String, example = "1575.00")]
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Distinct products on the order, in the order they were requested
    pub products: Vec<OrderProduct>,
    #[serde(skip)]
    pub placements: Vec<Placement>,
}

/// Product as embedded in an order (no owner)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderProduct {
    pub id: Uuid,
    pub title: String,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    /// Units in stock
    pub quantity: i32,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for OrderProduct {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            quantity: product.quantity,
            published: product.published,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// One line item of a stored order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub product_id: Uuid,
    pub quantity: i32,
}

impl Order {
    /// Snapshot handed to the notification worker after commit.
    pub fn summary(&self, email: &str) -> OrderSummary {
        let products = self
            .placements
            .iter()
            .filter_map(|placement| {
                let product = self.products.iter().find(|p| p.id == placement.product_id)?;
                Some(OrderedProduct {
                    product_id: product.id,
                    title: product.title.clone(),
                    price: product.price,
                    quantity: placement.quantity,
                })
            })
            .collect();

        OrderSummary {
            order_id: self.id,
            user_id: self.user_id,
            email: email.to_string(),
            total: self.total,
            products,
        }
    }
}

/// Request body for `POST /orders`:
/// `{"order": {"product_orders": [{"product_id": "...", "quantity": 2}]}}`
///
/// Line items are checked by the order engine against stock read in the
/// placing transaction, not by field rules.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateOrder {
    #[serde(default)]
    pub order: OrderParams,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct OrderParams {
    #[serde(default)]
    pub product_orders: Vec<ProductOrderLine>,
}

/// A requested `(product_id, quantity)` pair
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct ProductOrderLine {
    /// Kept raw so that an unparsable id is reported like an unknown one
    #[serde(default)]
    #[schema(example = "0190c5a2-7f3e-7b4c-9d1e-2f3a4b5c6d7e")]
    pub product_id: String,
    #[serde(default)]
    pub quantity: i32,
}

impl ProductOrderLine {
    pub fn new(product_id: Uuid, quantity: i32) -> Self {
        Self {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    pub fn parsed_product_id(&self) -> Option<Uuid> {
        Uuid::parse_str(self.product_id.trim()).ok()
    }
}

/// `{"orders": [...], "meta": {"pagination": {...}}}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderList {
    pub orders: Vec<Order>,
    pub meta: ListMeta,
}

impl From<Page<Order>> for OrderList {
    fn from(page: Page<Order>) -> Self {
        Self {
            orders: page.items,
            meta: page.meta.into(),
        }
    }
}
