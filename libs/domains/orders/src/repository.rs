use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain_products::{Product, ProductStore};
use pagination::{Page, PageRequest, paginate};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::engine;
use crate::error::OrderResult;
use crate::models::{Order, OrderProduct, Placement, ProductOrderLine};

/// Repository trait for Order persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Validate stock, persist the order with its placements and take the
    /// stock, all or nothing
    async fn place(&self, user_id: Uuid, lines: Vec<ProductOrderLine>) -> OrderResult<Order>;

    /// A user's orders, newest first
    async fn list_for_user(&self, user_id: Uuid, page: PageRequest) -> OrderResult<Page<Order>>;

    /// A single order, only if it belongs to `user_id`
    async fn get_for_user(&self, user_id: Uuid, id: Uuid) -> OrderResult<Option<Order>>;
}

/// Order row as kept by the in-memory store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredOrder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub placements: Vec<Placement>,
}

pub type OrderStore = Arc<RwLock<HashMap<Uuid, StoredOrder>>>;

/// In-memory implementation of OrderRepository (for development/testing).
///
/// Shares the product map with the product repository. Locks are always
/// taken products first, then orders.
#[derive(Debug, Clone)]
pub struct InMemoryOrderRepository {
    products: ProductStore,
    orders: OrderStore,
}

impl InMemoryOrderRepository {
    pub fn new(products: ProductStore) -> Self {
        Self {
            products,
            orders: OrderStore::default(),
        }
    }

    /// Handle to the underlying order map
    pub fn store(&self) -> OrderStore {
        self.orders.clone()
    }
}

/// Join a stored order with the products it still references
fn resolve(stored: &StoredOrder, products: &HashMap<Uuid, Product>) -> Order {
    let placements: Vec<Placement> = stored
        .placements
        .iter()
        .filter(|p| products.contains_key(&p.product_id))
        .copied()
        .collect();

    let mut order_products: Vec<OrderProduct> = Vec::new();
    for placement in &placements {
        if order_products.iter().any(|p| p.id == placement.product_id) {
            continue;
        }
        if let Some(product) = products.get(&placement.product_id) {
            order_products.push(product.clone().into());
        }
    }

    Order {
        id: stored.id,
        user_id: stored.user_id,
        total: stored.total,
        created_at: stored.created_at,
        updated_at: stored.updated_at,
        products: order_products,
        placements,
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn place(&self, user_id: Uuid, lines: Vec<ProductOrderLine>) -> OrderResult<Order> {
        let mut products = self.products.write().await;
        let mut orders = self.orders.write().await;

        let prepared = engine::prepare(&lines, &products)?;

        for (id, units) in &prepared.demand {
            if let Some(product) = products.get_mut(id) {
                product.quantity -= units;
            }
        }

        let now = Utc::now();
        let stored = StoredOrder {
            id: Uuid::now_v7(),
            user_id,
            total: prepared.total,
            created_at: now,
            updated_at: now,
            placements: prepared.placements(),
        };
        orders.insert(stored.id, stored.clone());

        tracing::info!(order_id = %stored.id, user_id = %user_id, total = %stored.total, "Placed order");
        Ok(Order {
            id: stored.id,
            user_id,
            total: stored.total,
            created_at: now,
            updated_at: now,
            products: prepared.products_after_decrement(),
            placements: stored.placements,
        })
    }

    async fn list_for_user(&self, user_id: Uuid, page: PageRequest) -> OrderResult<Page<Order>> {
        let products = self.products.read().await;
        let orders = self.orders.read().await;

        let mut owned: Vec<&StoredOrder> = orders.values().filter(|o| o.user_id == user_id).collect();
        owned.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(paginate(owned, page).map(|stored| resolve(stored, &products)))
    }

    async fn get_for_user(&self, user_id: Uuid, id: Uuid) -> OrderResult<Option<Order>> {
        let products = self.products.read().await;
        let orders = self.orders.read().await;

        Ok(orders
            .get(&id)
            .filter(|o| o.user_id == user_id)
            .map(|stored| resolve(stored, &products)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrderError;
    use domain_products::{InMemoryProductRepository, NewProduct, ProductRepository};

    async fn setup(quantity: i32) -> (InMemoryProductRepository, InMemoryOrderRepository, Product) {
        let products = InMemoryProductRepository::new();
        let orders = InMemoryOrderRepository::new(products.store());
        let product = products
            .create(
                Uuid::now_v7(),
                NewProduct {
                    title: "Lamp".to_string(),
                    price: Decimal::new(1000, 2),
                    quantity,
                    published: true,
                },
            )
            .await
            .unwrap();
        (products, orders, product)
    }

    #[tokio::test]
    async fn test_place_decrements_stock() {
        let (products, orders, lamp) = setup(5).await;
        let buyer = Uuid::now_v7();

        let order = orders
            .place(buyer, vec![ProductOrderLine::new(lamp.id, 2)])
            .await
            .unwrap();

        assert_eq!(order.total, Decimal::new(2000, 2));
        assert_eq!(order.products[0].quantity, 3);
        assert_eq!(products.get_by_id(lamp.id).await.unwrap().unwrap().quantity, 3);
        assert_eq!(orders.get_for_user(buyer, order.id).await.unwrap(), Some(order));
    }

    #[tokio::test]
    async fn test_insufficient_stock_persists_nothing() {
        let (products, orders, lamp) = setup(1).await;

        let result = orders
            .place(Uuid::now_v7(), vec![ProductOrderLine::new(lamp.id, 2)])
            .await;

        assert!(matches!(result, Err(OrderError::Validation(_))));
        assert!(orders.store().read().await.is_empty());
        assert_eq!(products.get_by_id(lamp.id).await.unwrap().unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_foreign_order_is_hidden() {
        let (_products, orders, lamp) = setup(5).await;
        let order = orders
            .place(Uuid::now_v7(), vec![ProductOrderLine::new(lamp.id, 1)])
            .await
            .unwrap();

        assert!(orders.get_for_user(Uuid::now_v7(), order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (_products, orders, lamp) = setup(10).await;
        let buyer = Uuid::now_v7();

        let first = orders.place(buyer, vec![ProductOrderLine::new(lamp.id, 1)]).await.unwrap();
        let second = orders.place(buyer, vec![ProductOrderLine::new(lamp.id, 1)]).await.unwrap();
        orders
            .place(Uuid::now_v7(), vec![ProductOrderLine::new(lamp.id, 1)])
            .await
            .unwrap();

        let page = orders.list_for_user(buyer, PageRequest::default()).await.unwrap();
        let ids: Vec<Uuid> = page.items.iter().map(|o| o.id).collect();

        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(page.meta.total_objects, 2);
    }

    #[tokio::test]
    async fn test_deleted_products_drop_out_of_orders() {
        let (products, orders, lamp) = setup(5).await;
        let buyer = Uuid::now_v7();
        let order = orders.place(buyer, vec![ProductOrderLine::new(lamp.id, 1)]).await.unwrap();

        products.delete(lamp.id).await.unwrap();

        let order = orders.get_for_user(buyer, order.id).await.unwrap().unwrap();
        assert!(order.products.is_empty());
        assert_eq!(order.total, Decimal::new(1000, 2));
    }

    #[tokio::test]
    async fn test_concurrent_orders_never_oversell() {
        let (products, orders, lamp) = setup(9).await;

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let orders = orders.clone();
                tokio::spawn(async move {
                    orders
                        .place(Uuid::now_v7(), vec![ProductOrderLine::new(lamp.id, 1)])
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 9);
        assert_eq!(products.get_by_id(lamp.id).await.unwrap().unwrap().quantity, 0);
    }
}
