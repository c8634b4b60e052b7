use axum_helpers::AuthUser;
use domain_notifications::SharedNotifier;
use pagination::{Page, PageRequest};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{OrderError, OrderResult};
use crate::models::{CreateOrder, Order};
use crate::repository::OrderRepository;

/// Service layer for order placement and order history
#[derive(Clone)]
pub struct OrderService<R: OrderRepository> {
    repository: Arc<R>,
    notifier: SharedNotifier,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repository: R, notifier: SharedNotifier) -> Self {
        Self {
            repository: Arc::new(repository),
            notifier,
        }
    }

    /// Place an order for the caller, then queue the confirmation email.
    ///
    /// Queueing happens after commit and its failure does not fail the order.
    #[instrument(skip(self, user, input), fields(user_id = %user.id))]
    pub async fn place_order(&self, user: &AuthUser, input: CreateOrder) -> OrderResult<Order> {
        let order = self
            .repository
            .place(user.id, input.order.product_orders)
            .await?;

        if let Err(e) = self.notifier.notify(order.summary(&user.email)) {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to queue order confirmation");
        }

        Ok(order)
    }

    /// The caller's orders; any other `user_id` is not found
    #[instrument(skip(self, user), fields(caller = %user.id))]
    pub async fn list_orders(
        &self,
        user: &AuthUser,
        user_id: Uuid,
        page: PageRequest,
    ) -> OrderResult<Page<Order>> {
        if user.id != user_id {
            return Err(OrderError::NotFound(user_id));
        }
        self.repository.list_for_user(user_id, page).await
    }

    #[instrument(skip(self, user), fields(caller = %user.id))]
    pub async fn get_order(&self, user: &AuthUser, user_id: Uuid, id: Uuid) -> OrderResult<Order> {
        if user.id != user_id {
            return Err(OrderError::NotFound(id));
        }
        self.repository
            .get_for_user(user_id, id)
            .await?
            .ok_or(OrderError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderParams, ProductOrderLine};
    use crate::repository::{InMemoryOrderRepository, MockOrderRepository};
    use axum_helpers::FieldErrors;
    use domain_notifications::{ChannelNotifier, NotificationError, OrderNotifier};
    use domain_products::{
        InMemoryProductRepository, NewProduct, Product, ProductRepository,
    };
    use rust_decimal::Decimal;

    fn buyer() -> AuthUser {
        AuthUser {
            id: Uuid::now_v7(),
            email: "buyer@example.com".to_string(),
        }
    }

    fn order_of(lines: Vec<ProductOrderLine>) -> CreateOrder {
        CreateOrder {
            order: OrderParams {
                product_orders: lines,
            },
        }
    }

    async fn catalog(quantity: i32) -> (InMemoryProductRepository, Product) {
        let products = InMemoryProductRepository::new();
        let product = products
            .create(
                Uuid::now_v7(),
                NewProduct {
                    title: "Lamp".to_string(),
                    price: Decimal::new(1250, 2),
                    quantity,
                    published: true,
                },
            )
            .await
            .unwrap();
        (products, product)
    }

    #[tokio::test]
    async fn test_place_order_queues_confirmation() {
        let (products, lamp) = catalog(5).await;
        let (notifier, mut receiver) = ChannelNotifier::channel(8);
        let service = OrderService::new(
            InMemoryOrderRepository::new(products.store()),
            Arc::new(notifier),
        );
        let user = buyer();

        let order = service
            .place_order(&user, order_of(vec![ProductOrderLine::new(lamp.id, 2)]))
            .await
            .unwrap();

        let summary = receiver.recv().await.unwrap();
        assert_eq!(summary.order_id, order.id);
        assert_eq!(summary.email, user.email);
        assert_eq!(summary.total, Decimal::new(2500, 2));
        assert_eq!(summary.products[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_failed_validation_queues_nothing() {
        let (products, lamp) = catalog(1).await;
        let (notifier, mut receiver) = ChannelNotifier::channel(8);
        let service = OrderService::new(
            InMemoryOrderRepository::new(products.store()),
            Arc::new(notifier),
        );

        let result = service
            .place_order(&buyer(), order_of(vec![ProductOrderLine::new(lamp.id, 3)]))
            .await;

        assert!(matches!(result, Err(OrderError::Validation(_))));
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_queue_failure_does_not_fail_the_order() {
        struct ClosedQueue;
        impl OrderNotifier for ClosedQueue {
            fn notify(
                &self,
                _summary: domain_notifications::OrderSummary,
            ) -> domain_notifications::NotificationResult<()> {
                Err(NotificationError::QueueClosed)
            }
        }

        let (products, lamp) = catalog(5).await;
        let service = OrderService::new(
            InMemoryOrderRepository::new(products.store()),
            Arc::new(ClosedQueue),
        );

        let order = service
            .place_order(&buyer(), order_of(vec![ProductOrderLine::new(lamp.id, 1)]))
            .await;

        assert!(order.is_ok());
        assert_eq!(products.get_by_id(lamp.id).await.unwrap().unwrap().quantity, 4);
    }

    #[tokio::test]
    async fn test_transient_error_is_surfaced() {
        let mut repository = MockOrderRepository::new();
        repository
            .expect_place()
            .times(1)
            .returning(|_, _| Err(OrderError::Transient("lock timeout".into())));
        let (notifier, mut receiver) = ChannelNotifier::channel(1);
        let service = OrderService::new(repository, Arc::new(notifier));

        let result = service
            .place_order(&buyer(), order_of(vec![ProductOrderLine::new(Uuid::now_v7(), 1)]))
            .await;

        assert!(matches!(result, Err(OrderError::Transient(_))));
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_other_users_orders_are_not_found() {
        let mut repository = MockOrderRepository::new();
        repository.expect_list_for_user().never();
        repository.expect_get_for_user().never();
        let (notifier, _receiver) = ChannelNotifier::channel(1);
        let service = OrderService::new(repository, Arc::new(notifier));
        let user = buyer();
        let someone_else = Uuid::now_v7();

        let list = service
            .list_orders(&user, someone_else, PageRequest::default())
            .await;
        assert!(matches!(list, Err(OrderError::NotFound(_))));

        let get = service.get_order(&user, someone_else, Uuid::now_v7()).await;
        assert!(matches!(get, Err(OrderError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let mut repository = MockOrderRepository::new();
        repository.expect_get_for_user().returning(|_, _| Ok(None));
        let (notifier, _receiver) = ChannelNotifier::channel(1);
        let service = OrderService::new(repository, Arc::new(notifier));
        let user = buyer();

        let result = service.get_order(&user, user.id, Uuid::now_v7()).await;
        assert!(matches!(result, Err(OrderError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_order_is_rejected() {
        let (products, _lamp) = catalog(5).await;
        let (notifier, _receiver) = ChannelNotifier::channel(1);
        let service = OrderService::new(
            InMemoryOrderRepository::new(products.store()),
            Arc::new(notifier),
        );

        let Err(OrderError::Validation(errors)) =
            service.place_order(&buyer(), order_of(Vec::new())).await
        else {
            panic!("expected a validation error");
        };
        assert_eq!(errors, FieldErrors::single("product_orders", "can't be blank"));
    }
}
