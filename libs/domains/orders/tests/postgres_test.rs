//! Order placement against Postgres (requires Docker)

use axum_helpers::AuthUser;
use domain_notifications::ChannelNotifier;
use domain_orders::*;
use domain_products::{PgProductRepository, ProductRepository};
use pagination::PageRequest;
use rust_decimal::Decimal;
use std::sync::Arc;
use test_utils::{TestDataBuilder, postgres::TestDatabase};

fn lines(items: &[(uuid::Uuid, i32)]) -> CreateOrder {
    CreateOrder {
        order: OrderParams {
            product_orders: items
                .iter()
                .map(|(id, quantity)| ProductOrderLine::new(*id, *quantity))
                .collect(),
        },
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_place_and_read_back() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("pg_place_order");
    let seller = db.create_test_user(uuid::Uuid::now_v7()).await;
    let buyer = AuthUser {
        id: db.create_test_user(builder.user_id()).await,
        email: builder.email("buyer"),
    };
    let tv = db.create_test_product(seller, "TV", "500.00", 5).await;
    let cable = db.create_test_product(seller, "Cable", "15.75", 10).await;

    let (notifier, mut queue) = ChannelNotifier::channel(8);
    let service = OrderService::new(PgOrderRepository::new(db.connection()), Arc::new(notifier));

    let order = service
        .place_order(&buyer, lines(&[(tv, 2), (cable, 3)]))
        .await
        .unwrap();
    assert_eq!(order.total, Decimal::new(104725, 2));
    assert_eq!(queue.recv().await.unwrap().order_id, order.id);

    let products = PgProductRepository::new(db.connection());
    assert_eq!(products.get_by_id(tv).await.unwrap().unwrap().quantity, 3);
    assert_eq!(products.get_by_id(cable).await.unwrap().unwrap().quantity, 7);

    let fetched = service.get_order(&buyer, buyer.id, order.id).await.unwrap();
    assert_eq!(fetched.total, order.total);
    assert_eq!(fetched.products.len(), 2);

    let page = service
        .list_orders(&buyer, buyer.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.meta.total_objects, 1);

    let huge = PageRequest::from_raw(Some("100000000000000000"), Some("100"));
    let page = service.list_orders(&buyer, buyer.id, huge).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.meta.total_objects, 1);

    let rejected = service.place_order(&buyer, lines(&[(tv, 4)])).await;
    assert!(matches!(rejected, Err(OrderError::Validation(_))));
    assert_eq!(products.get_by_id(tv).await.unwrap().unwrap().quantity, 3);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_concurrent_orders_never_oversell() {
    let db = TestDatabase::new().await;
    let seller = db.create_test_user(uuid::Uuid::now_v7()).await;
    let buyer = AuthUser {
        id: db.create_test_user(uuid::Uuid::now_v7()).await,
        email: "buyer@example.com".to_string(),
    };
    let lamp = db.create_test_product(seller, "Lamp", "10.00", 9).await;

    let (notifier, _queue) = ChannelNotifier::channel(64);
    let service = Arc::new(OrderService::new(
        PgOrderRepository::new(db.connection()),
        Arc::new(notifier),
    ));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let service = service.clone();
            let buyer = buyer.clone();
            tokio::spawn(async move { service.place_order(&buyer, lines(&[(lamp, 1)])).await })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            created += 1;
        }
    }

    assert_eq!(created, 9);
    let products = PgProductRepository::new(db.connection());
    assert_eq!(products.get_by_id(lamp).await.unwrap().unwrap().quantity, 0);
}
