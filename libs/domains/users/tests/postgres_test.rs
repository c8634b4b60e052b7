//! Users against Postgres (requires Docker)

use axum_helpers::AuthUser;
use domain_notifications::ChannelNotifier;
use domain_orders::{CreateOrder, OrderParams, OrderService, PgOrderRepository, ProductOrderLine};
use domain_products::{PgProductRepository, ProductRepository};
use domain_users::*;
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use std::sync::Arc;
use test_utils::postgres::TestDatabase;

fn signup_request(email: &str) -> SignupRequest {
    SignupRequest {
        email: Some(email.to_string()),
        password: Some("password123".to_string()),
        password_confirmation: None,
    }
}

async fn count(db: &TestDatabase, table: &str) -> i64 {
    let row = db
        .connection()
        .query_one_raw(Statement::from_string(
            DbBackend::Postgres,
            format!("SELECT COUNT(*) AS n FROM {}", table),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_signup_login_and_tokens() {
    let db = TestDatabase::new().await;
    let service = UserService::new(PostgresUserRepository::new(db.connection()));

    let user = service.signup(signup_request("alice@example.com")).await.unwrap();
    let token = user.auth_token.clone().unwrap();
    assert_eq!(service.resolve_token(&token).await.unwrap().unwrap().id, user.id);

    let duplicate = service.signup(signup_request("alice@example.com")).await;
    assert!(matches!(duplicate, Err(UserError::DuplicateEmail(_))));

    let session = service
        .login(LoginRequest {
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
        })
        .await
        .unwrap();
    assert!(service.resolve_token(&token).await.unwrap().is_none());
    assert!(service.resolve_token(&session.auth_token).await.unwrap().is_some());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_unique_index_rejects_duplicate_token() {
    let db = TestDatabase::new().await;
    let repository = PostgresUserRepository::new(db.connection());
    let alice = repository
        .create(User::new("alice@example.com".into(), "hash".into()))
        .await
        .unwrap();
    let bob = repository
        .create(User::new("bob@example.com".into(), "hash".into()))
        .await
        .unwrap();

    repository.set_token(alice.id, "shared").await.unwrap();
    let result = repository.set_token(bob.id, "shared").await;

    assert!(matches!(result, Err(UserError::TokenTaken)));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_delete_cascades_in_one_transaction() {
    let db = TestDatabase::new().await;
    let users = UserService::new(PostgresUserRepository::new(db.connection()));
    let alice = users.signup(signup_request("alice@example.com")).await.unwrap();
    let bob = users.signup(signup_request("bob@example.com")).await.unwrap();

    let alice_lamp = db.create_test_product(alice.id, "Lamp", "10.00", 5).await;
    let bob_chair = db.create_test_product(bob.id, "Chair", "20.00", 5).await;

    let (notifier, _queue) = ChannelNotifier::channel(8);
    let orders = OrderService::new(PgOrderRepository::new(db.connection()), Arc::new(notifier));
    let order = |id| CreateOrder {
        order: OrderParams {
            product_orders: vec![ProductOrderLine::new(id, 1)],
        },
    };
    let alice_auth = AuthUser {
        id: alice.id,
        email: alice.email.clone(),
    };
    let bob_auth = AuthUser {
        id: bob.id,
        email: bob.email.clone(),
    };
    orders.place_order(&alice_auth, order(bob_chair)).await.unwrap();
    orders.place_order(&bob_auth, order(alice_lamp)).await.unwrap();

    users.delete(&alice_auth, alice.id).await.unwrap();

    assert_eq!(count(&db, "users").await, 1);
    assert_eq!(count(&db, "products").await, 1);
    assert_eq!(count(&db, "orders").await, 1);
    assert_eq!(count(&db, "placements").await, 0);

    let products = PgProductRepository::new(db.connection());
    assert!(products.get_by_id(alice_lamp).await.unwrap().is_none());
    assert!(products.get_by_id(bob_chair).await.unwrap().is_some());
}
