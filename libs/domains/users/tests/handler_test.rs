//! Handler tests for the Users domain
//!
//! Users, products and orders share in-memory stores here so that account
//! deletion can be checked end to end, with the user service itself
//! resolving tokens for the authentication middleware.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{Router, middleware};
use axum_helpers::{SharedTokenResolver, authenticate};
use domain_notifications::ChannelNotifier;
use domain_orders::{InMemoryOrderRepository, OrderService, OrderStore};
use domain_products::{InMemoryProductRepository, ProductService, ProductStore};
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For oneshot()

struct TestApp {
    router: Router,
    products: ProductStore,
    orders: OrderStore,
}

fn app() -> TestApp {
    let products = InMemoryProductRepository::new();
    let product_store = products.store();
    let orders = InMemoryOrderRepository::new(product_store.clone());
    let order_store = orders.store();
    let users = InMemoryUserRepository::new().with_cascade(product_store.clone(), order_store.clone());

    let service = UserService::new(users);
    let resolver: SharedTokenResolver = Arc::new(service.clone());
    let (notifier, _queue) = ChannelNotifier::channel(64);

    let router = Router::new()
        .merge(handlers::router(service))
        .merge(domain_orders::handlers::router(OrderService::new(
            orders,
            Arc::new(notifier),
        )))
        .nest(
            "/products",
            domain_products::handlers::router(ProductService::new(products)),
        )
        .layer(middleware::from_fn_with_state(resolver, authenticate));

    TestApp {
        router,
        products: product_store,
        orders: order_store,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("authorization", token);
        }
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Sign up and return `(id, token)`
    async fn signup(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .send(
                "POST",
                "/users",
                None,
                Some(json!({
                    "email": email,
                    "password": "password123",
                    "password_confirmation": "password123"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        (
            body["id"].as_str().unwrap().to_string(),
            body["auth_token"].as_str().unwrap().to_string(),
        )
    }

    async fn create_product(&self, token: &str, title: &str, quantity: i32) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/products",
                Some(token),
                Some(json!({"title": title, "price": "10.00", "quantity": quantity})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    async fn place_order(&self, token: &str, product_id: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/orders",
                Some(token),
                Some(json!({"order": {"product_orders": [{"product_id": product_id, "quantity": 1}]}})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_signup_and_show() {
    let app = app();
    let (id, token) = app.signup("alice@example.com").await;
    assert_eq!(token.len(), 64);

    let product_id = app.create_product(&token, "Lamp", 1).await;

    let (status, body) = app.send("GET", &format!("/users/{}", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["product_ids"], json!([product_id]));
    assert!(body.get("auth_token").is_none());
    assert!(body.get("password_hash").is_none());

    let (status, _) = app.send("GET", "/users/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_signup_validation() {
    let app = app();
    app.signup("taken@example.com").await;

    let (status, body) = app
        .send(
            "POST",
            "/users",
            None,
            Some(json!({"email": "nope", "password": "short", "password_confirmation": "other"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body,
        json!({"errors": {
            "email": ["is invalid"],
            "password": ["is too short (minimum is 8 characters)"],
            "password_confirmation": ["doesn't match Password"]
        }})
    );

    let (status, body) = app
        .send(
            "POST",
            "/users",
            None,
            Some(json!({"email": "Taken@example.com", "password": "password123"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({"errors": {"email": ["has already been taken"]}}));
}

#[tokio::test]
async fn test_login_and_logout() {
    let app = app();
    let (id, signup_token) = app.signup("alice@example.com").await;

    let (status, body) = app
        .send(
            "POST",
            "/sessions",
            None,
            Some(json!({"email": "alice@example.com", "password": "wrong-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({"errors": "Invalid email or password"}));

    let (status, session) = app
        .send(
            "POST",
            "/sessions",
            None,
            Some(json!({"email": "alice@example.com", "password": "password123"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["id"], id.as_str());
    let token = session["auth_token"].as_str().unwrap().to_string();
    assert_ne!(token, signup_token);

    // Login replaced the signup token
    let (status, _) = app
        .send("DELETE", &format!("/sessions/{}", signup_token), Some(&signup_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send("DELETE", "/sessions/someone-elses", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send("DELETE", &format!("/sessions/{}", token), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .send("PATCH", &format!("/users/{}", id), Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"errors": "Not authenticated"}));
}

#[tokio::test]
async fn test_update_is_self_only() {
    let app = app();
    let (alice, alice_token) = app.signup("alice@example.com").await;
    let (_bob, bob_token) = app.signup("bob@example.com").await;

    let uri = format!("/users/{}", alice);
    let (status, body) = app
        .send("PATCH", &uri, Some(&bob_token), Some(json!({"email": "bob2@example.com"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"errors": "Not found"}));

    let (status, body) = app
        .send("PATCH", &uri, Some(&alice_token), Some(json!({"email": "bob@example.com"})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({"errors": {"email": ["has already been taken"]}}));

    let (status, body) = app
        .send("PATCH", &uri, Some(&alice_token), Some(json!({"email": "alice2@example.com"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice2@example.com");
}

#[tokio::test]
async fn test_unauthenticated_delete_mutates_nothing() {
    let app = app();
    let (alice, _token) = app.signup("alice@example.com").await;

    for token in [None, Some("garbled"), Some("Bearer ")] {
        let (status, body) = app
            .send("DELETE", &format!("/users/{}", alice), token, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"errors": "Not authenticated"}));
    }

    let (status, _) = app.send("GET", &format!("/users/{}", alice), None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_cascades() {
    let app = app();
    let (alice, alice_token) = app.signup("alice@example.com").await;
    let (bob, bob_token) = app.signup("bob@example.com").await;

    let alice_lamp = app.create_product(&alice_token, "Alice lamp", 5).await;
    let bob_chair = app.create_product(&bob_token, "Bob chair", 5).await;

    app.place_order(&alice_token, &bob_chair).await;
    let bobs_order = app.place_order(&bob_token, &alice_lamp).await;

    let (status, _) = app
        .send("DELETE", &format!("/users/{}", alice), Some(&alice_token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send("GET", &format!("/users/{}", alice), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let products = app.products.read().await;
    assert_eq!(products.len(), 1);
    assert!(products.values().all(|p| p.id.to_string() == bob_chair));
    drop(products);

    let orders = app.orders.read().await;
    assert_eq!(orders.len(), 1);
    let remaining = orders.values().next().unwrap();
    assert_eq!(remaining.id.to_string(), bobs_order);
    assert!(remaining.placements.is_empty());
    drop(orders);

    let (status, _) = app
        .send("GET", &format!("/users/{}", bob), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send("POST", "/products", Some(&alice_token), Some(json!({"title": "x", "price": 1})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
