use axum::{Router, middleware, routing::get};
use axum_helpers::{SharedTokenResolver, authenticate};
use domain_orders::{OrderRepository, OrderService, PgOrderRepository};
use domain_products::{PgProductRepository, ProductRepository, ProductService};
use domain_users::{PostgresUserRepository, UserRepository, UserService};
use std::sync::Arc;

use crate::state::AppState;

pub mod health;

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix will be added by the `create_router` helper.
pub fn routes(state: &AppState) -> Router {
    let products = ProductService::new(PgProductRepository::new(state.db.clone()));
    let orders = OrderService::new(
        PgOrderRepository::new(state.db.clone()),
        state.notifier.clone(),
    );
    let users = UserService::new(PostgresUserRepository::new(state.db.clone()));

    compose(products, orders, users)
}

/// Mount the domain routers behind token authentication.
///
/// The user service doubles as the token resolver, so every request sees
/// the identity current at the time it arrives.
pub fn compose<P, O, U>(
    products: ProductService<P>,
    orders: OrderService<O>,
    users: UserService<U>,
) -> Router
where
    P: ProductRepository + 'static,
    O: OrderRepository + 'static,
    U: UserRepository + 'static,
{
    let resolver: SharedTokenResolver = Arc::new(users.clone());

    Router::new()
        .nest("/products", domain_products::handlers::router(products))
        .merge(domain_users::handlers::router(users))
        .merge(domain_orders::handlers::router(orders))
        .layer(middleware::from_fn_with_state(resolver, authenticate))
}

/// Router with the /ready endpoint; merged next to the stateless app router.
pub fn ready_router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
