use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AuthUser, UuidPath, UuidPathPair, ValidatedJson,
    errors::responses::{
        InternalServerErrorResponse, NotFoundResponse, ServiceUnavailableResponse,
        UnauthorizedResponse, ValidationErrorResponse,
    },
};
use pagination::PageRequest;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::OrderResult;
use crate::models::{CreateOrder, Order, OrderList};
use crate::repository::OrderRepository;
use crate::service::OrderService;

pub const TAG: &str = "orders";

/// OpenAPI documentation for Orders API
#[derive(OpenApi)]
#[openapi(
    paths(place_order, list_orders, get_order),
    components(
        schemas(Order, OrderList, CreateOrder),
        responses(
            UnauthorizedResponse,
            NotFoundResponse,
            ValidationErrorResponse,
            ServiceUnavailableResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Order placement and history")
    )
)]
pub struct ApiDoc;

/// Create the order router. Paths are absolute, so merge it rather than
/// nest it.
pub fn router<R: OrderRepository + 'static>(service: OrderService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/orders", post(place_order))
        .route("/users/{user_id}/orders", get(list_orders))
        .route("/users/{user_id}/orders/{id}", get(get_order))
        .with_state(shared_service)
}

/// Place an order for the caller
#[utoipa::path(
    post,
    path = "/orders",
    tag = TAG,
    request_body = CreateOrder,
    security(("token" = [])),
    responses(
        (status = 201, description = "Order placed", body = Order),
        (status = 401, response = UnauthorizedResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn place_order<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<CreateOrder>,
) -> OrderResult<impl IntoResponse> {
    let order = service.place_order(&user, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List the caller's orders, newest first
#[utoipa::path(
    get,
    path = "/users/{user_id}/orders",
    tag = TAG,
    params(
        ("user_id" = Uuid, Path, description = "Must be the caller's ID"),
        PageRequest
    ),
    security(("token" = [])),
    responses(
        (status = 200, description = "Page of orders", body = OrderList),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_orders<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    user: AuthUser,
    UuidPath(user_id): UuidPath,
    Query(page): Query<PageRequest>,
) -> OrderResult<Json<OrderList>> {
    let orders = service.list_orders(&user, user_id, page).await?;
    Ok(Json(orders.into()))
}

/// Get one of the caller's orders
#[utoipa::path(
    get,
    path = "/users/{user_id}/orders/{id}",
    tag = TAG,
    params(
        ("user_id" = Uuid, Path, description = "Must be the caller's ID"),
        ("id" = Uuid, Path, description = "Order ID")
    ),
    security(("token" = [])),
    responses(
        (status = 200, description = "Order found", body = Order),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_order<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    user: AuthUser,
    UuidPathPair(user_id, id): UuidPathPair,
) -> OrderResult<Json<Order>> {
    let order = service.get_order(&user, user_id, id).await?;
    Ok(Json(order))
}
