use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use axum_helpers::{
    AuthUser, UuidPath, ValidatedJson,
    errors::responses::{
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
        ValidationErrorResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserResult;
use crate::models::{
    LoginRequest, SessionResponse, SignupRequest, UpdateUserRequest, UserResponse,
};
use crate::repository::UserRepository;
use crate::service::UserService;

pub const TAG: &str = "users";
pub const SESSIONS_TAG: &str = "sessions";

/// OpenAPI documentation for Users and Sessions API
#[derive(OpenApi)]
#[openapi(
    paths(signup, show_user, update_user, delete_user, login, logout),
    components(
        schemas(UserResponse, SessionResponse, SignupRequest, UpdateUserRequest, LoginRequest),
        responses(
            UnauthorizedResponse,
            NotFoundResponse,
            ValidationErrorResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "User accounts"),
        (name = SESSIONS_TAG, description = "Login and logout")
    )
)]
pub struct ApiDoc;

/// Create the users and sessions router. Paths are absolute, so merge it
/// rather than nest it.
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/users", post(signup))
        .route(
            "/users/{user_id}",
            get(show_user).patch(update_user).delete(delete_user),
        )
        .route("/sessions", post(login))
        .route("/sessions/{auth_token}", delete(logout))
        .with_state(shared_service)
}

/// Sign up and receive a first auth token
#[utoipa::path(
    post,
    path = "/users",
    tag = TAG,
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn signup<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<SignupRequest>,
) -> UserResult<impl IntoResponse> {
    let user = service.signup(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = TAG,
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn show_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<UserResponse>> {
    let user = service.show(id).await?;
    Ok(Json(user))
}

/// Update the caller's account
#[utoipa::path(
    patch,
    path = "/users/{user_id}",
    tag = TAG,
    params(
        ("user_id" = Uuid, Path, description = "Must be the caller's ID")
    ),
    request_body = UpdateUserRequest,
    security(("token" = [])),
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    user: AuthUser,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateUserRequest>,
) -> UserResult<Json<UserResponse>> {
    let updated = service.update(&user, id, input).await?;
    Ok(Json(updated))
}

/// Delete the caller's account with its products and orders
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = TAG,
    params(
        ("user_id" = Uuid, Path, description = "Must be the caller's ID")
    ),
    security(("token" = [])),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    user: AuthUser,
    UuidPath(id): UuidPath,
) -> UserResult<StatusCode> {
    service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/sessions",
    tag = SESSIONS_TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = SessionResponse),
        (status = 422, description = "Invalid email or password", body = axum_helpers::ErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn login<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> UserResult<Json<SessionResponse>> {
    let session = service.login(input).await?;
    Ok(Json(session))
}

/// Log out by rotating the caller's token
#[utoipa::path(
    delete,
    path = "/sessions/{auth_token}",
    tag = SESSIONS_TAG,
    params(
        ("auth_token" = String, Path, description = "The caller's current token")
    ),
    security(("token" = [])),
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn logout<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    user: AuthUser,
    Path(token): Path<String>,
) -> UserResult<StatusCode> {
    service.logout(&user, &token).await?;
    Ok(StatusCode::NO_CONTENT)
}
