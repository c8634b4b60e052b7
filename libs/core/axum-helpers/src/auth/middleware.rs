use super::{AuthUser, SharedTokenResolver};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Pull the token out of `Authorization: <token>` or `Authorization: Bearer <token>`.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();

    if token.is_empty() { None } else { Some(token) }
}

/// Resolve the caller's identity, if any.
///
/// Requests without a resolvable token pass through anonymously; it is the
/// [`AuthUser`] extractor on protected handlers that turns that into a 401.
pub async fn authenticate(
    State(resolver): State<SharedTokenResolver>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_token(request.headers()).map(str::to_owned);

    if let Some(token) = token {
        match resolver.resolve(&token).await {
            Ok(Some(user)) => {
                tracing::debug!(user_id = %user.id, "Authenticated request");
                request.extensions_mut().insert::<AuthUser>(user);
            }
            Ok(None) => tracing::debug!("Auth token did not resolve to a user"),
            Err(e) => return e.into_response(),
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenResolver;
    use crate::errors::AppError;
    use async_trait::async_trait;
    use axum::{Router, body::Body, http::StatusCode, routing::get};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct OneToken(AuthUser);

    #[async_trait]
    impl TokenResolver for OneToken {
        async fn resolve(&self, token: &str) -> Result<Option<AuthUser>, AppError> {
            Ok((token == "good-token").then(|| self.0.clone()))
        }
    }

    fn app() -> Router {
        let resolver: SharedTokenResolver = Arc::new(OneToken(AuthUser {
            id: Uuid::nil(),
            email: "buyer@example.com".into(),
        }));

        Router::new()
            .route("/me", get(|user: AuthUser| async move { user.email }))
            .route("/public", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(resolver, authenticate))
    }

    async fn call(authorization: Option<&str>, uri: &str) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        let response = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_extract_token_formats() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "raw-token".parse().unwrap());
        assert_eq!(extract_token(&headers), Some("raw-token"));

        headers.insert(header::AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(extract_token(&headers), Some("abc123"));

        headers.insert(header::AUTHORIZATION, "Bearer   ".parse().unwrap());
        assert_eq!(extract_token(&headers), None);
    }

    #[tokio::test]
    async fn test_known_token_reaches_handler() {
        let (status, body) = call(Some("Bearer good-token"), "/me").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "buyer@example.com");
    }

    #[tokio::test]
    async fn test_missing_and_unknown_tokens_look_the_same() {
        let missing = call(None, "/me").await;
        let unknown = call(Some("nope"), "/me").await;
        let garbled = call(Some("Bearer %%garbled%%"), "/me").await;

        assert_eq!(missing.0, StatusCode::UNAUTHORIZED);
        assert_eq!(missing.1, r#"{"errors":"Not authenticated"}"#);
        assert_eq!(unknown, missing);
        assert_eq!(garbled, missing);
    }

    #[tokio::test]
    async fn test_public_route_ignores_bad_token() {
        let (status, _) = call(Some("nope"), "/public").await;
        assert_eq!(status, StatusCode::OK);
    }
}
