use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

/// Registers the `token` scheme referenced by protected endpoints: the raw
/// auth token (or `Bearer <token>`) in the `Authorization` header.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "token",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Authorization"))),
        );
    }
}

/// Users and orders document absolute paths, so they are merged rather
/// than nested.
struct AccountsAddon;

impl Modify for AccountsAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.merge(domain_users::handlers::ApiDoc::openapi());
        openapi.merge(domain_orders::handlers::ApiDoc::openapi());
    }
}

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Marketplace API",
        version = "0.1.0",
        description = "Product catalog, orders and user accounts for the marketplace"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    modifiers(&AccountsAddon, &SecurityAddon),
    nest(
        (path = "/products", api = domain_products::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
