use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use axum_helpers::FieldErrors;
use pagination::{Page, PageRequest};

use crate::error::{ProductError, ProductResult};
use crate::models::{
    CreateProduct, NewProduct, PriceInput, Product, ProductChanges, ProductSearch, UpdateProduct,
};
use crate::repository::ProductRepository;

/// Service layer for Product business logic
#[derive(Clone)]
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Search the catalog
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        search: ProductSearch,
        page: PageRequest,
    ) -> ProductResult<Page<Product>> {
        self.repository.search(search, page).await
    }

    /// Get a product by ID
    pub async fn get_product(&self, id: Uuid) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Create a product owned by `owner` from a body the handler already
    /// validated; nothing is written when title or price is missing
    #[instrument(skip(self, input), fields(user_id = %owner))]
    pub async fn create_product(&self, owner: Uuid, input: CreateProduct) -> ProductResult<Product> {
        let (Some(title), Some(price)) = (
            input.title,
            input.price.as_ref().and_then(PriceInput::to_decimal),
        ) else {
            return Err(ProductError::Validation(FieldErrors::single(
                "base",
                "title and price are required",
            )));
        };

        let new_product = NewProduct {
            title: title.trim().to_string(),
            price,
            quantity: input.quantity.unwrap_or(0),
            published: input.published.unwrap_or(false),
        };

        self.repository.create(owner, new_product).await
    }

    /// Get a product the caller owns; foreign products are reported as missing
    pub async fn get_owned_product(&self, owner: Uuid, id: Uuid) -> ProductResult<Product> {
        let product = self.get_product(id).await?;

        if product.user_id != owner {
            return Err(ProductError::NotFound(id));
        }

        Ok(product)
    }

    /// Update a product the caller owns with an already validated body
    #[instrument(skip(self, input), fields(user_id = %owner))]
    pub async fn update_product(
        &self,
        owner: Uuid,
        id: Uuid,
        input: UpdateProduct,
    ) -> ProductResult<Product> {
        self.get_owned_product(owner, id).await?;

        self.repository
            .update(id, ProductChanges::from(input))
            .await
    }

    /// Delete a product the caller owns, with its placements
    #[instrument(skip(self), fields(user_id = %owner))]
    pub async fn delete_product(&self, owner: Uuid, id: Uuid) -> ProductResult<()> {
        self.get_owned_product(owner, id).await?;

        if !self.repository.delete(id).await? {
            return Err(ProductError::NotFound(id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryProductRepository, MockProductRepository};
    use rust_decimal::Decimal;

    fn lamp() -> CreateProduct {
        CreateProduct {
            title: Some("  Desk lamp ".to_string()),
            price: Some(PriceInput::from(Decimal::new(2500, 2))),
            quantity: Some(3),
            published: None,
        }
    }

    #[tokio::test]
    async fn test_create_product_applies_defaults() {
        let service = ProductService::new(InMemoryProductRepository::new());
        let owner = Uuid::now_v7();

        let product = service.create_product(owner, lamp()).await.unwrap();

        assert_eq!(product.title, "Desk lamp");
        assert_eq!(product.quantity, 3);
        assert!(!product.published);
        assert_eq!(product.user_id, owner);
    }

    #[tokio::test]
    async fn test_invalid_product_is_not_written() {
        let repository = InMemoryProductRepository::new();
        let store = repository.store();
        let service = ProductService::new(repository);

        let input = CreateProduct {
            title: Some("Lamp".to_string()),
            price: Some(PriceInput::Text("free".to_string())),
            ..Default::default()
        };
        let err = service.create_product(Uuid::now_v7(), input).await.unwrap_err();

        let ProductError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert_eq!(fields.get("base").unwrap(), ["title and price are required"]);
        assert!(store.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_foreign_product_is_not_found() {
        let service = ProductService::new(InMemoryProductRepository::new());
        let owner = Uuid::now_v7();
        let stranger = Uuid::now_v7();
        let product = service.create_product(owner, lamp()).await.unwrap();

        let update = service
            .update_product(stranger, product.id, UpdateProduct::default())
            .await;
        let delete = service.delete_product(stranger, product.id).await;

        assert!(matches!(update, Err(ProductError::NotFound(_))));
        assert!(matches!(delete, Err(ProductError::NotFound(_))));
        assert!(service.get_product(product.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_product() {
        let service = ProductService::new(InMemoryProductRepository::new());
        let owner = Uuid::now_v7();
        let product = service.create_product(owner, lamp()).await.unwrap();

        let updated = service
            .update_product(
                owner,
                product.id,
                UpdateProduct {
                    price: Some(PriceInput::Text("30".to_string())),
                    published: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.price, Decimal::new(30, 0));
        assert!(updated.published);
        assert_eq!(updated.title, "Desk lamp");
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut repository = MockProductRepository::new();
        repository
            .expect_get_by_id()
            .returning(|_| Err(ProductError::Internal("connection reset".to_string())));
        let service = ProductService::new(repository);

        let result = service.get_product(Uuid::now_v7()).await;

        assert!(matches!(result, Err(ProductError::Internal(_))));
    }
}
