use async_trait::async_trait;
use pagination::{Page, PageRequest, paginate};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{NewProduct, Product, ProductChanges, ProductSearch};

/// Repository trait for Product persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Create a product owned by `owner`
    async fn create(&self, owner: Uuid, input: NewProduct) -> ProductResult<Product>;

    /// Get a product by ID
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// Filter, order and paginate products
    async fn search(
        &self,
        search: ProductSearch,
        page: PageRequest,
    ) -> ProductResult<Page<Product>>;

    /// Apply a partial update
    async fn update(&self, id: Uuid, changes: ProductChanges) -> ProductResult<Product>;

    /// Delete a product together with the placements referencing it
    async fn delete(&self, id: Uuid) -> ProductResult<bool>;
}

/// Shared product map, so the in-memory order and user stores can work on
/// the same rows
pub type ProductStore = Arc<RwLock<HashMap<Uuid, Product>>>;

/// In-memory implementation of ProductRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductRepository {
    products: ProductStore,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the underlying map
    pub fn store(&self) -> ProductStore {
        self.products.clone()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, owner: Uuid, input: NewProduct) -> ProductResult<Product> {
        let product = Product::new(owner, input);
        self.products
            .write()
            .await
            .insert(product.id, product.clone());

        tracing::info!(product_id = %product.id, "Created product");
        Ok(product)
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.get(&id).cloned())
    }

    async fn search(
        &self,
        search: ProductSearch,
        page: PageRequest,
    ) -> ProductResult<Page<Product>> {
        let products = self.products.read().await;

        let mut result: Vec<Product> = products
            .values()
            .filter(|p| search.matches(p))
            .cloned()
            .collect();
        search.sort(&mut result);

        Ok(paginate(result, page))
    }

    async fn update(&self, id: Uuid, changes: ProductChanges) -> ProductResult<Product> {
        let mut products = self.products.write().await;
        let product = products.get_mut(&id).ok_or(ProductError::NotFound(id))?;

        product.apply_changes(changes);

        tracing::info!(product_id = %id, "Updated product");
        Ok(product.clone())
    }

    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        // Placements live with their orders and are resolved against this
        // map on read, so dropping the row is enough.
        let removed = self.products.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(product_id = %id, "Deleted product");
        }
        Ok(removed)
    }
}
