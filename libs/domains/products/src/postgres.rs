use async_trait::async_trait;
use pagination::{Page, PageRequest, PaginationMeta};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, ExprTrait, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity,
    error::{ProductError, ProductResult},
    models::{NewProduct, Product, ProductChanges, ProductSearch},
    repository::ProductRepository,
};

fn db_error(e: sea_orm::DbErr) -> ProductError {
    ProductError::Internal(format!("Database error: {}", e))
}

/// Escape LIKE wildcards so a keyword matches literally
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(Clone)]
pub struct PgProductRepository {
    db: DatabaseConnection,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn filtered(search: &ProductSearch) -> Select<entity::Entity> {
        let mut query = entity::Entity::find();

        if let Some(ids) = &search.product_ids {
            query = query.filter(entity::Column::Id.is_in(ids.clone()));
        }

        if let Some(keyword) = &search.keyword {
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(entity::Column::Title)))
                    .like(like_pattern(keyword)),
            );
        }

        if let Some(min) = search.min_price {
            query = query.filter(entity::Column::Price.gte(min));
        }

        if let Some(max) = search.max_price {
            query = query.filter(entity::Column::Price.lte(max));
        }

        query
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, owner: Uuid, input: NewProduct) -> ProductResult<Product> {
        let model = entity::ActiveModel::from_new(owner, input)
            .insert(&self.db)
            .await
            .map_err(db_error)?;

        tracing::info!(product_id = %model.id, user_id = %owner, "Created product");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let model = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_error)?;

        Ok(model.map(Into::into))
    }

    async fn search(
        &self,
        search: ProductSearch,
        page: PageRequest,
    ) -> ProductResult<Page<Product>> {
        let query = Self::filtered(&search);

        let total = query.clone().count(&self.db).await.map_err(db_error)?;
        if page.is_past_end(total) {
            return Ok(Page::new(Vec::new(), PaginationMeta::new(&page, total)));
        }

        let query = if search.recent {
            query
                .order_by_desc(entity::Column::UpdatedAt)
                .order_by_desc(entity::Column::Id)
        } else {
            query
                .order_by_asc(entity::Column::CreatedAt)
                .order_by_asc(entity::Column::Id)
        };

        let models = query
            .limit(page.limit())
            .offset(page.offset())
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(Page::new(
            models.into_iter().map(Into::into).collect(),
            PaginationMeta::new(&page, total),
        ))
    }

    async fn update(&self, id: Uuid, changes: ProductChanges) -> ProductResult<Product> {
        let model = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or(ProductError::NotFound(id))?;

        let mut active: entity::ActiveModel = model.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(quantity) = changes.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(published) = changes.published {
            active.published = Set(published);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        let updated = active.update(&self.db).await.map_err(db_error)?;

        tracing::info!(product_id = %id, "Updated product");
        Ok(updated.into())
    }

    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let placements = txn
            .execute_raw(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "DELETE FROM placements WHERE product_id = $1",
                [id.into()],
            ))
            .await
            .map_err(db_error)?;

        let result = entity::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        if result.rows_affected > 0 {
            tracing::info!(
                product_id = %id,
                placements_removed = placements.rows_affected(),
                "Deleted product"
            );
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
