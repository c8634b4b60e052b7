use async_trait::async_trait;
use chrono::Utc;
use domain_products::{Product, entity as product_entity};
use pagination::{Page, PageRequest, PaginationMeta};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Statement,
    TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    engine::{self, PreparedOrder},
    entity::{order, placement},
    error::{OrderError, OrderResult},
    models::{Order, OrderProduct, Placement, ProductOrderLine},
    repository::OrderRepository,
};

/// How long the placing transaction waits for a product row lock
const LOCK_TIMEOUT: &str = "5s";

fn db_error(e: sea_orm::DbErr) -> OrderError {
    OrderError::Internal(format!("Database error: {}", e))
}

fn transient(e: sea_orm::DbErr) -> OrderError {
    OrderError::Transient(format!("Database error: {}", e))
}

#[derive(Clone)]
pub struct PgOrderRepository {
    db: DatabaseConnection,
}

impl PgOrderRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lock every requested product row, in id order
    async fn lock_products(
        txn: &DatabaseTransaction,
        ids: Vec<Uuid>,
    ) -> OrderResult<HashMap<Uuid, Product>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let models = product_entity::Entity::find()
            .filter(product_entity::Column::Id.is_in(ids))
            .order_by_asc(product_entity::Column::Id)
            .lock_exclusive()
            .all(txn)
            .await
            .map_err(transient)?;

        Ok(models
            .into_iter()
            .map(|m| {
                let product = Product::from(m);
                (product.id, product)
            })
            .collect())
    }

    async fn insert_order(
        txn: &DatabaseTransaction,
        user_id: Uuid,
        prepared: &PreparedOrder,
    ) -> OrderResult<order::Model> {
        let now = Utc::now();
        let model = order::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id),
            total: Set(prepared.total),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(txn)
        .await
        .map_err(transient)?;

        let placements: Vec<placement::ActiveModel> = prepared
            .placements()
            .into_iter()
            .map(|p| placement::ActiveModel {
                id: Set(Uuid::now_v7()),
                order_id: Set(model.id),
                product_id: Set(p.product_id),
                quantity: Set(p.quantity),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            })
            .collect();

        placement::Entity::insert_many(placements)
            .exec(txn)
            .await
            .map_err(transient)?;

        Ok(model)
    }

    /// Take stock with a conditional update; false when a row no longer
    /// has enough units
    async fn decrement(txn: &DatabaseTransaction, id: Uuid, units: i32) -> OrderResult<bool> {
        let result = txn
            .execute_raw(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "UPDATE products SET quantity = quantity - $1 WHERE id = $2 AND quantity >= $1",
                [units.into(), id.into()],
            ))
            .await
            .map_err(transient)?;

        Ok(result.rows_affected() > 0)
    }

    /// Attach placements and products to a batch of order rows
    async fn load(&self, models: Vec<order::Model>) -> OrderResult<Vec<Order>> {
        let order_ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placements = placement::Entity::find()
            .filter(placement::Column::OrderId.is_in(order_ids))
            .order_by_asc(placement::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        let mut product_ids: Vec<Uuid> = placements.iter().map(|p| p.product_id).collect();
        product_ids.sort();
        product_ids.dedup();

        let products: HashMap<Uuid, Product> = product_entity::Entity::find()
            .filter(product_entity::Column::Id.is_in(product_ids))
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(|m| (m.id, Product::from(m)))
            .collect();

        Ok(models
            .into_iter()
            .map(|model| {
                let own: Vec<Placement> = placements
                    .iter()
                    .filter(|p| p.order_id == model.id)
                    .map(|p| Placement {
                        product_id: p.product_id,
                        quantity: p.quantity,
                    })
                    .collect();

                let mut order_products: Vec<OrderProduct> = Vec::new();
                for placement in &own {
                    if order_products.iter().any(|p| p.id == placement.product_id) {
                        continue;
                    }
                    if let Some(product) = products.get(&placement.product_id) {
                        order_products.push(product.clone().into());
                    }
                }

                Order {
                    id: model.id,
                    user_id: model.user_id,
                    total: model.total,
                    created_at: model.created_at.into(),
                    updated_at: model.updated_at.into(),
                    products: order_products,
                    placements: own,
                }
            })
            .collect())
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn place(&self, user_id: Uuid, lines: Vec<ProductOrderLine>) -> OrderResult<Order> {
        let txn = self.db.begin().await.map_err(transient)?;

        txn.execute_unprepared(&format!("SET LOCAL lock_timeout = '{}'", LOCK_TIMEOUT))
            .await
            .map_err(transient)?;

        let products = Self::lock_products(&txn, engine::requested_ids(&lines)).await?;

        let prepared = match engine::prepare(&lines, &products) {
            Ok(prepared) => prepared,
            Err(errors) => {
                txn.rollback().await.map_err(transient)?;
                return Err(OrderError::Validation(errors));
            }
        };

        let model = Self::insert_order(&txn, user_id, &prepared).await?;

        for (id, units) in &prepared.demand {
            if !Self::decrement(&txn, *id, *units).await? {
                txn.rollback().await.map_err(transient)?;
                return Err(OrderError::Transient(format!(
                    "Stock of product {} changed while placing the order",
                    id
                )));
            }
        }

        txn.commit().await.map_err(transient)?;

        tracing::info!(order_id = %model.id, user_id = %user_id, total = %model.total, "Placed order");
        Ok(Order {
            id: model.id,
            user_id,
            total: model.total,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
            products: prepared.products_after_decrement(),
            placements: prepared.placements(),
        })
    }

    async fn list_for_user(&self, user_id: Uuid, page: PageRequest) -> OrderResult<Page<Order>> {
        let query = order::Entity::find().filter(order::Column::UserId.eq(user_id));

        let total = query.clone().count(&self.db).await.map_err(db_error)?;
        if page.is_past_end(total) {
            return Ok(Page::new(Vec::new(), PaginationMeta::new(&page, total)));
        }

        let models = query
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .limit(page.limit())
            .offset(page.offset())
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(Page::new(
            self.load(models).await?,
            PaginationMeta::new(&page, total),
        ))
    }

    async fn get_for_user(&self, user_id: Uuid, id: Uuid) -> OrderResult<Option<Order>> {
        let model = order::Entity::find_by_id(id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_error)?;

        match model {
            Some(model) => Ok(self.load(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }
}
