use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250301_000002_create_products::Products;
use crate::m20250301_000003_create_orders::Orders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Placements::Table)
                    .if_not_exists()
                    .col(pk_uuid(Placements::Id))
                    .col(uuid(Placements::OrderId))
                    .col(uuid(Placements::ProductId))
                    .col(integer(Placements::Quantity))
                    .col(
                        timestamp_with_time_zone(Placements::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Placements::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_placements_order_id")
                            .from(Placements::Table, Placements::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_placements_product_id")
                            .from(Placements::Table, Placements::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE placements ADD CONSTRAINT placements_quantity_positive CHECK (quantity > 0)",
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_placements_order_id")
                    .table(Placements::Table)
                    .col(Placements::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_placements_product_id")
                    .table(Placements::Table)
                    .col(Placements::ProductId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Placements::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Placements {
    Table,
    Id,
    OrderId,
    ProductId,
    Quantity,
    CreatedAt,
    UpdatedAt,
}
