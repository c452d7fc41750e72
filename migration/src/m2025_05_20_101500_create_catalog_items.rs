//! Migration to create the catalog_items table.
//!
//! Catalog items are keyed internally by UUID but carry an externally
//! meaningful business code which must be unique across the catalog.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CatalogItems::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CatalogItems::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CatalogItems::Code).text().not_null())
                    .col(ColumnDef::new(CatalogItems::Description).text().not_null())
                    .col(
                        ColumnDef::new(CatalogItems::TotalQuantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CatalogItems::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(CatalogItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CatalogItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_catalog_items_code")
                    .table(CatalogItems::Table)
                    .col(CatalogItems::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CatalogItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CatalogItems {
    Table,
    Id,
    Code,
    Description,
    TotalQuantity,
    Active,
    CreatedAt,
    UpdatedAt,
}
