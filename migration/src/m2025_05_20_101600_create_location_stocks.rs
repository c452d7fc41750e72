//! Migration to create the location_stocks table.
//!
//! Location stocks are the per-location quantity rows attached to a catalog
//! item. The import pipeline replaces an item's whole stock set rather than
//! diffing it, so rows here are always written as delete-then-reinsert.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LocationStocks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LocationStocks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(LocationStocks::ItemId).uuid().not_null())
                    .col(ColumnDef::new(LocationStocks::Location).text().not_null())
                    .col(
                        ColumnDef::new(LocationStocks::Quantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LocationStocks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_location_stocks_item_id")
                            .from(LocationStocks::Table, LocationStocks::ItemId)
                            .to(CatalogItems::Table, CatalogItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_location_stocks_item_location")
                    .table(LocationStocks::Table)
                    .col(LocationStocks::ItemId)
                    .col(LocationStocks::Location)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LocationStocks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LocationStocks {
    Table,
    Id,
    ItemId,
    Location,
    Quantity,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CatalogItems {
    Table,
    Id,
}
