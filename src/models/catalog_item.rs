//! CatalogItem entity model
//!
//! This module contains the SeaORM entity model for the catalog_items table,
//! the canonical keyed dataset mutated by the bulk-import pipeline.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

use super::location_stock::Entity as LocationStock;

/// CatalogItem entity keyed by a unique business code
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "catalog_items")]
pub struct Model {
    /// Unique identifier for the catalog item (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Externally meaningful business code, unique across the catalog
    #[sea_orm(unique)]
    pub code: String,

    /// Human-readable item description
    pub description: String,

    /// Total quantity across all locations
    pub total_quantity: i32,

    /// Whether the item is currently active in the catalog
    pub active: bool,

    /// Timestamp when the item was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the item was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "LocationStock")]
    LocationStocks,
}

impl Related<LocationStock> for Entity {
    fn to() -> RelationDef {
        Relation::LocationStocks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
