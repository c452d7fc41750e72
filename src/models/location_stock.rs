//! LocationStock entity model
//!
//! Per-location quantity rows attached to a catalog item. The import
//! pipeline replaces an item's whole stock set in place of diffing it.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

use super::catalog_item::Entity as CatalogItem;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "location_stocks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Catalog item this stock row belongs to
    pub item_id: Uuid,

    /// Location code (e.g. warehouse or store identifier)
    pub location: String,

    /// Quantity held at this location
    pub quantity: i32,

    /// Timestamp when the stock row was written
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "CatalogItem",
        from = "Column::ItemId",
        to = "super::catalog_item::Column::Id"
    )]
    CatalogItem,
}

impl Related<CatalogItem> for Entity {
    fn to() -> RelationDef {
        Relation::CatalogItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
