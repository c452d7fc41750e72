//! # CatalogItem Repository
//!
//! This module provides repository operations for the catalog_items and
//! location_stocks tables, and is the production implementation of the
//! [`CatalogStore`] seam used by the import pipeline.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::error::is_unique_violation;
use crate::models::catalog_item::{self, ActiveModel, Entity, Model};
use crate::models::location_stock;
use crate::store::{CatalogItem, CatalogStore, ItemPatch, NewItem, StoreError};

/// Repository for catalog item database operations
#[derive(Clone)]
pub struct CatalogItemRepository {
    db: DatabaseConnection,
}

fn to_store_item(model: Model) -> CatalogItem {
    CatalogItem {
        id: model.id,
        code: model.code,
        description: model.description,
        total_quantity: model.total_quantity,
        active: model.active,
    }
}

fn map_db_err(error: sea_orm::DbErr, code: &str) -> StoreError {
    if is_unique_violation(&error) {
        StoreError::DuplicateCode {
            code: code.to_string(),
        }
    } else {
        StoreError::Database(error)
    }
}

impl CatalogItemRepository {
    /// Create a new CatalogItemRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// List catalog items ordered by business code, returning at most
    /// `limit` items that sort strictly after `after_code`.
    pub async fn list_items(
        &self,
        limit: u64,
        after_code: Option<&str>,
    ) -> Result<Vec<CatalogItem>, StoreError> {
        let mut query = Entity::find().order_by_asc(catalog_item::Column::Code);

        if let Some(code) = after_code {
            query = query.filter(catalog_item::Column::Code.gt(code));
        }

        let models = query
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(StoreError::Database)?;

        Ok(models.into_iter().map(to_store_item).collect())
    }

    /// List the location stock rows attached to a catalog item.
    pub async fn list_location_stocks(
        &self,
        item_id: Uuid,
    ) -> Result<Vec<location_stock::Model>, StoreError> {
        location_stock::Entity::find()
            .filter(location_stock::Column::ItemId.eq(item_id))
            .order_by_asc(location_stock::Column::Location)
            .all(&self.db)
            .await
            .map_err(StoreError::Database)
    }

    /// Delete the item carrying `code` (location stocks cascade).
    pub async fn delete_by_code(&self, code: &str) -> Result<(), StoreError> {
        let result = Entity::delete_many()
            .filter(catalog_item::Column::Code.eq(code))
            .exec(&self.db)
            .await
            .map_err(StoreError::Database)?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound {
                code: code.to_string(),
            });
        }

        Ok(())
    }

    /// Bulk activate or deactivate every item whose code is in `codes`.
    /// Returns the number of affected rows.
    pub async fn set_active_by_codes(
        &self,
        codes: &[String],
        active: bool,
    ) -> Result<u64, StoreError> {
        if codes.is_empty() {
            return Ok(0);
        }

        let result = Entity::update_many()
            .col_expr(catalog_item::Column::Active, Expr::value(active))
            .col_expr(
                catalog_item::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(catalog_item::Column::Code.is_in(codes.iter().map(String::as_str)))
            .exec(&self.db)
            .await
            .map_err(StoreError::Database)?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl CatalogStore for CatalogItemRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<CatalogItem>, StoreError> {
        let model = Entity::find()
            .filter(catalog_item::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(StoreError::Database)?;

        Ok(model.map(to_store_item))
    }

    async fn insert_item(&self, item: NewItem) -> Result<CatalogItem, StoreError> {
        let now = Utc::now().fixed_offset();

        let active = ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(item.code.clone()),
            description: Set(item.description),
            total_quantity: Set(item.total_quantity),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active
            .insert(&self.db)
            .await
            .map_err(|e| map_db_err(e, &item.code))?;

        tracing::debug!(code = %model.code, item_id = %model.id, "Catalog item inserted");

        Ok(to_store_item(model))
    }

    async fn update_item(&self, code: &str, patch: ItemPatch) -> Result<CatalogItem, StoreError> {
        let model = Entity::find()
            .filter(catalog_item::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(StoreError::Database)?
            .ok_or_else(|| StoreError::NotFound {
                code: code.to_string(),
            })?;

        let mut active: ActiveModel = model.into();
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(total_quantity) = patch.total_quantity {
            active.total_quantity = Set(total_quantity);
        }
        active.updated_at = Set(Utc::now().fixed_offset());

        let updated = active
            .update(&self.db)
            .await
            .map_err(StoreError::Database)?;

        Ok(to_store_item(updated))
    }

    async fn clear_location_stocks(&self, item_id: Uuid) -> Result<(), StoreError> {
        location_stock::Entity::delete_many()
            .filter(location_stock::Column::ItemId.eq(item_id))
            .exec(&self.db)
            .await
            .map_err(StoreError::Database)?;

        Ok(())
    }

    async fn insert_location_stock(
        &self,
        item_id: Uuid,
        location: &str,
        quantity: i32,
    ) -> Result<(), StoreError> {
        let stock = location_stock::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_id: Set(item_id),
            location: Set(location.to_string()),
            quantity: Set(quantity),
            created_at: Set(Utc::now().fixed_offset()),
        };

        stock
            .insert(&self.db)
            .await
            .map_err(|e| map_db_err(e, location))?;

        Ok(())
    }
}
