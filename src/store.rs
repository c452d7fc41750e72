//! Catalog store trait definition
//!
//! Defines the interface the import pipeline uses to talk to the canonical
//! catalog dataset. The production implementation is
//! [`crate::repositories::CatalogItemRepository`]; tests substitute an
//! in-memory store.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;

/// A catalog item as seen through the store seam.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: Uuid,
    pub code: String,
    pub description: String,
    pub total_quantity: i32,
    pub active: bool,
}

/// Fields for inserting a new catalog item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub code: String,
    pub description: String,
    pub total_quantity: i32,
}

/// Sparse update applied to an existing catalog item. `None` fields are left
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub description: Option<String>,
    pub total_quantity: Option<i32>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.total_quantity.is_none()
    }
}

/// Store-level error types for structured error handling
#[derive(Debug, Error)]
pub enum StoreError {
    /// The business code already exists in the catalog
    #[error("duplicate business code: {code}")]
    DuplicateCode { code: String },
    /// No catalog item carries the given business code
    #[error("catalog item not found: {code}")]
    NotFound { code: String },
    /// The backing database rejected the operation
    #[error("storage failure: {0}")]
    Database(sea_orm::DbErr),
    /// The store is temporarily unreachable
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateCode { code } => ApiError::new(
                axum::http::StatusCode::CONFLICT,
                "CONFLICT".to_string(),
                format!("Catalog item with code '{}' already exists", code),
            ),
            StoreError::NotFound { code } => ApiError::new(
                axum::http::StatusCode::NOT_FOUND,
                "NOT_FOUND".to_string(),
                format!("Catalog item '{}' not found", code),
            ),
            StoreError::Database(db_err) => db_err.into(),
            StoreError::Unavailable(details) => {
                tracing::error!("Catalog store unavailable: {}", details);
                ApiError::new(
                    axum::http::StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Catalog store unavailable",
                )
            }
        }
    }
}

/// Interface between the import pipeline and the canonical catalog dataset.
///
/// The pipeline only ever addresses items by business code and treats the
/// store's unique-code constraint as authoritative: a `DuplicateCode` result
/// from `insert_item` is a normal per-row outcome, not a pipeline fault.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Look up a catalog item by its business code.
    async fn find_by_code(&self, code: &str) -> Result<Option<CatalogItem>, StoreError>;

    /// Insert a new catalog item. Fails with [`StoreError::DuplicateCode`]
    /// when the code is already taken.
    async fn insert_item(&self, item: NewItem) -> Result<CatalogItem, StoreError>;

    /// Apply a sparse update to the item carrying `code`.
    async fn update_item(&self, code: &str, patch: ItemPatch) -> Result<CatalogItem, StoreError>;

    /// Remove every location stock row attached to `item_id`.
    async fn clear_location_stocks(&self, item_id: Uuid) -> Result<(), StoreError>;

    /// Insert a single location stock row for `item_id`.
    async fn insert_location_stock(
        &self,
        item_id: Uuid,
        location: &str,
        quantity: i32,
    ) -> Result<(), StoreError>;
}
