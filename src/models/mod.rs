//! # Data Models
//!
//! This module contains all the data models used throughout the Catalog API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod catalog_item;
pub mod location_stock;

pub use catalog_item::Entity as CatalogItem;
pub use location_stock::Entity as LocationStock;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "catalog-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
