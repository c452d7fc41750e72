//! # Repositories
//!
//! Data access layer encapsulating SeaORM operations on the catalog tables.

pub mod catalog_item;

pub use catalog_item::CatalogItemRepository;
