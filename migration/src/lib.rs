//! Database migrations for the Catalog API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_05_20_101500_create_catalog_items;
mod m2025_05_20_101600_create_location_stocks;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_05_20_101500_create_catalog_items::Migration),
            Box::new(m2025_05_20_101600_create_location_stocks::Migration),
        ]
    }
}
