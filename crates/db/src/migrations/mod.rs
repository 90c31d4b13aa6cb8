//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_property_tables;
mod m20250101_000002_create_inquiry_tables;
mod m20250101_000003_create_property_review_table;
mod m20250101_000004_create_sidebar_content_table;
mod m20250101_000005_create_admin_table;
mod m20250101_000006_create_analytics_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_property_tables::Migration),
            Box::new(m20250101_000002_create_inquiry_tables::Migration),
            Box::new(m20250101_000003_create_property_review_table::Migration),
            Box::new(m20250101_000004_create_sidebar_content_table::Migration),
            Box::new(m20250101_000005_create_admin_table::Migration),
            Box::new(m20250101_000006_create_analytics_table::Migration),
        ]
    }
}
