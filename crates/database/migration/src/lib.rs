//! Database schema migrations for the rollup relayer.

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_l1_block_table;
mod m20240101_000002_create_l2_block_table;
mod m20240101_000003_create_chunk_table;
mod m20240101_000004_create_batch_table;
mod m20240101_000005_create_metadata_table;

/// The relayer schema migrator.
#[derive(Debug)]
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_l1_block_table::Migration),
            Box::new(m20240101_000002_create_l2_block_table::Migration),
            Box::new(m20240101_000003_create_chunk_table::Migration),
            Box::new(m20240101_000004_create_batch_table::Migration),
            Box::new(m20240101_000005_create_metadata_table::Migration),
        ]
    }
}
