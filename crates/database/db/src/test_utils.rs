//! Test utilities for the database.

use crate::Database;

use rollup_relayer_migration::{Migrator, MigratorTrait};

/// Instantiates a fresh in-memory database and runs the migrations on it,
/// returning the [`Database`].
pub async fn setup_test_db() -> Database {
    let connection = sea_orm::Database::connect("sqlite::memory:")
        .await
        .expect("could not connect to in-memory database");
    Migrator::up(&connection, None).await.expect("could not run migrations");
    connection.into()
}
