//! The persistence layer of the rollup relayer.

mod db;
pub use db::Database;

mod error;
pub use error::DatabaseError;

pub mod models;

mod operations;
pub use operations::DatabaseOperations;

mod transaction;
pub use transaction::DatabaseTransaction;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use sea_orm::DbErr;

/// A type that holds a sea-orm connection the database operations can run
/// against, either a plain connection or an open transaction.
pub trait DatabaseConnectionProvider {
    /// The underlying connection type.
    type Connection: sea_orm::ConnectionTrait;

    /// Returns a reference to the underlying connection.
    fn get_connection(&self) -> &Self::Connection;
}
