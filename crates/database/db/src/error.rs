use alloy_primitives::B256;

/// The error type for database operations.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    /// A batch was not found in the database.
    #[error("batch with hash [{0}] not found in database")]
    BatchNotFound(B256),
    /// A stored L2 block range has gaps.
    #[error("L2 block range [{start}, {end}] is incomplete in database")]
    IncompleteBlockRange {
        /// The first block number of the range.
        start: u64,
        /// The last block number of the range.
        end: u64,
    },
    /// A stored chunk range has gaps.
    #[error("chunk range [{start}, {end}] is incomplete in database")]
    IncompleteChunkRange {
        /// The first chunk index of the range.
        start: u64,
        /// The last chunk index of the range.
        end: u64,
    },
}
