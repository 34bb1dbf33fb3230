use rollup_relayer_codec::CodecError;
use rollup_relayer_db::DatabaseError;

/// An error that occurred in one of the proposers.
#[derive(Debug, thiserror::Error)]
pub enum ProposerError {
    /// An error at the persistence layer.
    #[error(transparent)]
    Database(#[from] DatabaseError),
    /// An error at the codec.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The store holds no chunk rows. Chunk 0 is created by the genesis
    /// import before the proposers start.
    #[error("no genesis chunk in store")]
    MissingGenesisChunk,
    /// The store holds no batch rows. Batch 0 is created by the genesis
    /// import before the proposers start.
    #[error("no genesis batch in store")]
    MissingGenesisBatch,
}
