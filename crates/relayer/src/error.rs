use crate::SenderError;
use rollup_relayer_codec::CodecError;
use rollup_relayer_db::DatabaseError;
use rollup_relayer_watcher::WatcherError;

/// An error that occurred in one of the relayers.
#[derive(Debug, thiserror::Error)]
pub enum RelayerError {
    /// An error at the persistence layer.
    #[error(transparent)]
    Database(#[from] DatabaseError),
    /// An error at the codec.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// An error at the transaction sender.
    #[error(transparent)]
    Sender(#[from] SenderError),
    /// An error reading from the execution node.
    #[error(transparent)]
    ChainReader(#[from] WatcherError),
    /// The parent of a batch about to be committed is missing from the store.
    #[error("missing batch at index {0}")]
    MissingBatch(u64),
}
