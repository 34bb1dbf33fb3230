use alloy_json_rpc::RpcError;
use alloy_rpc_types_eth::BlockNumberOrTag;
use alloy_transport::TransportErrorKind;
use rollup_relayer_db::DatabaseError;

/// An error that occurred in one of the chain watchers.
#[derive(Debug, thiserror::Error)]
pub enum WatcherError {
    /// An RPC error at the execution node provider.
    #[error("execution provider rpc error: {0}")]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// An error at the persistence layer.
    #[error(transparent)]
    Database(#[from] DatabaseError),
    /// A block expected to exist on the node is missing.
    #[error("unknown block {0}")]
    MissingBlock(u64),
    /// The node does not expose a block for the requested tag.
    #[error("no {0} block available")]
    MissingTaggedBlock(BlockNumberOrTag),
    /// The node returned a block without row consumption data.
    #[error("missing row consumption for block {0}")]
    MissingRowConsumption(u64),
    /// A log is missing a field required to apply it.
    #[error("missing {0} for log")]
    IncompleteLog(&'static str),
}
