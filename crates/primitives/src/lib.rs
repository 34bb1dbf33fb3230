//! Core data model shared across the rollup relayer crates.

pub mod batch;
pub mod block;
pub mod chunk;
pub mod metrics;
pub mod status;

pub use batch::{BatchData, BatchInfo, BatchRecord};
pub use block::{
    BlockHeaderInfo, BlockInfo, L1BlockRecord, L2Block, RowUsage, TransactionData,
    L1_MESSAGE_TX_TYPE,
};
pub use chunk::{ChunkData, ChunkRecord};
pub use metrics::{BatchMetrics, ChunkMetrics};
pub use status::{GasOracleStatus, ProvingStatus, RollupStatus, StatusConversionError};
