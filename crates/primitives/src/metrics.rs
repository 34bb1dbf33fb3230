use serde::{Deserialize, Serialize};

/// Estimated resource usage of a candidate chunk, recomputed by the chunk
/// proposer after each appended block.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetrics {
    /// The number of member blocks.
    pub num_blocks: u64,
    /// The total number of transactions.
    pub tx_num: u64,
    /// The maximum row consumption over the member blocks.
    pub crc_max: u64,
    /// The timestamp of the first member block.
    pub first_block_timestamp: u64,
    /// The estimated L1 commit gas.
    pub l1_commit_gas: u64,
    /// The estimated L1 commit calldata size in bytes.
    pub l1_commit_calldata_size: u64,
    /// The estimated blob payload size in bytes.
    pub l1_commit_blob_size: u64,
}

/// Estimated resource usage of a candidate batch.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMetrics {
    /// The number of member chunks.
    pub num_chunks: u64,
    /// The timestamp of the first block of the first member chunk.
    pub first_block_timestamp: u64,
    /// The estimated L1 commit gas.
    pub l1_commit_gas: u64,
    /// The estimated L1 commit calldata size in bytes.
    pub l1_commit_calldata_size: u64,
    /// The estimated blob payload size in bytes.
    pub l1_commit_blob_size: u64,
}
