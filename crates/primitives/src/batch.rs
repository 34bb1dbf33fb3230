use crate::{
    chunk::ChunkData,
    status::{GasOracleStatus, ProvingStatus, RollupStatus},
};
use alloy_primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};

/// Information about a batch.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInfo {
    /// The batch index.
    pub index: u64,
    /// The batch hash.
    pub hash: B256,
}

impl BatchInfo {
    /// Returns a new instance of [`BatchInfo`].
    pub const fn new(index: u64, hash: B256) -> Self {
        Self { index, hash }
    }
}

/// The inputs to batch construction: a run of chunks and the parent linkage.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchData {
    /// The batch index.
    pub index: u64,
    /// The hash of the parent batch.
    pub parent_batch_hash: B256,
    /// The total number of L1 messages popped before this batch.
    pub total_l1_messages_popped_before: u64,
    /// The member chunks, ascending by index.
    pub chunks: Vec<ChunkData>,
}

impl BatchData {
    /// Returns the number of L1 messages popped by this batch.
    pub fn num_l1_messages(&self) -> u64 {
        let mut popped = 0;
        for chunk in &self.chunks {
            popped += chunk.num_l1_messages(self.total_l1_messages_popped_before + popped);
        }
        popped
    }
}

/// A stored batch row.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    /// The batch index.
    pub index: u64,
    /// The batch hash.
    pub hash: B256,
    /// The index of the first member chunk.
    pub start_chunk_index: u64,
    /// The hash of the first member chunk.
    pub start_chunk_hash: B256,
    /// The index of the last member chunk.
    pub end_chunk_index: u64,
    /// The hash of the last member chunk.
    pub end_chunk_hash: B256,
    /// The hash of the parent batch.
    pub parent_batch_hash: B256,
    /// The codec version the batch was created with.
    pub codec_version: u8,
    /// The encoded batch header submitted with commit and finalize calls.
    pub batch_header: Bytes,
    /// The canonical blob payload, blob availability only.
    pub blob_bytes: Option<Bytes>,
    /// The point-evaluation proof of the blob, blob availability only.
    pub blob_data_proof: Option<Bytes>,
    /// The state root after the last member block.
    pub state_root: B256,
    /// The withdraw trie root after the last member block.
    pub withdraw_root: B256,
    /// The L1 lifecycle state.
    pub rollup_status: RollupStatus,
    /// The proving lifecycle state.
    pub proving_status: ProvingStatus,
    /// The gas oracle lifecycle state.
    pub oracle_status: GasOracleStatus,
    /// The hash of the commit transaction.
    pub commit_tx_hash: Option<B256>,
    /// The hash of the finalize transaction.
    pub finalize_tx_hash: Option<B256>,
    /// The hash of the gas oracle update transaction.
    pub oracle_tx_hash: Option<B256>,
    /// The aggregated proof, opaque to the relayer.
    pub proof: Option<Bytes>,
    /// The L1 timestamp of the commit event.
    pub committed_at: Option<u64>,
    /// The L1 timestamp of the finalize event.
    pub finalized_at: Option<u64>,
}
