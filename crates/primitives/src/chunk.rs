use crate::{block::L2Block, status::ProvingStatus};
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// A contiguous run of L2 blocks grouped for proving and data availability.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkData {
    /// The member blocks, ascending by number.
    pub blocks: Vec<L2Block>,
}

impl ChunkData {
    /// Returns a new chunk over the given blocks.
    pub const fn new(blocks: Vec<L2Block>) -> Self {
        Self { blocks }
    }

    /// Returns the total number of transactions over all member blocks.
    pub fn num_transactions(&self) -> u64 {
        self.blocks.iter().map(L2Block::num_transactions).sum()
    }

    /// Returns the number of L2 transactions over all member blocks.
    pub fn num_l2_transactions(&self) -> u64 {
        self.blocks.iter().map(L2Block::num_l2_transactions).sum()
    }

    /// Returns the number of L1 messages popped by this chunk, given the total
    /// number of messages popped before it.
    pub fn num_l1_messages(&self, total_l1_messages_popped_before: u64) -> u64 {
        let mut popped = 0;
        for block in &self.blocks {
            popped += block.num_l1_messages(total_l1_messages_popped_before + popped);
        }
        popped
    }

    /// Returns the maximum row consumption over all member blocks.
    pub fn crc_max(&self) -> u64 {
        self.blocks.iter().map(L2Block::crc_max).max().unwrap_or(0)
    }
}

/// A stored chunk row.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// The chunk index.
    pub index: u64,
    /// The chunk hash.
    pub hash: B256,
    /// The number of the first member block.
    pub start_block_number: u64,
    /// The number of the last member block.
    pub end_block_number: u64,
    /// The total number of L1 messages popped before this chunk.
    pub total_l1_messages_popped_before: u64,
    /// The number of L1 messages popped by this chunk.
    pub total_l1_messages_popped_in_chunk: u64,
    /// The timestamp of the first member block.
    pub start_block_timestamp: u64,
    /// The total number of transactions.
    pub tx_num: u64,
    /// The maximum row consumption over the member blocks.
    pub max_row_consumption: u64,
    /// The estimated L1 commit gas.
    pub l1_commit_gas: u64,
    /// The estimated L1 commit calldata size.
    pub l1_commit_calldata_size: u64,
    /// The estimated blob payload size.
    pub l1_commit_blob_size: u64,
    /// The hash of the parent chunk.
    pub parent_chunk_hash: B256,
    /// The codec version the chunk was created with.
    pub codec_version: u8,
    /// The proving lifecycle state.
    pub proving_status: ProvingStatus,
    /// The hash of the containing batch, set once the chunk is batched.
    pub batch_hash: Option<B256>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{TransactionData, L1_MESSAGE_TX_TYPE};

    fn block_with_queue_indices(indices: &[u64]) -> L2Block {
        L2Block {
            transactions: indices
                .iter()
                .map(|index| TransactionData {
                    tx_type: L1_MESSAGE_TX_TYPE,
                    queue_index: Some(*index),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn num_l1_messages_accumulates_across_blocks() {
        let chunk = ChunkData::new(vec![
            block_with_queue_indices(&[0, 1]),
            block_with_queue_indices(&[]),
            block_with_queue_indices(&[4]),
        ]);
        // indices 0..=4 popped in total.
        assert_eq!(chunk.num_l1_messages(0), 5);
    }
}
