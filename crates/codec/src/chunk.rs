use crate::{
    block::{DABlock, BLOCK_CONTEXT_BYTES_FOR_HASHING},
    CodecError, CodecVersion,
};
use alloy_primitives::{keccak256, B256};
use rollup_relayer_primitives::{ChunkData, TransactionData};

/// The one-byte block count field bounds the chunk encoding.
const MAX_BLOCKS_PER_CHUNK: usize = 255;

/// The data availability form of a chunk: block contexts plus the
/// transactions needed for hashing and payload encoding.
#[derive(Debug, Clone)]
pub struct DAChunk {
    version: CodecVersion,
    blocks: Vec<DABlock>,
    transactions: Vec<Vec<TransactionData>>,
}

impl DAChunk {
    pub(crate) fn new(
        version: CodecVersion,
        chunk: &ChunkData,
        total_l1_messages_popped_before: u64,
    ) -> Result<Self, CodecError> {
        if chunk.blocks.is_empty() {
            return Err(CodecError::EmptyChunk);
        }
        if chunk.blocks.len() > MAX_BLOCKS_PER_CHUNK {
            return Err(CodecError::TooManyBlocks {
                count: chunk.blocks.len(),
                max: MAX_BLOCKS_PER_CHUNK,
            });
        }

        let mut popped_before = total_l1_messages_popped_before;
        let mut blocks = Vec::with_capacity(chunk.blocks.len());
        let mut transactions = Vec::with_capacity(chunk.blocks.len());
        for block in &chunk.blocks {
            blocks.push(DABlock::new(block, popped_before)?);
            popped_before += block.num_l1_messages(popped_before);
            transactions.push(block.transactions.clone());
        }

        Ok(Self { version, blocks, transactions })
    }

    /// Returns the block contexts of the chunk.
    pub fn blocks(&self) -> &[DABlock] {
        &self.blocks
    }

    /// Serializes the chunk for commit calldata. Version 0 embeds the
    /// length-prefixed L2 transaction payloads, version 1 commits block
    /// contexts only.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = vec![self.blocks.len() as u8];
        for block in &self.blocks {
            bytes.extend_from_slice(&block.encode());
        }

        if self.version == CodecVersion::V0 {
            for block_txs in &self.transactions {
                for tx in block_txs.iter().filter(|tx| !tx.is_l1_message()) {
                    bytes.extend_from_slice(&(tx.payload.len() as u32).to_be_bytes());
                    bytes.extend_from_slice(&tx.payload);
                }
            }
        }

        bytes
    }

    /// Computes the chunk hash: the 58-byte prefix of every block context,
    /// followed by the hashes of the included L1 messages. Version 0
    /// additionally hashes the L2 transaction hashes of each block.
    pub fn hash(&self) -> B256 {
        let mut data = Vec::with_capacity(
            self.blocks.len() * BLOCK_CONTEXT_BYTES_FOR_HASHING + 32 * self.transactions.len(),
        );

        for block in &self.blocks {
            data.extend_from_slice(&block.encode()[..BLOCK_CONTEXT_BYTES_FOR_HASHING]);
        }

        for block_txs in &self.transactions {
            for tx in block_txs.iter().filter(|tx| tx.is_l1_message()) {
                data.extend_from_slice(tx.tx_hash.as_slice());
            }
            if self.version == CodecVersion::V0 {
                for tx in block_txs.iter().filter(|tx| !tx.is_l1_message()) {
                    data.extend_from_slice(tx.tx_hash.as_slice());
                }
            }
        }

        keccak256(&data)
    }
}
