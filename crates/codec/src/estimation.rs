//! Commit cost approximation. The formulas model the rollup contract's gas
//! usage closely enough for packing decisions, they are not exact.

use crate::{
    blob::BLOB_METADATA_BYTES,
    block::{BLOCK_CONTEXT_BYTES, BLOCK_CONTEXT_BYTES_FOR_HASHING},
    CodecVersion,
};
use rollup_relayer_primitives::{BatchData, ChunkData, L2Block};

/// The gas charged per non-zero calldata byte.
const CALLDATA_NON_ZERO_BYTE_GAS: u64 = 16;

const fn memory_expansion_cost(memory_byte_size: u64) -> u64 {
    let words = memory_byte_size.div_ceil(32);
    words * words / 512 + 3 * words
}

const fn keccak_gas(size: u64) -> u64 {
    memory_expansion_cost(size) + 30 + 6 * size.div_ceil(32)
}

fn block_l1_commit_gas(version: CodecVersion, block: &L2Block) -> u64 {
    let mut total = 0;
    let mut num_l1_messages = 0u64;
    for tx in &block.transactions {
        if tx.is_l1_message() {
            num_l1_messages += 1;
            continue;
        }
        if version == CodecVersion::V0 {
            let size = tx.payload.len() as u64;
            total += CALLDATA_NON_ZERO_BYTE_GAS * (size + 4); // payload and length prefix
            total += keccak_gas(size); // L2 tx hash
        }
    }

    total += CALLDATA_NON_ZERO_BYTE_GAS * BLOCK_CONTEXT_BYTES as u64;

    // per included L1 message: a cold sload and a staticcall into the message
    // queue, routed through its proxy
    total += 2100 * num_l1_messages;
    total += 100 * num_l1_messages; // call to the message queue
    total += 100 * num_l1_messages; // warm address access
    total += memory_expansion_cost(36) * num_l1_messages; // staticcall to proxy
    total += 100 * num_l1_messages; // read admin in proxy
    total += 100 * num_l1_messages; // read impl in proxy
    total += 100 * num_l1_messages; // access impl
    total += memory_expansion_cost(36) * num_l1_messages; // delegatecall to impl

    total
}

pub(crate) fn chunk_l1_commit_gas(version: CodecVersion, chunk: &ChunkData) -> u64 {
    let mut total = 0;
    let mut total_tx_num = 0;
    for block in &chunk.blocks {
        total_tx_num += block.num_transactions();
        total += block_l1_commit_gas(version, block);
    }

    let num_blocks = chunk.blocks.len() as u64;
    total += 100 * num_blocks; // warm sload per block
    total += CALLDATA_NON_ZERO_BYTE_GAS; // the block count field
    total += CALLDATA_NON_ZERO_BYTE_GAS * num_blocks * BLOCK_CONTEXT_BYTES as u64;
    total += keccak_gas(BLOCK_CONTEXT_BYTES_FOR_HASHING as u64 * num_blocks + 32 * total_tx_num);
    total
}

pub(crate) fn chunk_l1_commit_calldata_size(version: CodecVersion, chunk: &ChunkData) -> u64 {
    let mut size = BLOCK_CONTEXT_BYTES as u64 * chunk.blocks.len() as u64;
    if version == CodecVersion::V0 {
        for block in &chunk.blocks {
            for tx in block.transactions.iter().filter(|tx| !tx.is_l1_message()) {
                size += 4 + tx.payload.len() as u64;
            }
        }
    }
    size
}

pub(crate) fn chunk_l1_commit_blob_size(version: CodecVersion, chunk: &ChunkData) -> u64 {
    match version {
        CodecVersion::V0 => 0,
        // over-estimate: the metadata is charged to every chunk
        CodecVersion::V1 => padded_blob_size(BLOB_METADATA_BYTES as u64 + blob_data_size(chunk)),
    }
}

pub(crate) fn batch_l1_commit_gas(version: CodecVersion, batch: &BatchData) -> u64 {
    let mut total = 0u64;

    total += 100_000; // proxy admin, implementation and pause checks
    total += 4 * 2100; // four one-time cold sloads for commitBatch
    total += 20_000; // one sstore
    total += 21_000; // transaction base fee
    total += CALLDATA_NON_ZERO_BYTE_GAS; // the version byte

    // one cold sload and one cold address access for the message queue,
    // minus the warm accesses already counted per block
    total += 2100 + 2600 - 100 - 100;

    // the parent batch header: constant part plus one bitmap word
    total += keccak_gas(89 + 32);
    total += CALLDATA_NON_ZERO_BYTE_GAS * (89 + 32);

    // the batch data hash over the member chunk hashes
    total += keccak_gas(32 * batch.chunks.len() as u64);

    let mut popped_before = batch.total_l1_messages_popped_before;
    for chunk in &batch.chunks {
        total += chunk_l1_commit_gas(version, chunk);

        let popped_in_chunk = chunk.num_l1_messages(popped_before);
        popped_before += popped_in_chunk;

        let bitmap_bytes = 32 * popped_in_chunk.div_ceil(256);
        total += CALLDATA_NON_ZERO_BYTE_GAS * bitmap_bytes;
        total += keccak_gas(89 + bitmap_bytes);

        total += memory_expansion_cost(chunk_l1_commit_calldata_size(version, chunk));
    }

    total
}

pub(crate) fn batch_l1_commit_calldata_size(version: CodecVersion, batch: &BatchData) -> u64 {
    batch.chunks.iter().map(|chunk| chunk_l1_commit_calldata_size(version, chunk)).sum()
}

pub(crate) fn batch_l1_commit_blob_size(version: CodecVersion, batch: &BatchData) -> u64 {
    match version {
        CodecVersion::V0 => 0,
        CodecVersion::V1 => padded_blob_size(
            BLOB_METADATA_BYTES as u64 +
                batch.chunks.iter().map(blob_data_size).sum::<u64>(),
        ),
    }
}

fn blob_data_size(chunk: &ChunkData) -> u64 {
    chunk
        .blocks
        .iter()
        .flat_map(|block| &block.transactions)
        .filter(|tx| !tx.is_l1_message())
        .map(|tx| tx.payload.len() as u64)
        .sum()
}

/// The blob footprint of a payload: every 31 data bytes take a 32-byte field
/// element.
const fn padded_blob_size(data_size: u64) -> u64 {
    let mut padded = (data_size / 31) * 32;
    if data_size % 31 != 0 {
        padded += 1 + data_size % 31;
    }
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Bytes;
    use rollup_relayer_primitives::{TransactionData, L1_MESSAGE_TX_TYPE};

    fn block_with_payloads(payloads: &[&'static [u8]]) -> L2Block {
        L2Block {
            transactions: payloads
                .iter()
                .map(|payload| TransactionData {
                    tx_type: 2,
                    payload: Bytes::from_static(payload),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn padded_blob_size_accounts_for_guard_bytes() {
        assert_eq!(padded_blob_size(0), 0);
        assert_eq!(padded_blob_size(31), 32);
        assert_eq!(padded_blob_size(32), 32 + 2);
        assert_eq!(padded_blob_size(62), 64);
    }

    #[test]
    fn calldata_size_embeds_payloads_only_for_v0() {
        let chunk = ChunkData::new(vec![block_with_payloads(&[&[1, 2, 3], &[4]])]);
        assert_eq!(chunk_l1_commit_calldata_size(CodecVersion::V0, &chunk), 60 + 4 + 3 + 4 + 1);
        assert_eq!(chunk_l1_commit_calldata_size(CodecVersion::V1, &chunk), 60);
    }

    #[test]
    fn blob_size_is_zero_for_v0() {
        let chunk = ChunkData::new(vec![block_with_payloads(&[&[1; 40]])]);
        assert_eq!(chunk_l1_commit_blob_size(CodecVersion::V0, &chunk), 0);
        assert_eq!(
            chunk_l1_commit_blob_size(CodecVersion::V1, &chunk),
            padded_blob_size(BLOB_METADATA_BYTES as u64 + 40)
        );
    }

    #[test]
    fn gas_grows_with_included_l1_messages() {
        let without_messages = ChunkData::new(vec![block_with_payloads(&[])]);
        let with_messages = ChunkData::new(vec![L2Block {
            transactions: vec![TransactionData {
                tx_type: L1_MESSAGE_TX_TYPE,
                queue_index: Some(0),
                ..Default::default()
            }],
            ..Default::default()
        }]);
        assert!(
            chunk_l1_commit_gas(CodecVersion::V1, &with_messages) >
                chunk_l1_commit_gas(CodecVersion::V1, &without_messages)
        );
    }

    #[test]
    fn batch_gas_exceeds_the_sum_of_chunk_gas() {
        let chunks = vec![ChunkData::new(vec![block_with_payloads(&[&[7; 10]])])];
        let batch = BatchData { chunks: chunks.clone(), ..Default::default() };
        let chunk_total: u64 =
            chunks.iter().map(|chunk| chunk_l1_commit_gas(CodecVersion::V1, chunk)).sum();
        assert!(batch_l1_commit_gas(CodecVersion::V1, &batch) > chunk_total);
    }
}
