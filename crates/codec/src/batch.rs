use crate::{blob, chunk::DAChunk, CodecError, CodecVersion, MAX_NUM_CHUNKS};
use alloy_primitives::{keccak256, B256};
use rollup_relayer_primitives::{BatchData, ChunkData};

/// The batch header size without the blob versioned hash.
pub(crate) const HEADER_BYTES_V0: usize = 89;

/// The batch header size with the blob versioned hash.
pub(crate) const HEADER_BYTES_V1: usize = 121;

/// The data availability form of a batch: the header committed on L1 plus,
/// for blob availability, the blob payload and its challenge point.
#[derive(Debug, Clone)]
pub struct DABatch {
    /// The codec version.
    pub version: CodecVersion,
    /// The batch index.
    pub index: u64,
    /// The number of L1 messages popped by this batch.
    pub l1_message_popped: u64,
    /// The total number of L1 messages popped after this batch.
    pub total_l1_message_popped: u64,
    /// The hash over the member chunk hashes, part of the prover input.
    pub data_hash: B256,
    /// The versioned hash of the blob commitment, version 1 only.
    pub blob_versioned_hash: Option<B256>,
    /// The hash of the parent batch header.
    pub parent_batch_hash: B256,
    /// The skipped L1 message bitmap, one 32-byte word per 256 popped
    /// messages.
    pub skipped_l1_message_bitmap: Vec<u8>,
    blob: Option<Vec<u8>>,
    challenge_point: Option<B256>,
}

impl DABatch {
    pub(crate) fn new(version: CodecVersion, batch: &BatchData) -> Result<Self, CodecError> {
        if batch.chunks.is_empty() {
            return Err(CodecError::EmptyBatch);
        }
        if batch.chunks.len() > MAX_NUM_CHUNKS {
            return Err(CodecError::TooManyChunks {
                count: batch.chunks.len(),
                max: MAX_NUM_CHUNKS,
            });
        }

        let mut popped_before = batch.total_l1_messages_popped_before;
        let mut chunk_hashes = Vec::with_capacity(32 * batch.chunks.len());
        for chunk in &batch.chunks {
            let da_chunk = DAChunk::new(version, chunk, popped_before)?;
            popped_before += chunk.num_l1_messages(popped_before);
            chunk_hashes.extend_from_slice(da_chunk.hash().as_slice());
        }
        let data_hash = keccak256(&chunk_hashes);

        let (skipped_l1_message_bitmap, total_l1_message_popped) =
            construct_skipped_bitmap(&batch.chunks, batch.total_l1_messages_popped_before)?;

        let (blob, blob_versioned_hash, challenge_point) = match version {
            CodecVersion::V0 => (None, None, None),
            CodecVersion::V1 => {
                let payload = blob::construct_blob_payload(&batch.chunks)?;
                (Some(payload.blob), Some(payload.versioned_hash), Some(payload.challenge_point))
            }
        };

        Ok(Self {
            version,
            index: batch.index,
            l1_message_popped: total_l1_message_popped - batch.total_l1_messages_popped_before,
            total_l1_message_popped,
            data_hash,
            blob_versioned_hash,
            parent_batch_hash: batch.parent_batch_hash,
            skipped_l1_message_bitmap,
            blob,
            challenge_point,
        })
    }

    /// Serializes the batch header followed by the skipped message bitmap.
    pub fn encode(&self) -> Vec<u8> {
        let header_len = match self.version {
            CodecVersion::V0 => HEADER_BYTES_V0,
            CodecVersion::V1 => HEADER_BYTES_V1,
        };
        let mut bytes = Vec::with_capacity(header_len + self.skipped_l1_message_bitmap.len());
        bytes.push(u8::from(self.version));
        bytes.extend_from_slice(&self.index.to_be_bytes());
        bytes.extend_from_slice(&self.l1_message_popped.to_be_bytes());
        bytes.extend_from_slice(&self.total_l1_message_popped.to_be_bytes());
        bytes.extend_from_slice(self.data_hash.as_slice());
        if let Some(blob_versioned_hash) = self.blob_versioned_hash {
            bytes.extend_from_slice(blob_versioned_hash.as_slice());
        }
        bytes.extend_from_slice(self.parent_batch_hash.as_slice());
        bytes.extend_from_slice(&self.skipped_l1_message_bitmap);
        bytes
    }

    /// Computes the batch hash, the identifier used by the rollup contract.
    pub fn hash(&self) -> B256 {
        keccak256(self.encode())
    }

    /// Returns the canonical blob payload, [`None`] for calldata
    /// availability.
    pub fn blob(&self) -> Option<&[u8]> {
        self.blob.as_deref()
    }

    /// Computes the point-evaluation proof the finalize call verifies the
    /// blob with.
    pub fn blob_data_proof(&self) -> Result<Vec<u8>, CodecError> {
        let (blob, challenge_point) = self
            .blob
            .as_deref()
            .zip(self.challenge_point)
            .ok_or(CodecError::MissingBlob(u8::from(self.version)))?;
        blob::point_evaluation_proof(blob, challenge_point)
    }
}

/// Builds the skipped L1 message bitmap over the chunks and returns it with
/// the total number of messages popped after the last chunk. Bit i of the
/// bitmap, counted from the least significant bit of each big-endian 32-byte
/// word, covers queue index `total_l1_messages_popped_before + i`.
fn construct_skipped_bitmap(
    chunks: &[ChunkData],
    total_l1_messages_popped_before: u64,
) -> Result<(Vec<u8>, u64), CodecError> {
    let mut next_index = total_l1_messages_popped_before;
    let mut skipped = Vec::new();

    for chunk in chunks {
        for block in &chunk.blocks {
            for tx in &block.transactions {
                let Some(queue_index) = tx.queue_index else { continue };
                if queue_index < next_index {
                    return Err(CodecError::L1MessageOutOfOrder { queue_index, next_index });
                }
                for skipped_index in next_index..queue_index {
                    skipped.push(skipped_index - total_l1_messages_popped_before);
                }
                next_index = queue_index + 1;
            }
        }
    }

    let popped = next_index - total_l1_messages_popped_before;
    let words = popped.div_ceil(256) as usize;
    let mut bitmap = vec![0u8; words * 32];
    for position in skipped {
        let word = (position / 256) as usize;
        let bit = position % 256;
        // least significant bit first within the big-endian word
        let byte = word * 32 + 31 - (bit / 8) as usize;
        bitmap[byte] |= 1 << (bit % 8);
    }

    Ok((bitmap, next_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollup_relayer_primitives::{L2Block, TransactionData, L1_MESSAGE_TX_TYPE};

    fn chunk_with_queue_indices(indices: &[u64]) -> ChunkData {
        ChunkData::new(vec![L2Block {
            transactions: indices
                .iter()
                .map(|index| TransactionData {
                    tx_type: L1_MESSAGE_TX_TYPE,
                    queue_index: Some(*index),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }])
    }

    #[test]
    fn bitmap_marks_skipped_queue_indices() {
        // indices 0 and 2 are included, 1 and 3 are skipped before 4.
        let chunks = vec![chunk_with_queue_indices(&[0, 2, 4])];
        let (bitmap, popped_after) = construct_skipped_bitmap(&chunks, 0).unwrap();
        assert_eq!(popped_after, 5);
        assert_eq!(bitmap.len(), 32);
        assert_eq!(bitmap[31], 0b0000_1010);
    }

    #[test]
    fn bitmap_positions_are_relative_to_the_batch() {
        let chunks = vec![chunk_with_queue_indices(&[101])];
        let (bitmap, popped_after) = construct_skipped_bitmap(&chunks, 100).unwrap();
        assert_eq!(popped_after, 102);
        // index 100 is skipped, relative position 0.
        assert_eq!(bitmap[31], 0b0000_0001);
    }

    #[test]
    fn out_of_order_queue_index_is_rejected() {
        let chunks = vec![chunk_with_queue_indices(&[5, 3])];
        assert!(matches!(
            construct_skipped_bitmap(&chunks, 0),
            Err(CodecError::L1MessageOutOfOrder { queue_index: 3, next_index: 6 })
        ));
    }

    #[test]
    fn v0_and_v1_headers_differ_by_the_versioned_hash() {
        let batch = BatchData {
            index: 1,
            parent_batch_hash: B256::repeat_byte(0x11),
            total_l1_messages_popped_before: 0,
            chunks: vec![chunk_with_queue_indices(&[])],
        };

        let v0 = DABatch::new(CodecVersion::V0, &batch).unwrap();
        let encoded = v0.encode();
        assert_eq!(encoded.len(), HEADER_BYTES_V0);
        assert_eq!(encoded[0], 0);
        assert_eq!(&encoded[1..9], &1u64.to_be_bytes());
        assert_eq!(&encoded[57..89], B256::repeat_byte(0x11).as_slice());
        assert!(v0.blob().is_none());
        assert!(matches!(v0.blob_data_proof(), Err(CodecError::MissingBlob(0))));

        let v1 = DABatch::new(CodecVersion::V1, &batch).unwrap();
        let encoded = v1.encode();
        assert_eq!(encoded.len(), HEADER_BYTES_V1);
        assert_eq!(encoded[0], 1);
        assert_eq!(&encoded[89..121], B256::repeat_byte(0x11).as_slice());
        assert!(v1.blob().is_some());
    }

    #[test]
    fn batch_hash_commits_to_the_parent() {
        let chunks = vec![chunk_with_queue_indices(&[0])];
        let mut batch = BatchData {
            index: 2,
            parent_batch_hash: B256::repeat_byte(0x22),
            total_l1_messages_popped_before: 0,
            chunks,
        };
        let first = DABatch::new(CodecVersion::V1, &batch).unwrap().hash();
        batch.parent_batch_hash = B256::repeat_byte(0x33);
        let second = DABatch::new(CodecVersion::V1, &batch).unwrap().hash();
        assert_ne!(first, second);
    }

    #[test]
    fn empty_batch_is_rejected() {
        let batch = BatchData::default();
        assert!(matches!(DABatch::new(CodecVersion::V1, &batch), Err(CodecError::EmptyBatch)));
    }
}
