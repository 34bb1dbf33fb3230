//! Versioned encoding of chunks and batches for L1 data availability.
//!
//! Version 0 publishes transaction payloads in commit calldata, version 1
//! moves them into an EIP-4844 blob and commits only block contexts. The
//! version is chosen once when a chunk or batch is created and stored with
//! the record, it is never re-derived from chain state.

mod batch;
mod blob;
mod block;
mod chunk;
mod error;
mod estimation;

pub use batch::DABatch;
pub use block::DABlock;
pub use chunk::DAChunk;
pub use error::CodecError;

use rollup_relayer_primitives::{BatchData, BatchMetrics, ChunkData, ChunkMetrics};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The maximum number of chunks the batch encoding supports.
pub const MAX_NUM_CHUNKS: usize = 15;

/// The version of the encoding in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecVersion {
    /// Calldata data availability: transaction payloads are part of the
    /// commit calldata.
    V0,
    /// Blob data availability: transaction payloads are carried in an
    /// EIP-4844 blob.
    V1,
}

impl From<CodecVersion> for u8 {
    fn from(version: CodecVersion) -> Self {
        match version {
            CodecVersion::V0 => 0,
            CodecVersion::V1 => 1,
        }
    }
}

impl TryFrom<u8> for CodecVersion {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::V0),
            1 => Ok(Self::V1),
            _ => Err(CodecError::UnknownVersion(value)),
        }
    }
}

impl fmt::Display for CodecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", u8::from(*self))
    }
}

/// The version-dispatched encoder for chunks and batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    version: CodecVersion,
}

impl Codec {
    /// Returns a codec for the given version.
    pub const fn new(version: CodecVersion) -> Self {
        Self { version }
    }

    /// Returns the codec version.
    pub const fn version(&self) -> CodecVersion {
        self.version
    }

    /// Builds the data availability form of a chunk.
    pub fn new_da_chunk(
        &self,
        chunk: &ChunkData,
        total_l1_messages_popped_before: u64,
    ) -> Result<DAChunk, CodecError> {
        DAChunk::new(self.version, chunk, total_l1_messages_popped_before)
    }

    /// Builds the data availability form of a batch, including the blob
    /// payload and challenge point for version 1.
    pub fn new_da_batch(&self, batch: &BatchData) -> Result<DABatch, CodecError> {
        DABatch::new(self.version, batch)
    }

    /// Approximates the L1 gas needed to commit the chunk.
    pub fn estimate_chunk_l1_commit_gas(&self, chunk: &ChunkData) -> u64 {
        estimation::chunk_l1_commit_gas(self.version, chunk)
    }

    /// Returns the calldata footprint of the chunk in a commit transaction.
    pub fn estimate_chunk_l1_commit_calldata_size(&self, chunk: &ChunkData) -> u64 {
        estimation::chunk_l1_commit_calldata_size(self.version, chunk)
    }

    /// Returns the padded blob footprint of the chunk, zero for version 0.
    pub fn estimate_chunk_l1_commit_blob_size(&self, chunk: &ChunkData) -> u64 {
        estimation::chunk_l1_commit_blob_size(self.version, chunk)
    }

    /// Approximates the L1 gas needed to commit the batch.
    pub fn estimate_batch_l1_commit_gas(&self, batch: &BatchData) -> u64 {
        estimation::batch_l1_commit_gas(self.version, batch)
    }

    /// Returns the calldata footprint of the batch in a commit transaction.
    pub fn estimate_batch_l1_commit_calldata_size(&self, batch: &BatchData) -> u64 {
        estimation::batch_l1_commit_calldata_size(self.version, batch)
    }

    /// Returns the padded blob footprint of the batch, zero for version 0.
    pub fn estimate_batch_l1_commit_blob_size(&self, batch: &BatchData) -> u64 {
        estimation::batch_l1_commit_blob_size(self.version, batch)
    }

    /// Computes the resource metrics of a candidate chunk.
    pub fn chunk_metrics(&self, chunk: &ChunkData) -> Result<ChunkMetrics, CodecError> {
        let first = chunk.blocks.first().ok_or(CodecError::EmptyChunk)?;
        Ok(ChunkMetrics {
            num_blocks: chunk.blocks.len() as u64,
            tx_num: chunk.num_transactions(),
            crc_max: chunk.crc_max(),
            first_block_timestamp: first.header.timestamp,
            l1_commit_gas: self.estimate_chunk_l1_commit_gas(chunk),
            l1_commit_calldata_size: self.estimate_chunk_l1_commit_calldata_size(chunk),
            l1_commit_blob_size: self.estimate_chunk_l1_commit_blob_size(chunk),
        })
    }

    /// Computes the resource metrics of a candidate batch.
    pub fn batch_metrics(&self, batch: &BatchData) -> Result<BatchMetrics, CodecError> {
        let first_chunk = batch.chunks.first().ok_or(CodecError::EmptyBatch)?;
        let first_block = first_chunk.blocks.first().ok_or(CodecError::EmptyChunk)?;
        Ok(BatchMetrics {
            num_chunks: batch.chunks.len() as u64,
            first_block_timestamp: first_block.header.timestamp,
            l1_commit_gas: self.estimate_batch_l1_commit_gas(batch),
            l1_commit_calldata_size: self.estimate_batch_l1_commit_calldata_size(batch),
            l1_commit_blob_size: self.estimate_batch_l1_commit_blob_size(batch),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_version_roundtrips_through_u8() {
        assert_eq!(CodecVersion::try_from(0u8).unwrap(), CodecVersion::V0);
        assert_eq!(CodecVersion::try_from(1u8).unwrap(), CodecVersion::V1);
        assert!(CodecVersion::try_from(2u8).is_err());
        assert_eq!(u8::from(CodecVersion::V1), 1);
        assert_eq!(CodecVersion::V1.to_string(), "v1");
    }

    #[test]
    fn codec_version_deserializes_from_config_strings() {
        assert_eq!(serde_json::from_str::<CodecVersion>("\"v1\"").unwrap(), CodecVersion::V1);
    }
}
