/// Errors raised while encoding chunks and batches.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The version byte does not name a supported codec.
    #[error("unknown codec version: {0}")]
    UnknownVersion(u8),
    /// A chunk must contain at least one block.
    #[error("chunk contains no blocks")]
    EmptyChunk,
    /// A batch must contain at least one chunk.
    #[error("batch contains no chunks")]
    EmptyBatch,
    /// The one-byte block count field bounds the chunk encoding.
    #[error("chunk contains {count} blocks, the encoding supports at most {max}")]
    TooManyBlocks {
        /// The number of blocks in the chunk.
        count: usize,
        /// The maximum the encoding supports.
        max: usize,
    },
    /// The fixed-size blob metadata bounds the batch encoding.
    #[error("batch contains {count} chunks, the encoding supports at most {max}")]
    TooManyChunks {
        /// The number of chunks in the batch.
        count: usize,
        /// The maximum the encoding supports.
        max: usize,
    },
    /// The block context stores the popped message count as a u16.
    #[error("block {block} pops {count} L1 messages, exceeding the u16 context field")]
    TooManyL1Messages {
        /// The block number.
        block: u64,
        /// The number of popped messages.
        count: u64,
    },
    /// The block context stores the transaction count as a u16.
    #[error("block {block} holds {count} transactions, exceeding the u16 context field")]
    TooManyTransactions {
        /// The block number.
        block: u64,
        /// The number of transactions.
        count: u64,
    },
    /// L1 messages must appear in strictly increasing queue order.
    #[error("L1 message queue index {queue_index} is below the next expected index {next_index}")]
    L1MessageOutOfOrder {
        /// The offending queue index.
        queue_index: u64,
        /// The lowest queue index still admissible.
        next_index: u64,
    },
    /// The raw payload does not fit the usable bytes of one blob.
    #[error("blob payload of {size} bytes exceeds the {max} byte capacity")]
    OversizedBlobPayload {
        /// The raw payload size.
        size: usize,
        /// The usable blob capacity.
        max: usize,
    },
    /// A blob operation was requested on a calldata-availability batch.
    #[error("codec version {0} carries no blob")]
    MissingBlob(u8),
    /// KZG commitment or proof computation failed.
    #[error(transparent)]
    Kzg(#[from] c_kzg::Error),
}
