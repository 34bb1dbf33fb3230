use metrics::{Counter, Gauge};
use metrics_derive::Metrics;

/// The metrics for the [`super::ChunkProposer`].
#[derive(Metrics)]
#[metrics(scope = "chunk_proposer")]
pub struct ChunkProposerMetrics {
    /// A counter on the chunks proposed.
    pub chunks_proposed: Counter,
    /// A counter on the oversized blocks force-included alone.
    pub force_included: Counter,
    /// A counter on the chunks closed by timeout.
    pub timeout_closes: Counter,
    /// The number of un-chunked blocks left pending.
    pub pending_blocks: Gauge,
    /// The estimated L1 commit gas of the last proposed chunk.
    pub chunk_l1_commit_gas: Gauge,
}

/// The metrics for the [`super::BatchProposer`].
#[derive(Metrics)]
#[metrics(scope = "batch_proposer")]
pub struct BatchProposerMetrics {
    /// A counter on the batches proposed.
    pub batches_proposed: Counter,
    /// A counter on the oversized chunks force-included alone.
    pub force_included: Counter,
    /// A counter on the batches closed by timeout.
    pub timeout_closes: Counter,
    /// The number of un-batched chunks left pending.
    pub pending_chunks: Gauge,
    /// The estimated L1 commit gas of the last proposed batch.
    pub batch_l1_commit_gas: Gauge,
}
