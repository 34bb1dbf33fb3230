use crate::{unix_now, ChunkProposerMetrics, ProposerError};

use rollup_relayer_codec::{Codec, CodecVersion};
use rollup_relayer_db::{Database, DatabaseOperations};
use rollup_relayer_primitives::{ChunkData, ChunkMetrics, ChunkRecord, ProvingStatus};
use std::sync::Arc;

/// The configuration of the [`ChunkProposer`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChunkProposerConfig {
    /// The maximum number of blocks in a chunk.
    pub max_block_num_per_chunk: u64,
    /// The maximum number of transactions in a chunk.
    pub max_tx_num_per_chunk: u64,
    /// The maximum estimated L1 commit gas of a chunk.
    pub max_l1_commit_gas_per_chunk: u64,
    /// The maximum commit calldata footprint of a chunk.
    pub max_l1_commit_calldata_size_per_chunk: u64,
    /// The maximum circuit row consumption of a chunk.
    pub max_row_consumption_per_chunk: u64,
    /// The maximum blob payload footprint of a chunk.
    pub max_blob_size_per_chunk: u64,
    /// The age of the first pending block above which a chunk is closed.
    pub chunk_timeout_sec: u64,
    /// The safety multiplier applied to gas estimates.
    pub gas_cost_increase_multiplier: f64,
}

/// The chunk proposer groups contiguous un-chunked L2 blocks into chunks.
#[derive(Debug)]
pub struct ChunkProposer {
    db: Arc<Database>,
    codec: Codec,
    config: ChunkProposerConfig,
    metrics: ChunkProposerMetrics,
}

impl ChunkProposer {
    /// Returns a new [`ChunkProposer`].
    pub fn new(db: Arc<Database>, version: CodecVersion, config: ChunkProposerConfig) -> Self {
        Self { db, codec: Codec::new(version), config, metrics: ChunkProposerMetrics::default() }
    }

    /// Attempts to propose one chunk over the pending un-chunked blocks.
    ///
    /// Having no pending blocks, or pending blocks that neither fill a chunk
    /// nor time out, is a no-op.
    pub async fn try_propose_chunk(&self) -> Result<(), ProposerError> {
        let parent =
            self.db.get_latest_chunk().await?.ok_or(ProposerError::MissingGenesisChunk)?;
        let blocks =
            self.db.get_unchunked_blocks(self.config.max_block_num_per_chunk).await?;
        let pending = blocks.len();
        if pending == 0 {
            self.metrics.pending_blocks.set(0.0);
            return Ok(());
        }

        // include-then-check: stop before the block that breaches a ceiling.
        let mut candidate = ChunkData::new(Vec::with_capacity(pending));
        let mut included_metrics: Option<ChunkMetrics> = None;
        let mut hit_ceiling = false;
        let mut forced = false;
        for block in blocks {
            let number = block.header.number;
            candidate.blocks.push(block);
            let metrics = self.codec.chunk_metrics(&candidate)?;
            if self.breaches_ceiling(&metrics) {
                if included_metrics.is_none() {
                    tracing::warn!(
                        target: "rollup::proposer",
                        number,
                        gas = metrics.l1_commit_gas,
                        calldata = metrics.l1_commit_calldata_size,
                        rows = metrics.crc_max,
                        "block exceeds chunk ceilings on its own, forcing a one-block chunk"
                    );
                    self.metrics.force_included.increment(1);
                    included_metrics = Some(metrics);
                    forced = true;
                } else {
                    candidate.blocks.pop();
                }
                hit_ceiling = true;
                break;
            }
            included_metrics = Some(metrics);
        }
        let Some(chunk_metrics) = included_metrics else { return Ok(()) };

        let full = chunk_metrics.num_blocks == self.config.max_block_num_per_chunk;
        let timed_out = unix_now().saturating_sub(chunk_metrics.first_block_timestamp) >
            self.config.chunk_timeout_sec;
        if !(hit_ceiling || forced || full || timed_out) {
            self.metrics.pending_blocks.set(pending as f64);
            return Ok(());
        }
        if timed_out && !(hit_ceiling || full) {
            tracing::info!(
                target: "rollup::proposer",
                first_block_timestamp = chunk_metrics.first_block_timestamp,
                "closing chunk on timeout"
            );
            self.metrics.timeout_closes.increment(1);
        }

        self.persist_chunk(&parent, candidate, &chunk_metrics).await
    }

    /// Builds the chunk record and persists it together with the membership
    /// stamp on its blocks.
    async fn persist_chunk(
        &self,
        parent: &ChunkRecord,
        chunk: ChunkData,
        chunk_metrics: &ChunkMetrics,
    ) -> Result<(), ProposerError> {
        let popped_before =
            parent.total_l1_messages_popped_before + parent.total_l1_messages_popped_in_chunk;
        let da_chunk = self.codec.new_da_chunk(&chunk, popped_before)?;
        let start_block_number =
            chunk.blocks.first().map(|block| block.header.number).unwrap_or_default();
        let end_block_number =
            chunk.blocks.last().map(|block| block.header.number).unwrap_or_default();

        let record = ChunkRecord {
            index: parent.index + 1,
            hash: da_chunk.hash(),
            start_block_number,
            end_block_number,
            total_l1_messages_popped_before: popped_before,
            total_l1_messages_popped_in_chunk: chunk.num_l1_messages(popped_before),
            start_block_timestamp: chunk_metrics.first_block_timestamp,
            tx_num: chunk_metrics.tx_num,
            max_row_consumption: chunk_metrics.crc_max,
            l1_commit_gas: chunk_metrics.l1_commit_gas,
            l1_commit_calldata_size: chunk_metrics.l1_commit_calldata_size,
            l1_commit_blob_size: chunk_metrics.l1_commit_blob_size,
            parent_chunk_hash: parent.hash,
            codec_version: self.codec.version().into(),
            proving_status: ProvingStatus::Unassigned,
            batch_hash: None,
        };

        let tx = self.db.tx().await?;
        tx.insert_chunk(&record).await?;
        tx.set_chunk_hash_for_blocks(start_block_number, end_block_number, record.hash).await?;
        tx.commit().await?;

        tracing::info!(
            target: "rollup::proposer",
            index = record.index,
            hash = ?record.hash,
            start = start_block_number,
            end = end_block_number,
            "proposed chunk"
        );
        self.metrics.chunks_proposed.increment(1);
        self.metrics.chunk_l1_commit_gas.set(record.l1_commit_gas as f64);
        Ok(())
    }

    fn breaches_ceiling(&self, metrics: &ChunkMetrics) -> bool {
        metrics.tx_num > self.config.max_tx_num_per_chunk ||
            metrics.l1_commit_gas as f64 * self.config.gas_cost_increase_multiplier >
                self.config.max_l1_commit_gas_per_chunk as f64 ||
            metrics.l1_commit_calldata_size > self.config.max_l1_commit_calldata_size_per_chunk ||
            metrics.crc_max > self.config.max_row_consumption_per_chunk ||
            metrics.l1_commit_blob_size > self.config.max_blob_size_per_chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, U256};
    use rollup_relayer_db::test_utils::setup_test_db;
    use rollup_relayer_primitives::{BlockHeaderInfo, L2Block, RowUsage, TransactionData};

    fn permissive_config() -> ChunkProposerConfig {
        ChunkProposerConfig {
            max_block_num_per_chunk: 100,
            max_tx_num_per_chunk: 10_000,
            max_l1_commit_gas_per_chunk: 50_000_000,
            max_l1_commit_calldata_size_per_chunk: 1_000_000,
            max_row_consumption_per_chunk: 1_000_000,
            max_blob_size_per_chunk: 131_072,
            chunk_timeout_sec: 0,
            gas_cost_increase_multiplier: 1.2,
        }
    }

    fn block(number: u64, timestamp: u64) -> L2Block {
        L2Block {
            header: BlockHeaderInfo {
                number,
                hash: B256::random(),
                parent_hash: B256::random(),
                timestamp,
                base_fee: Some(U256::from(1_000_000_000u64)),
                gas_limit: 10_000_000,
                state_root: B256::random(),
            },
            transactions: vec![TransactionData {
                tx_type: 2,
                tx_hash: B256::random(),
                queue_index: None,
                payload: vec![0xab; 64].into(),
            }],
            withdraw_root: B256::random(),
            row_consumption: vec![RowUsage { name: "evm".into(), row_number: 500 }],
        }
    }

    fn genesis_chunk() -> ChunkRecord {
        ChunkRecord { index: 0, hash: B256::random(), ..Default::default() }
    }

    async fn seed(db: &Database, blocks: &[L2Block]) -> ChunkRecord {
        let genesis = genesis_chunk();
        db.insert_chunk(&genesis).await.unwrap();
        db.insert_l2_blocks(blocks).await.unwrap();
        genesis
    }

    #[tokio::test]
    async fn test_proposes_contiguous_chunk() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        let blocks: Vec<L2Block> = (1..=5).map(|number| block(number, 1_000)).collect();
        let genesis = seed(&db, &blocks).await;

        // timeout of zero closes the chunk immediately.
        let proposer = ChunkProposer::new(db.clone(), CodecVersion::V1, permissive_config());
        proposer.try_propose_chunk().await?;

        let chunk = db.get_latest_chunk().await?.unwrap();
        assert_eq!(chunk.index, 1);
        assert_eq!(chunk.start_block_number, 1);
        assert_eq!(chunk.end_block_number, 5);
        assert_eq!(chunk.tx_num, 5);
        assert_eq!(chunk.parent_chunk_hash, genesis.hash);
        assert_eq!(chunk.max_row_consumption, 500);

        // all member blocks carry the chunk hash.
        assert!(db.get_unchunked_blocks(10).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_ceiling_stops_before_breaching_block() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        let blocks: Vec<L2Block> = (1..=5).map(|number| block(number, 1_000)).collect();
        seed(&db, &blocks).await;

        let proposer = ChunkProposer::new(
            db.clone(),
            CodecVersion::V1,
            ChunkProposerConfig { max_tx_num_per_chunk: 3, ..permissive_config() },
        );
        proposer.try_propose_chunk().await?;

        let chunk = db.get_latest_chunk().await?.unwrap();
        assert_eq!(chunk.start_block_number, 1);
        assert_eq!(chunk.end_block_number, 3);

        // the next proposal picks up exactly where the previous one stopped.
        proposer.try_propose_chunk().await?;
        let chunk = db.get_latest_chunk().await?.unwrap();
        assert_eq!(chunk.index, 2);
        assert_eq!(chunk.start_block_number, 4);
        assert_eq!(chunk.end_block_number, 5);

        Ok(())
    }

    #[tokio::test]
    async fn test_oversized_first_block_is_force_included() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        let blocks: Vec<L2Block> = (1..=3).map(|number| block(number, 1_000)).collect();
        seed(&db, &blocks).await;

        // every single block breaches the row ceiling on its own.
        let proposer = ChunkProposer::new(
            db.clone(),
            CodecVersion::V1,
            ChunkProposerConfig { max_row_consumption_per_chunk: 100, ..permissive_config() },
        );
        proposer.try_propose_chunk().await?;

        let chunk = db.get_latest_chunk().await?.unwrap();
        assert_eq!(chunk.start_block_number, 1);
        assert_eq!(chunk.end_block_number, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_waits_for_timeout_when_under_ceilings() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        let blocks = vec![block(1, unix_now())];
        seed(&db, &blocks).await;

        let proposer = ChunkProposer::new(
            db.clone(),
            CodecVersion::V1,
            ChunkProposerConfig { chunk_timeout_sec: 3_600, ..permissive_config() },
        );
        proposer.try_propose_chunk().await?;

        // one fresh block under every ceiling stays pending.
        let chunk = db.get_latest_chunk().await?.unwrap();
        assert_eq!(chunk.index, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_timeout_closes_partial_chunk() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        // a single old block, far under every ceiling.
        let blocks = vec![block(1, 1_000)];
        seed(&db, &blocks).await;

        let proposer = ChunkProposer::new(
            db.clone(),
            CodecVersion::V1,
            ChunkProposerConfig { chunk_timeout_sec: 60, ..permissive_config() },
        );
        proposer.try_propose_chunk().await?;

        let chunk = db.get_latest_chunk().await?.unwrap();
        assert_eq!(chunk.index, 1);
        assert_eq!(chunk.end_block_number, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_no_pending_blocks_is_a_noop() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        db.insert_chunk(&genesis_chunk()).await?;

        let proposer = ChunkProposer::new(db.clone(), CodecVersion::V1, permissive_config());
        proposer.try_propose_chunk().await?;

        assert_eq!(db.get_latest_chunk().await?.unwrap().index, 0);

        Ok(())
    }
}
