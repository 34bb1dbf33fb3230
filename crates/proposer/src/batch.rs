use crate::{unix_now, BatchProposerMetrics, ProposerError};

use rollup_relayer_codec::{Codec, CodecVersion};
use rollup_relayer_db::{Database, DatabaseOperations};
use rollup_relayer_primitives::{
    BatchData, BatchMetrics, BatchRecord, ChunkData, ChunkRecord, GasOracleStatus, ProvingStatus,
    RollupStatus,
};
use std::sync::Arc;

/// The configuration of the [`BatchProposer`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BatchProposerConfig {
    /// The maximum number of chunks in a batch.
    pub max_chunk_num_per_batch: u64,
    /// The maximum estimated L1 commit gas of a batch.
    pub max_l1_commit_gas_per_batch: u64,
    /// The maximum commit calldata footprint of a batch.
    pub max_l1_commit_calldata_size_per_batch: u64,
    /// The maximum blob payload footprint of a batch.
    pub max_blob_size_per_batch: u64,
    /// The age of the first pending chunk above which a batch is closed.
    pub batch_timeout_sec: u64,
    /// The safety multiplier applied to gas estimates.
    pub gas_cost_increase_multiplier: f64,
}

/// The batch proposer groups contiguous un-batched chunks into batches.
#[derive(Debug)]
pub struct BatchProposer {
    db: Arc<Database>,
    codec: Codec,
    config: BatchProposerConfig,
    metrics: BatchProposerMetrics,
}

impl BatchProposer {
    /// Returns a new [`BatchProposer`].
    pub fn new(db: Arc<Database>, version: CodecVersion, config: BatchProposerConfig) -> Self {
        Self { db, codec: Codec::new(version), config, metrics: BatchProposerMetrics::default() }
    }

    /// Attempts to propose one batch over the pending un-batched chunks.
    ///
    /// Having no pending chunks, or pending chunks that neither fill a batch
    /// nor time out, is a no-op.
    pub async fn try_propose_batch(&self) -> Result<(), ProposerError> {
        let parent =
            self.db.get_latest_batch().await?.ok_or(ProposerError::MissingGenesisBatch)?;
        let chunk_rows =
            self.db.get_unbatched_chunks(self.config.max_chunk_num_per_batch).await?;
        let pending = chunk_rows.len();
        if pending == 0 {
            self.metrics.pending_chunks.set(0.0);
            return Ok(());
        }

        // rebuild the member blocks of each candidate chunk from the store.
        let mut chunk_datas = Vec::with_capacity(pending);
        for row in &chunk_rows {
            let blocks = self
                .db
                .get_l2_blocks_in_range(row.start_block_number, row.end_block_number)
                .await?;
            chunk_datas.push(ChunkData::new(blocks));
        }

        let mut candidate = BatchData {
            index: parent.index + 1,
            parent_batch_hash: parent.hash,
            total_l1_messages_popped_before: chunk_rows[0].total_l1_messages_popped_before,
            chunks: Vec::with_capacity(pending),
        };
        let mut included_metrics: Option<BatchMetrics> = None;
        let mut hit_ceiling = false;
        for (row, chunk) in chunk_rows.iter().zip(chunk_datas) {
            candidate.chunks.push(chunk);
            let metrics = self.codec.batch_metrics(&candidate)?;
            if self.breaches_ceiling(&metrics) {
                if included_metrics.is_none() {
                    tracing::warn!(
                        target: "rollup::proposer",
                        chunk_index = row.index,
                        gas = metrics.l1_commit_gas,
                        calldata = metrics.l1_commit_calldata_size,
                        blob = metrics.l1_commit_blob_size,
                        "chunk exceeds batch ceilings on its own, forcing a one-chunk batch"
                    );
                    self.metrics.force_included.increment(1);
                    included_metrics = Some(metrics);
                } else {
                    candidate.chunks.pop();
                }
                hit_ceiling = true;
                break;
            }
            included_metrics = Some(metrics);
        }
        let Some(batch_metrics) = included_metrics else { return Ok(()) };

        let full = batch_metrics.num_chunks == self.config.max_chunk_num_per_batch;
        let timed_out = unix_now().saturating_sub(batch_metrics.first_block_timestamp) >
            self.config.batch_timeout_sec;
        if !(hit_ceiling || full || timed_out) {
            self.metrics.pending_chunks.set(pending as f64);
            return Ok(());
        }
        if timed_out && !(hit_ceiling || full) {
            tracing::info!(
                target: "rollup::proposer",
                first_block_timestamp = batch_metrics.first_block_timestamp,
                "closing batch on timeout"
            );
            self.metrics.timeout_closes.increment(1);
        }

        let included = candidate.chunks.len();
        self.persist_batch(&parent, candidate, &chunk_rows[..included], &batch_metrics).await
    }

    /// Builds the batch record and persists it together with the membership
    /// stamp on its chunks.
    async fn persist_batch(
        &self,
        parent: &BatchRecord,
        batch: BatchData,
        chunk_rows: &[ChunkRecord],
        batch_metrics: &BatchMetrics,
    ) -> Result<(), ProposerError> {
        let da_batch = self.codec.new_da_batch(&batch)?;
        let blob_data_proof = match da_batch.blob() {
            Some(_) => Some(da_batch.blob_data_proof()?.into()),
            None => None,
        };
        let last_block = batch
            .chunks
            .last()
            .and_then(|chunk| chunk.blocks.last())
            .cloned()
            .unwrap_or_default();
        let start = chunk_rows.first().cloned().unwrap_or_default();
        let end = chunk_rows.last().cloned().unwrap_or_default();

        let record = BatchRecord {
            index: batch.index,
            hash: da_batch.hash(),
            start_chunk_index: start.index,
            start_chunk_hash: start.hash,
            end_chunk_index: end.index,
            end_chunk_hash: end.hash,
            parent_batch_hash: parent.hash,
            codec_version: self.codec.version().into(),
            batch_header: da_batch.encode().into(),
            blob_bytes: da_batch.blob().map(|blob| blob.to_vec().into()),
            blob_data_proof,
            state_root: last_block.header.state_root,
            withdraw_root: last_block.withdraw_root,
            rollup_status: RollupStatus::Pending,
            proving_status: ProvingStatus::Unassigned,
            oracle_status: GasOracleStatus::Pending,
            commit_tx_hash: None,
            finalize_tx_hash: None,
            oracle_tx_hash: None,
            proof: None,
            committed_at: None,
            finalized_at: None,
        };

        let tx = self.db.tx().await?;
        tx.insert_batch(&record).await?;
        tx.set_batch_hash_for_chunks(start.index, end.index, record.hash).await?;
        tx.commit().await?;

        tracing::info!(
            target: "rollup::proposer",
            index = record.index,
            hash = ?record.hash,
            start_chunk = start.index,
            end_chunk = end.index,
            "proposed batch"
        );
        self.metrics.batches_proposed.increment(1);
        self.metrics.batch_l1_commit_gas.set(batch_metrics.l1_commit_gas as f64);
        Ok(())
    }

    fn breaches_ceiling(&self, metrics: &BatchMetrics) -> bool {
        metrics.l1_commit_gas as f64 * self.config.gas_cost_increase_multiplier >
            self.config.max_l1_commit_gas_per_batch as f64 ||
            metrics.l1_commit_calldata_size > self.config.max_l1_commit_calldata_size_per_batch ||
            metrics.l1_commit_blob_size > self.config.max_blob_size_per_batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkProposer, ChunkProposerConfig};
    use alloy_primitives::{B256, U256};
    use rollup_relayer_db::test_utils::setup_test_db;
    use rollup_relayer_primitives::{BlockHeaderInfo, L2Block, RowUsage, TransactionData};

    fn permissive_config() -> BatchProposerConfig {
        BatchProposerConfig {
            max_chunk_num_per_batch: 15,
            max_l1_commit_gas_per_batch: 50_000_000,
            max_l1_commit_calldata_size_per_batch: 1_000_000,
            max_blob_size_per_batch: 131_072,
            batch_timeout_sec: 0,
            gas_cost_increase_multiplier: 1.2,
        }
    }

    fn chunk_config() -> ChunkProposerConfig {
        ChunkProposerConfig {
            max_block_num_per_chunk: 2,
            max_tx_num_per_chunk: 10_000,
            max_l1_commit_gas_per_chunk: 50_000_000,
            max_l1_commit_calldata_size_per_chunk: 1_000_000,
            max_row_consumption_per_chunk: 1_000_000,
            max_blob_size_per_chunk: 131_072,
            chunk_timeout_sec: 0,
            gas_cost_increase_multiplier: 1.2,
        }
    }

    fn block(number: u64) -> L2Block {
        L2Block {
            header: BlockHeaderInfo {
                number,
                hash: B256::random(),
                parent_hash: B256::random(),
                timestamp: 1_000 + number,
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

    /// Seeds genesis rows, six blocks and three two-block chunks.
    async fn seed(db: &Arc<Database>) -> BatchRecord {
        let genesis_chunk = ChunkRecord { index: 0, hash: B256::random(), ..Default::default() };
        let genesis_batch = BatchRecord {
            index: 0,
            hash: B256::random(),
            rollup_status: RollupStatus::Finalized,
            ..Default::default()
        };
        db.insert_chunk(&genesis_chunk).await.unwrap();
        db.insert_batch(&genesis_batch).await.unwrap();
        // genesis chunk is part of the genesis batch.
        db.set_batch_hash_for_chunks(0, 0, genesis_batch.hash).await.unwrap();

        let blocks: Vec<L2Block> = (1..=6).map(block).collect();
        db.insert_l2_blocks(&blocks).await.unwrap();
        let chunk_proposer = ChunkProposer::new(db.clone(), CodecVersion::V1, chunk_config());
        for _ in 0..3 {
            chunk_proposer.try_propose_chunk().await.unwrap();
        }
        genesis_batch
    }

    #[tokio::test]
    async fn test_proposes_batch_over_pending_chunks() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        let genesis = seed(&db).await;

        let proposer = BatchProposer::new(db.clone(), CodecVersion::V1, permissive_config());
        proposer.try_propose_batch().await?;

        let batch = db.get_latest_batch().await?.unwrap();
        assert_eq!(batch.index, 1);
        assert_eq!(batch.start_chunk_index, 1);
        assert_eq!(batch.end_chunk_index, 3);
        assert_eq!(batch.parent_batch_hash, genesis.hash);
        assert_eq!(batch.rollup_status, RollupStatus::Pending);
        // version 1 carries a blob payload and its proof.
        assert!(batch.blob_bytes.is_some());
        assert!(batch.blob_data_proof.is_some());
        assert_eq!(batch.batch_header.len(), 121);

        // all member chunks carry the batch hash.
        assert!(db.get_unbatched_chunks(10).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_waits_for_timeout_when_under_ceilings() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        seed(&db).await;

        let proposer = BatchProposer::new(
            db.clone(),
            CodecVersion::V1,
            BatchProposerConfig { batch_timeout_sec: u64::MAX, ..permissive_config() },
        );
        proposer.try_propose_batch().await?;

        // three chunks under every ceiling stay pending.
        assert_eq!(db.get_latest_batch().await?.unwrap().index, 0);
        assert_eq!(db.get_unbatched_chunks(10).await?.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_no_pending_chunks_is_a_noop() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        let genesis_batch = BatchRecord { index: 0, hash: B256::random(), ..Default::default() };
        db.insert_batch(&genesis_batch).await?;

        let proposer = BatchProposer::new(db.clone(), CodecVersion::V1, permissive_config());
        proposer.try_propose_batch().await?;

        assert_eq!(db.get_latest_batch().await?.unwrap().index, 0);

        Ok(())
    }
}
