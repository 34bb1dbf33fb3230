use crate::{
    deviates, unix_now, Confirmation, Layer2RelayerMetrics, RelayerError, TransactionSender,
    TxContext,
};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use rollup_relayer_codec::{Codec, CodecVersion};
use rollup_relayer_db::{Database, DatabaseOperations};
use rollup_relayer_l1::{
    commitBatchCall, finalizeBatchWithProof4844Call, importGenesisBatchCall, setL2BaseFeeCall,
};
use rollup_relayer_primitives::{
    BatchData, BatchRecord, ChunkData, ChunkRecord, GasOracleStatus, L2Block, ProvingStatus,
    RollupStatus,
};
use rollup_relayer_watcher::ChainReader;
use std::sync::{Arc, Mutex};

/// The number of pending batches committed per processing pass.
const COMMIT_BATCH_FETCH_LIMIT: u64 = 5;

/// The configuration for the [`Layer2Relayer`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Layer2RelayerConfig {
    /// The address of the rollup contract on L1.
    pub rollup_contract_address: Address,
    /// The address of the L2 gas price oracle contract on L1.
    pub gas_price_oracle_address: Address,
    /// The floor applied to the relayed gas price, in wei.
    pub min_gas_price: u128,
    /// The minimum deviation from the last relayed gas price, in parts per
    /// thousand, below which an update is skipped.
    pub gas_price_diff: u64,
    /// When set, a committed batch whose proof has not arrived within this
    /// many seconds is finalized without one. Test environments only.
    pub finalize_without_proof_after_sec: Option<u64>,
}

/// The L2 side of the relayer: commits proposed batches to the rollup
/// contract, finalizes them once proven, and relays the L2 gas price to L1.
///
/// The relayer never marks a batch `Committed` or `Finalized` itself; those
/// transitions come from the rollup contract events the L1 watcher applies.
#[derive(Debug)]
pub struct Layer2Relayer<R, S> {
    db: Arc<Database>,
    reader: R,
    sender: S,
    config: Layer2RelayerConfig,
    last_gas_price: Mutex<Option<u128>>,
    metrics: Layer2RelayerMetrics,
}

impl<R: ChainReader, S: TransactionSender> Layer2Relayer<R, S> {
    /// Returns a new relayer over the database, L2 reader and L1 sender.
    pub fn new(db: Arc<Database>, reader: R, sender: S, config: Layer2RelayerConfig) -> Self {
        Self {
            db,
            reader,
            sender,
            config,
            last_gas_price: Mutex::new(None),
            metrics: Layer2RelayerMetrics::default(),
        }
    }

    /// Imports the L2 genesis header as chunk 0 and batch 0 and submits it to
    /// the rollup contract. A no-op once the batch table holds any row.
    pub async fn import_genesis(&self, genesis: &L2Block) -> Result<(), RelayerError> {
        if self.db.get_latest_batch().await?.is_some() {
            return Ok(());
        }

        let codec = Codec::new(CodecVersion::V0);
        let chunk_data = ChunkData::new(vec![genesis.clone()]);
        let da_chunk = codec.new_da_chunk(&chunk_data, 0)?;
        let batch_data = BatchData {
            index: 0,
            parent_batch_hash: B256::ZERO,
            total_l1_messages_popped_before: 0,
            chunks: vec![chunk_data],
        };
        let da_batch = codec.new_da_batch(&batch_data)?;
        let batch_hash = da_batch.hash();

        let chunk = ChunkRecord {
            index: 0,
            hash: da_chunk.hash(),
            start_block_number: genesis.header.number,
            end_block_number: genesis.header.number,
            start_block_timestamp: genesis.header.timestamp,
            codec_version: CodecVersion::V0.into(),
            proving_status: ProvingStatus::Verified,
            batch_hash: Some(batch_hash),
            ..Default::default()
        };
        let batch = BatchRecord {
            index: 0,
            hash: batch_hash,
            start_chunk_index: 0,
            start_chunk_hash: chunk.hash,
            end_chunk_index: 0,
            end_chunk_hash: chunk.hash,
            parent_batch_hash: B256::ZERO,
            codec_version: CodecVersion::V0.into(),
            batch_header: da_batch.encode().into(),
            state_root: genesis.header.state_root,
            rollup_status: RollupStatus::Finalized,
            proving_status: ProvingStatus::Verified,
            oracle_status: GasOracleStatus::Imported,
            ..Default::default()
        };

        let calldata = importGenesisBatchCall {
            batch_header: batch.batch_header.clone(),
            state_root: genesis.header.state_root,
        }
        .abi_encode();

        let tx = self.db.tx().await?;
        tx.insert_chunk(&chunk).await?;
        tx.insert_batch(&batch).await?;
        self.sender
            .send_transaction(
                TxContext::GenesisImport(batch_hash),
                self.config.rollup_contract_address,
                calldata.into(),
                None,
            )
            .await?;
        tx.commit().await?;

        tracing::info!(
            target: "rollup::relayer",
            hash = ?batch_hash,
            state_root = ?genesis.header.state_root,
            "imported genesis batch"
        );
        Ok(())
    }

    /// Relays the suggested L2 gas price for the newest oracle-pending batch,
    /// unless it stays within the configured deviation band.
    pub async fn process_gas_price_oracle(&self) -> Result<(), RelayerError> {
        let Some(batch) = self.db.get_latest_oracle_pending_batch().await? else {
            return Ok(());
        };

        let gas_price = self.reader.suggest_gas_price().await?.max(self.config.min_gas_price);
        let last = *self.last_gas_price.lock().expect("lock poisoned");
        if let Some(last) = last {
            if !deviates(gas_price, last, self.config.gas_price_diff) {
                tracing::debug!(
                    target: "rollup::relayer",
                    batch_index = batch.index,
                    gas_price,
                    last,
                    "gas price within deviation band, skipping oracle update"
                );
                return Ok(());
            }
        }

        let calldata = setL2BaseFeeCall { new_base_fee: U256::from(gas_price) }.abi_encode();
        let tx_hash = self
            .sender
            .send_transaction(
                TxContext::L2GasOracle(batch.hash),
                self.config.gas_price_oracle_address,
                calldata.into(),
                None,
            )
            .await?;

        if self.db.set_batch_oracle_importing(batch.hash, tx_hash).await? {
            *self.last_gas_price.lock().expect("lock poisoned") = Some(gas_price);
            self.metrics.oracle_updates.increment(1);
            tracing::info!(
                target: "rollup::relayer",
                batch_index = batch.index,
                gas_price,
                %tx_hash,
                "L2 gas price update submitted"
            );
        }

        Ok(())
    }

    /// Commits the pending batches, oldest first, including the batches whose
    /// previous commit submission failed.
    pub async fn process_pending_batches(&self) -> Result<(), RelayerError> {
        let batches = self
            .db
            .get_batches_by_rollup_status(
                &[RollupStatus::Pending, RollupStatus::CommitFailed],
                COMMIT_BATCH_FETCH_LIMIT,
            )
            .await?;
        for batch in &batches {
            self.commit_batch(batch).await?;
        }
        Ok(())
    }

    /// Finalizes the earliest committed batch once its proof is verified,
    /// including the batch whose previous finalize submission failed.
    ///
    /// A missing proof is not an error: the batch stays committed until the
    /// proving pipeline delivers, or until the proofless finalization timeout
    /// elapses when one is configured.
    pub async fn process_committed_batches(&self) -> Result<(), RelayerError> {
        let batches = self
            .db
            .get_batches_by_rollup_status(
                &[RollupStatus::Committed, RollupStatus::FinalizeFailed],
                1,
            )
            .await?;
        let Some(batch) = batches.into_iter().next() else {
            return Ok(());
        };

        match batch.proving_status {
            ProvingStatus::Verified => self.finalize_batch(&batch).await,
            ProvingStatus::Failed => {
                tracing::error!(
                    target: "rollup::relayer",
                    index = batch.index,
                    hash = ?batch.hash,
                    "batch proving failed, manual intervention required"
                );
                Ok(())
            }
            _ => {
                let Some(timeout) = self.config.finalize_without_proof_after_sec else {
                    return Ok(());
                };
                let committed_at = batch.committed_at.unwrap_or_default();
                if unix_now().saturating_sub(committed_at) <= timeout {
                    return Ok(());
                }
                tracing::warn!(
                    target: "rollup::relayer",
                    index = batch.index,
                    hash = ?batch.hash,
                    "no proof within the timeout, finalizing without one"
                );
                self.db.update_batch_proving_status(batch.hash, ProvingStatus::Verified).await?;
                self.finalize_batch(&batch).await
            }
        }
    }

    /// Records failed submissions and settles oracle statuses. Confirmations
    /// for contexts this relayer does not own are ignored.
    pub async fn handle_confirmation(
        &self,
        confirmation: Confirmation,
    ) -> Result<(), RelayerError> {
        match confirmation.context {
            TxContext::Commit(hash) => {
                if confirmation.success {
                    tracing::debug!(
                        target: "rollup::relayer",
                        batch_hash = ?hash,
                        tx_hash = %confirmation.tx_hash,
                        "commit confirmed, awaiting the rollup contract event"
                    );
                } else {
                    self.metrics.commit_failures.increment(1);
                    tracing::error!(
                        target: "rollup::relayer",
                        batch_hash = ?hash,
                        tx_hash = %confirmation.tx_hash,
                        "batch commit failed"
                    );
                    self.db.set_batch_commit_failed(hash).await?;
                }
            }
            TxContext::Finalize(hash) => {
                if !confirmation.success {
                    self.metrics.finalize_failures.increment(1);
                    tracing::error!(
                        target: "rollup::relayer",
                        batch_hash = ?hash,
                        tx_hash = %confirmation.tx_hash,
                        "batch finalization failed"
                    );
                    self.db.set_batch_finalize_failed(hash).await?;
                }
            }
            TxContext::L2GasOracle(hash) => {
                if !confirmation.success {
                    tracing::error!(
                        target: "rollup::relayer",
                        batch_hash = ?hash,
                        tx_hash = %confirmation.tx_hash,
                        "L2 gas price update failed"
                    );
                }
                self.db.set_batch_oracle_terminal(hash, confirmation.success).await?;
            }
            TxContext::GenesisImport(hash) => {
                if confirmation.success {
                    tracing::info!(target: "rollup::relayer", batch_hash = ?hash, "genesis batch imported on L1");
                } else {
                    tracing::error!(target: "rollup::relayer", batch_hash = ?hash, "genesis batch import failed");
                }
            }
            TxContext::L1GasOracle(_) => {}
        }
        Ok(())
    }

    /// Rebuilds the batch payload from the store and submits the commit
    /// transaction. The status moves to `Committing` only after a successful
    /// submission.
    async fn commit_batch(&self, batch: &BatchRecord) -> Result<(), RelayerError> {
        let Some(parent_index) = batch.index.checked_sub(1) else {
            return Ok(());
        };
        let parent = self
            .db
            .get_batch_by_index(parent_index)
            .await?
            .ok_or(RelayerError::MissingBatch(parent_index))?;
        let codec = Codec::new(CodecVersion::try_from(batch.codec_version)?);

        let chunk_rows =
            self.db.get_chunks_in_range(batch.start_chunk_index, batch.end_chunk_index).await?;
        let mut chunks = Vec::with_capacity(chunk_rows.len());
        for row in &chunk_rows {
            let blocks = self
                .db
                .get_l2_blocks_in_range(row.start_block_number, row.end_block_number)
                .await?;
            chunks.push(ChunkData::new(blocks));
        }
        let batch_data = BatchData {
            index: batch.index,
            parent_batch_hash: batch.parent_batch_hash,
            total_l1_messages_popped_before: chunk_rows
                .first()
                .map(|row| row.total_l1_messages_popped_before)
                .unwrap_or_default(),
            chunks,
        };
        let da_batch = codec.new_da_batch(&batch_data)?;

        let mut encoded_chunks: Vec<Bytes> = Vec::with_capacity(batch_data.chunks.len());
        let mut popped_before = batch_data.total_l1_messages_popped_before;
        for chunk in &batch_data.chunks {
            let da_chunk = codec.new_da_chunk(chunk, popped_before)?;
            popped_before += chunk.num_l1_messages(popped_before);
            encoded_chunks.push(da_chunk.encode().into());
        }

        let calldata = commitBatchCall {
            version: batch.codec_version,
            parent_batch_header: parent.batch_header.clone(),
            chunks: encoded_chunks,
            skipped_l1_message_bitmap: da_batch.skipped_l1_message_bitmap.clone().into(),
        }
        .abi_encode();

        let tx_hash = self
            .sender
            .send_transaction(
                TxContext::Commit(batch.hash),
                self.config.rollup_contract_address,
                calldata.into(),
                da_batch.blob(),
            )
            .await?;

        if self.db.set_batch_committing(batch.hash, tx_hash).await? {
            self.metrics.commits_sent.increment(1);
            tracing::info!(
                target: "rollup::relayer",
                index = batch.index,
                hash = ?batch.hash,
                %tx_hash,
                "batch commit submitted"
            );
        }
        Ok(())
    }

    /// Submits the finalize transaction of a committed batch, with the blob
    /// point-evaluation proof and the aggregated proof from the store.
    async fn finalize_batch(&self, batch: &BatchRecord) -> Result<(), RelayerError> {
        let Some(parent_index) = batch.index.checked_sub(1) else {
            return Ok(());
        };
        let parent = self
            .db
            .get_batch_by_index(parent_index)
            .await?
            .ok_or(RelayerError::MissingBatch(parent_index))?;

        let calldata = finalizeBatchWithProof4844Call {
            batch_header: batch.batch_header.clone(),
            prev_state_root: parent.state_root,
            post_state_root: batch.state_root,
            withdraw_root: batch.withdraw_root,
            blob_data_proof: batch.blob_data_proof.clone().unwrap_or_default(),
            aggr_proof: batch.proof.clone().unwrap_or_default(),
        }
        .abi_encode();

        let tx_hash = self
            .sender
            .send_transaction(
                TxContext::Finalize(batch.hash),
                self.config.rollup_contract_address,
                calldata.into(),
                None,
            )
            .await?;

        if self.db.set_batch_finalizing(batch.hash, tx_hash).await? {
            self.metrics.finalizes_sent.increment(1);
            tracing::info!(
                target: "rollup::relayer",
                index = batch.index,
                hash = ?batch.hash,
                %tx_hash,
                "batch finalization submitted"
            );
        }
        Ok(())
    }
}
