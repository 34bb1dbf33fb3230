use crate::{
    latest_confirmed_block_number, ChainReader, ConfirmationPolicy, L1WatcherMetrics, WatcherError,
};

use alloy_eips::eip4844::calc_blob_gasprice;
use alloy_primitives::Address;
use alloy_rpc_types_eth::{Filter, Log};
use alloy_sol_types::SolEvent;
use rollup_relayer_db::{Database, DatabaseOperations, DatabaseTransaction};
use rollup_relayer_l1::{try_decode_log, CommitBatch, FinalizeBatch, RevertBatch};
use rollup_relayer_primitives::{GasOracleStatus, L1BlockRecord};
use std::sync::Arc;

/// The number of L1 headers ingested per call.
const HEADER_FETCH_LIMIT: u64 = 100;

/// The configuration of the [`L1Watcher`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct L1WatcherConfig {
    /// The address of the rollup contract on L1.
    pub rollup_contract_address: Address,
    /// The block height ingestion starts above on a fresh database.
    pub start_height: u64,
    /// The confirmation policy applied to the L1 head.
    pub confirmation: ConfirmationPolicy,
    /// The maximum block range of a single contract event scan.
    pub contract_events_block_range: u64,
}

/// The L1 watcher ingests confirmed L1 headers for the gas oracle and applies
/// rollup contract events to the batch lifecycle.
#[derive(Debug)]
pub struct L1Watcher<R> {
    reader: R,
    db: Arc<Database>,
    config: L1WatcherConfig,
    metrics: L1WatcherMetrics,
}

impl<R: ChainReader> L1Watcher<R> {
    /// Returns a new [`L1Watcher`].
    pub fn new(reader: R, db: Arc<Database>, config: L1WatcherConfig) -> Self {
        Self { reader, db, config, metrics: L1WatcherMetrics::default() }
    }

    /// Ingests confirmed headers above the stored watermark, recording the
    /// base fee and blob base fee of each block with a pending oracle status.
    pub async fn fetch_block_header(&self) -> Result<(), WatcherError> {
        let confirmed =
            latest_confirmed_block_number(&self.reader, self.config.confirmation).await?;
        let stored =
            self.db.get_latest_l1_block_number().await?.unwrap_or(self.config.start_height);

        let from = stored.saturating_add(1);
        let to = confirmed.min(stored.saturating_add(HEADER_FETCH_LIMIT));
        if from > to {
            return Ok(());
        }
        tracing::debug!(target: "rollup::watcher", from, to, "fetching L1 headers");

        let mut records = Vec::with_capacity((to - from + 1) as usize);
        for number in from..=to {
            let header = self
                .reader
                .header_by_number(number)
                .await?
                .ok_or(WatcherError::MissingBlock(number))?;
            records.push(L1BlockRecord {
                number,
                hash: header.hash,
                base_fee: header.base_fee_per_gas.unwrap_or_default(),
                blob_base_fee: header
                    .excess_blob_gas
                    .map(|excess| calc_blob_gasprice(excess).try_into().unwrap_or(u64::MAX))
                    .unwrap_or(1),
                oracle_status: GasOracleStatus::Pending,
                oracle_tx_hash: None,
            });
        }

        self.metrics.headers_ingested.increment(records.len() as u64);
        self.db.insert_l1_blocks(records).await?;
        Ok(())
    }

    /// Scans the next bounded range of rollup contract logs above the
    /// persisted scan watermark and applies the derived batch transitions.
    ///
    /// All updates of a range, watermark included, commit in one transaction.
    /// A crash before the commit re-scans the same range; the guarded status
    /// transitions make the re-application a no-op.
    pub async fn fetch_contract_events(&self) -> Result<(), WatcherError> {
        let confirmed =
            latest_confirmed_block_number(&self.reader, self.config.confirmation).await?;
        let last =
            self.db.get_l1_event_scan_height().await?.unwrap_or(self.config.start_height);
        if last >= confirmed {
            return Ok(());
        }

        let from = last + 1;
        let to = confirmed.min(last + self.config.contract_events_block_range);
        let filter = Filter::new()
            .address(self.config.rollup_contract_address)
            .event_signature(vec![
                CommitBatch::SIGNATURE_HASH,
                FinalizeBatch::SIGNATURE_HASH,
                RevertBatch::SIGNATURE_HASH,
            ])
            .from_block(from)
            .to_block(to);
        let logs = self.reader.logs(&filter).await?;
        tracing::debug!(target: "rollup::watcher", from, to, count = logs.len(), "scanned rollup contract events");

        let tx = self.db.tx().await?;
        for log in &logs {
            self.apply_log(&tx, log).await?;
        }
        tx.set_l1_event_scan_height(to).await?;
        tx.commit().await?;

        self.metrics.event_scan_height.set(to as f64);
        Ok(())
    }

    /// Applies a single rollup contract log to the batch lifecycle.
    async fn apply_log(&self, tx: &DatabaseTransaction, log: &Log) -> Result<(), WatcherError> {
        let Some(signature) = log.inner.data.topics().first() else { return Ok(()) };
        let tx_hash = log.transaction_hash.ok_or(WatcherError::IncompleteLog("transaction hash"))?;

        match *signature {
            CommitBatch::SIGNATURE_HASH => {
                let Some(decoded) = try_decode_log::<CommitBatch>(&log.inner) else {
                    return Ok(());
                };
                let index = u64::try_from(decoded.data.batch_index)
                    .expect("u256 to u64 conversion error");
                let hash = decoded.data.batch_hash;
                match tx.get_batch_by_index(index).await? {
                    Some(batch) if batch.hash == hash => {
                        let timestamp = self.log_timestamp(log).await?;
                        if tx.set_batch_committed(hash, tx_hash, timestamp).await? {
                            tracing::info!(target: "rollup::watcher", index, ?hash, "batch committed on L1");
                        }
                        self.metrics.commit_events.increment(1);
                    }
                    _ => {
                        tracing::debug!(target: "rollup::watcher", index, ?hash, "commit event for unknown batch");
                        self.metrics.skipped_events.increment(1);
                    }
                }
            }
            FinalizeBatch::SIGNATURE_HASH => {
                let Some(decoded) = try_decode_log::<FinalizeBatch>(&log.inner) else {
                    return Ok(());
                };
                let index = u64::try_from(decoded.data.batch_index)
                    .expect("u256 to u64 conversion error");
                let hash = decoded.data.batch_hash;
                match tx.get_batch_by_index(index).await? {
                    Some(batch) if batch.hash == hash => {
                        let timestamp = self.log_timestamp(log).await?;
                        if tx.set_batch_finalized(hash, tx_hash, timestamp).await? {
                            tracing::info!(target: "rollup::watcher", index, ?hash, "batch finalized on L1");
                        }
                        self.metrics.finalize_events.increment(1);
                    }
                    _ => {
                        tracing::debug!(target: "rollup::watcher", index, ?hash, "finalize event for unknown batch");
                        self.metrics.skipped_events.increment(1);
                    }
                }
            }
            RevertBatch::SIGNATURE_HASH => {
                let Some(decoded) = try_decode_log::<RevertBatch>(&log.inner) else {
                    return Ok(());
                };
                let index = u64::try_from(decoded.data.batch_index)
                    .expect("u256 to u64 conversion error");
                let hash = decoded.data.batch_hash;
                if tx.set_batch_reverted(hash).await? {
                    tracing::warn!(target: "rollup::watcher", index, ?hash, "batch reverted on L1");
                    self.metrics.revert_events.increment(1);
                } else {
                    self.metrics.skipped_events.increment(1);
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the timestamp of the block a log was emitted at.
    async fn log_timestamp(&self, log: &Log) -> Result<u64, WatcherError> {
        if let Some(timestamp) = log.block_timestamp {
            return Ok(timestamp);
        }
        let number = log.block_number.ok_or(WatcherError::IncompleteLog("block number"))?;
        Ok(self
            .reader
            .header_by_number(number)
            .await?
            .ok_or(WatcherError::MissingBlock(number))?
            .timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{event_log, MockChainReader};
    use alloy_primitives::{B256, U256};
    use crate::HeaderInfo;
    use rollup_relayer_db::test_utils::setup_test_db;
    use rollup_relayer_primitives::{BatchRecord, RollupStatus};

    const ROLLUP_CONTRACT: Address = Address::repeat_byte(0x11);

    fn config() -> L1WatcherConfig {
        L1WatcherConfig {
            rollup_contract_address: ROLLUP_CONTRACT,
            start_height: 0,
            confirmation: ConfirmationPolicy::Number(0),
            contract_events_block_range: 100,
        }
    }

    fn header(number: u64) -> HeaderInfo {
        HeaderInfo {
            number,
            hash: B256::random(),
            parent_hash: B256::random(),
            timestamp: 1_700_000_000 + number,
            base_fee_per_gas: Some(30_000_000_000),
            excess_blob_gas: Some(0),
        }
    }

    fn pending_batch(index: u64) -> BatchRecord {
        BatchRecord {
            index,
            hash: B256::random(),
            batch_header: vec![0u8; 121].into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_ingests_confirmed_headers() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        let mut reader = MockChainReader::default().with_latest(5);
        for number in 1..=5 {
            reader = reader.with_header(header(number));
        }

        let watcher = L1Watcher::new(reader, db.clone(), config());
        watcher.fetch_block_header().await?;

        assert_eq!(db.get_latest_l1_block_number().await?, Some(5));
        let block = db.get_l1_block(3).await?.unwrap();
        assert_eq!(block.base_fee, 30_000_000_000);
        // zero excess blob gas resolves to the minimum blob base fee.
        assert_eq!(block.blob_base_fee, 1);
        assert_eq!(block.oracle_status, GasOracleStatus::Pending);

        Ok(())
    }

    #[tokio::test]
    async fn test_commit_event_transitions_batch() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        let batch = pending_batch(1);
        db.insert_batch(&batch).await?;
        let commit_tx = B256::random();
        assert!(db.set_batch_committing(batch.hash, commit_tx).await?);

        let log = event_log(
            &CommitBatch { batch_index: U256::from(1), batch_hash: batch.hash },
            ROLLUP_CONTRACT,
            10,
            commit_tx,
            1_700_000_100,
        );
        let reader = MockChainReader::default().with_latest(10).with_log(log);

        let watcher = L1Watcher::new(reader, db.clone(), config());
        watcher.fetch_contract_events().await?;

        let batch_from_db = db.get_batch_by_hash(batch.hash).await?.unwrap();
        assert_eq!(batch_from_db.rollup_status, RollupStatus::Committed);
        assert_eq!(batch_from_db.committed_at, Some(1_700_000_100));
        assert_eq!(db.get_l1_event_scan_height().await?, Some(10));

        Ok(())
    }

    #[tokio::test]
    async fn test_event_application_is_idempotent() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        let batch = pending_batch(1);
        db.insert_batch(&batch).await?;
        assert!(db.set_batch_committing(batch.hash, B256::random()).await?);

        let log = event_log(
            &CommitBatch { batch_index: U256::from(1), batch_hash: batch.hash },
            ROLLUP_CONTRACT,
            10,
            B256::random(),
            1_700_000_100,
        );
        // the mock replays the same log for every scanned range.
        let reader = MockChainReader::default().with_latest(200).with_log(log);

        let watcher = L1Watcher::new(
            reader,
            db.clone(),
            L1WatcherConfig { contract_events_block_range: 50, ..config() },
        );
        watcher.fetch_contract_events().await?;
        let committed_at = db.get_batch_by_hash(batch.hash).await?.unwrap().committed_at;

        // a re-scan of the same events leaves the batch untouched.
        watcher.fetch_contract_events().await?;
        let batch_from_db = db.get_batch_by_hash(batch.hash).await?.unwrap();
        assert_eq!(batch_from_db.rollup_status, RollupStatus::Committed);
        assert_eq!(batch_from_db.committed_at, committed_at);

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_batch_event_is_skipped() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);

        let log = event_log(
            &CommitBatch { batch_index: U256::from(99), batch_hash: B256::random() },
            ROLLUP_CONTRACT,
            10,
            B256::random(),
            1_700_000_100,
        );
        let reader = MockChainReader::default().with_latest(10).with_log(log);

        let watcher = L1Watcher::new(reader, db.clone(), config());
        // an event for a batch the store does not know is not an error.
        watcher.fetch_contract_events().await?;
        assert_eq!(db.get_l1_event_scan_height().await?, Some(10));

        Ok(())
    }

    #[tokio::test]
    async fn test_revert_event_is_terminal() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        let batch = pending_batch(1);
        db.insert_batch(&batch).await?;
        assert!(db.set_batch_committing(batch.hash, B256::random()).await?);
        assert!(db.set_batch_committed(batch.hash, B256::random(), 50).await?);

        let log = event_log(
            &RevertBatch { batch_index: U256::from(1), batch_hash: batch.hash },
            ROLLUP_CONTRACT,
            11,
            B256::random(),
            1_700_000_150,
        );
        let reader = MockChainReader::default().with_latest(11).with_log(log);

        let watcher = L1Watcher::new(reader, db.clone(), config());
        watcher.fetch_contract_events().await?;

        let batch_from_db = db.get_batch_by_hash(batch.hash).await?.unwrap();
        assert_eq!(batch_from_db.rollup_status, RollupStatus::Reverted);
        // a reverted batch never finalizes.
        assert!(!db.set_batch_finalizing(batch.hash, B256::random()).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_finalize_event_skips_proofless_commit() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        let batch = pending_batch(1);
        db.insert_batch(&batch).await?;
        assert!(db.set_batch_committing(batch.hash, B256::random()).await?);
        assert!(db.set_batch_committed(batch.hash, B256::random(), 50).await?);

        // finalization straight from the committed state, no finalizing step.
        let log = event_log(
            &FinalizeBatch {
                batch_index: U256::from(1),
                batch_hash: batch.hash,
                state_root: B256::random(),
                withdraw_root: B256::random(),
            },
            ROLLUP_CONTRACT,
            12,
            B256::random(),
            1_700_000_200,
        );
        let reader = MockChainReader::default().with_latest(12).with_log(log);

        let watcher = L1Watcher::new(reader, db.clone(), config());
        watcher.fetch_contract_events().await?;

        let batch_from_db = db.get_batch_by_hash(batch.hash).await?.unwrap();
        assert_eq!(batch_from_db.rollup_status, RollupStatus::Finalized);

        Ok(())
    }
}
