use crate::{
    latest_confirmed_block_number, ChainReader, ConfirmationPolicy, L2WatcherMetrics, WatcherError,
};

use alloy_primitives::{Address, B256};
use rollup_relayer_db::{Database, DatabaseOperations};
use rollup_relayer_primitives::L2Block;
use std::sync::Arc;

/// The number of L2 blocks fetched and persisted per window.
const BLOCK_FETCH_LIMIT: u64 = 10;

/// The configuration of the [`L2Watcher`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct L2WatcherConfig {
    /// The block height ingestion starts above on a fresh database.
    pub start_height: u64,
    /// The confirmation policy applied to the L2 head.
    pub confirmation: ConfirmationPolicy,
    /// The address of the L2 message queue predeploy.
    pub message_queue_address: Address,
    /// The storage slot of the withdraw trie root in the message queue.
    pub withdraw_trie_root_slot: B256,
}

/// The L2 watcher ingests confirmed L2 blocks into the database, resolving the
/// withdraw trie root and circuit row consumption for each block.
#[derive(Debug)]
pub struct L2Watcher<R> {
    reader: R,
    db: Arc<Database>,
    config: L2WatcherConfig,
    metrics: L2WatcherMetrics,
}

impl<R: ChainReader> L2Watcher<R> {
    /// Returns a new [`L2Watcher`].
    pub fn new(reader: R, db: Arc<Database>, config: L2WatcherConfig) -> Self {
        Self { reader, db, config, metrics: L2WatcherMetrics::default() }
    }

    /// Fetches the blocks between the highest stored block and the confirmed
    /// head, persisting them in bounded windows. Any error aborts the run and
    /// leaves the store untouched past the last committed window.
    pub async fn try_fetch_running_missing_blocks(&self) -> Result<(), WatcherError> {
        let confirmed =
            latest_confirmed_block_number(&self.reader, self.config.confirmation).await?;
        let stored =
            self.db.get_latest_l2_block_number().await?.unwrap_or(self.config.start_height);

        let mut from = stored.saturating_add(1);
        while from <= confirmed {
            let to = confirmed.min(from + BLOCK_FETCH_LIMIT - 1);
            self.fetch_and_save_block_range(from, to).await?;
            from = to + 1;
        }

        Ok(())
    }

    /// Fetches the inclusive block range `[from, to]` and persists it
    /// atomically.
    async fn fetch_and_save_block_range(&self, from: u64, to: u64) -> Result<(), WatcherError> {
        tracing::debug!(target: "rollup::watcher", from, to, "fetching L2 blocks");

        let mut blocks = Vec::with_capacity((to - from + 1) as usize);
        for number in from..=to {
            let data = self
                .reader
                .l2_block_with_row_consumption(number)
                .await?
                .ok_or(WatcherError::MissingBlock(number))?;
            let withdraw_root = self
                .reader
                .storage_at(
                    self.config.message_queue_address,
                    self.config.withdraw_trie_root_slot,
                    number,
                )
                .await?;
            blocks.push(L2Block {
                header: data.header,
                transactions: data.transactions,
                withdraw_root,
                row_consumption: data.row_consumption,
            });
        }

        let tx = self.db.tx().await?;
        tx.insert_l2_blocks(&blocks).await?;
        tx.commit().await?;

        self.metrics.blocks_fetched.increment(blocks.len() as u64);
        self.metrics.fetch_height.set(to as f64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_l2_block, MockChainReader};
    use rollup_relayer_db::test_utils::setup_test_db;

    fn config() -> L2WatcherConfig {
        L2WatcherConfig {
            start_height: 0,
            confirmation: ConfirmationPolicy::Number(0),
            message_queue_address: Address::repeat_byte(0x53),
            withdraw_trie_root_slot: B256::ZERO,
        }
    }

    #[tokio::test]
    async fn test_fetches_up_to_confirmed_head() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        let mut reader = MockChainReader::default().with_latest(15);
        for number in 1..=15 {
            reader = reader.with_l2_block(test_l2_block(number));
        }

        let watcher = L2Watcher::new(reader, db.clone(), config());
        watcher.try_fetch_running_missing_blocks().await?;

        assert_eq!(db.get_latest_l2_block_number().await?, Some(15));
        // the whole range is present, windowing left no gaps.
        assert_eq!(db.get_l2_blocks_in_range(1, 15).await?.len(), 15);

        Ok(())
    }

    #[tokio::test]
    async fn test_respects_confirmation_depth() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        let mut reader = MockChainReader::default().with_latest(10);
        for number in 1..=10 {
            reader = reader.with_l2_block(test_l2_block(number));
        }

        let watcher = L2Watcher::new(
            reader,
            db.clone(),
            L2WatcherConfig { confirmation: ConfirmationPolicy::Number(4), ..config() },
        );
        watcher.try_fetch_running_missing_blocks().await?;

        assert_eq!(db.get_latest_l2_block_number().await?, Some(6));

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_block_aborts_window() -> eyre::Result<()> {
        let db = Arc::new(setup_test_db().await);
        // block 3 is missing on the node.
        let reader = MockChainReader::default()
            .with_latest(4)
            .with_l2_block(test_l2_block(1))
            .with_l2_block(test_l2_block(2))
            .with_l2_block(test_l2_block(4));

        let watcher = L2Watcher::new(reader, db.clone(), config());
        let err = watcher.try_fetch_running_missing_blocks().await.unwrap_err();

        assert!(matches!(err, WatcherError::MissingBlock(3)));
        // the failed window was not partially persisted.
        assert_eq!(db.get_latest_l2_block_number().await?, None);

        Ok(())
    }
}
