//! Test utilities for the chain watchers.

use crate::{ChainReader, HeaderInfo, L2BlockData, WatcherError};

use alloy_primitives::{Address, B256, U256};
use alloy_rpc_types_eth::{BlockNumberOrTag, Filter, Log};
use alloy_sol_types::SolEvent;
use rollup_relayer_primitives::{BlockHeaderInfo, RowUsage, TransactionData};
use std::collections::HashMap;

/// A canned [`ChainReader`] backed by in-memory maps.
#[derive(Debug, Default, Clone)]
pub struct MockChainReader {
    latest: u64,
    safe: Option<u64>,
    finalized: Option<u64>,
    headers: HashMap<u64, HeaderInfo>,
    l2_blocks: HashMap<u64, L2BlockData>,
    storage: HashMap<(Address, B256, u64), B256>,
    logs: Vec<Log>,
    gas_price: u128,
}

impl MockChainReader {
    /// Sets the latest block number.
    pub fn with_latest(mut self, number: u64) -> Self {
        self.latest = number;
        self
    }

    /// Sets the safe block number.
    pub fn with_safe(mut self, number: u64) -> Self {
        self.safe = Some(number);
        self
    }

    /// Sets the finalized block number.
    pub fn with_finalized(mut self, number: u64) -> Self {
        self.finalized = Some(number);
        self
    }

    /// Registers a header.
    pub fn with_header(mut self, header: HeaderInfo) -> Self {
        self.headers.insert(header.number, header);
        self
    }

    /// Registers an L2 block.
    pub fn with_l2_block(mut self, block: L2BlockData) -> Self {
        self.l2_blocks.insert(block.header.number, block);
        self
    }

    /// Registers a storage slot value.
    pub fn with_storage(mut self, address: Address, slot: B256, number: u64, value: B256) -> Self {
        self.storage.insert((address, slot, number), value);
        self
    }

    /// Registers a log returned by every matching filter query.
    pub fn with_log(mut self, log: Log) -> Self {
        self.logs.push(log);
        self
    }

    /// Sets the suggested gas price.
    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }
}

#[async_trait::async_trait]
impl ChainReader for MockChainReader {
    async fn block_number(&self, tag: BlockNumberOrTag) -> Result<u64, WatcherError> {
        match tag {
            BlockNumberOrTag::Number(number) => Ok(number),
            BlockNumberOrTag::Latest | BlockNumberOrTag::Pending => Ok(self.latest),
            BlockNumberOrTag::Safe => self.safe.ok_or(WatcherError::MissingTaggedBlock(tag)),
            BlockNumberOrTag::Finalized => {
                self.finalized.ok_or(WatcherError::MissingTaggedBlock(tag))
            }
            BlockNumberOrTag::Earliest => Ok(0),
        }
    }

    async fn header_by_number(&self, number: u64) -> Result<Option<HeaderInfo>, WatcherError> {
        Ok(self.headers.get(&number).cloned())
    }

    async fn logs(&self, _filter: &Filter) -> Result<Vec<Log>, WatcherError> {
        Ok(self.logs.clone())
    }

    async fn l2_block_with_row_consumption(
        &self,
        number: u64,
    ) -> Result<Option<L2BlockData>, WatcherError> {
        Ok(self.l2_blocks.get(&number).cloned())
    }

    async fn storage_at(
        &self,
        address: Address,
        slot: B256,
        number: u64,
    ) -> Result<B256, WatcherError> {
        Ok(self.storage.get(&(address, slot, number)).copied().unwrap_or_default())
    }

    async fn suggest_gas_price(&self) -> Result<u128, WatcherError> {
        Ok(self.gas_price)
    }
}

/// Returns an L2 block fixture with a single L2 transaction and row
/// consumption.
pub fn test_l2_block(number: u64) -> L2BlockData {
    L2BlockData {
        header: BlockHeaderInfo {
            number,
            hash: B256::random(),
            parent_hash: B256::random(),
            timestamp: 1_700_000_000 + number,
            base_fee: Some(U256::from(1_000_000_000u64)),
            gas_limit: 10_000_000,
            state_root: B256::random(),
        },
        transactions: vec![TransactionData {
            tx_type: 2,
            tx_hash: B256::random(),
            queue_index: None,
            payload: vec![0xde, 0xad, 0xbe, 0xef].into(),
        }],
        row_consumption: vec![RowUsage { name: "evm".into(), row_number: 100 }],
    }
}

/// Builds an RPC log for a contract event.
pub fn event_log<T: SolEvent>(
    event: &T,
    address: Address,
    block_number: u64,
    tx_hash: B256,
    block_timestamp: u64,
) -> Log {
    Log {
        inner: alloy_primitives::Log { address, data: event.encode_log_data() },
        block_hash: Some(B256::random()),
        block_number: Some(block_number),
        block_timestamp: Some(block_timestamp),
        transaction_hash: Some(tx_hash),
        ..Default::default()
    }
}
