use crate::WatcherError;

use alloy_primitives::{Address, B256, U256, U64};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{BlockNumberOrTag, Filter, Log};
use rollup_relayer_primitives::{
    BlockHeaderInfo, RowUsage, TransactionData, L1_MESSAGE_TX_TYPE,
};
use serde::Deserialize;

/// The condensed header fields the watchers consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
    /// The parent block hash.
    pub parent_hash: B256,
    /// The block timestamp.
    pub timestamp: u64,
    /// The block base fee.
    pub base_fee_per_gas: Option<u64>,
    /// The excess blob gas of the block.
    pub excess_blob_gas: Option<u64>,
}

/// An L2 block as returned by the execution node, before the withdraw root is
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L2BlockData {
    /// The block header fields.
    pub header: BlockHeaderInfo,
    /// The block transactions, in execution order.
    pub transactions: Vec<TransactionData>,
    /// The per-circuit row consumption of the block.
    pub row_consumption: Vec<RowUsage>,
}

/// An abstraction over the execution node RPC the watchers run against.
#[async_trait::async_trait]
pub trait ChainReader: Send + Sync {
    /// Returns the block number for the provided tag.
    async fn block_number(&self, tag: BlockNumberOrTag) -> Result<u64, WatcherError>;

    /// Returns the header for the provided block number.
    async fn header_by_number(&self, number: u64) -> Result<Option<HeaderInfo>, WatcherError>;

    /// Returns the logs matching the provided filter.
    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>, WatcherError>;

    /// Returns the L2 block at the provided number, along with its circuit row
    /// consumption.
    async fn l2_block_with_row_consumption(
        &self,
        number: u64,
    ) -> Result<Option<L2BlockData>, WatcherError>;

    /// Returns the value of the storage slot at the provided block.
    async fn storage_at(
        &self,
        address: Address,
        slot: B256,
        number: u64,
    ) -> Result<B256, WatcherError>;

    /// Returns the gas price suggested by the node.
    async fn suggest_gas_price(&self) -> Result<u128, WatcherError>;
}

/// The JSON shape of a transaction in the row consumption RPC response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransaction {
    #[serde(rename = "type")]
    tx_type: U64,
    hash: B256,
    #[serde(default)]
    queue_index: Option<U64>,
}

/// The JSON shape of a row usage entry in the row consumption RPC response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcRowUsage {
    name: String,
    row_number: u64,
}

/// The JSON shape of the `scroll_getBlockByNumberWithRowConsumption` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBlock {
    number: U64,
    hash: B256,
    parent_hash: B256,
    timestamp: U64,
    #[serde(default)]
    base_fee_per_gas: Option<U256>,
    gas_limit: U64,
    state_root: B256,
    transactions: Vec<RpcTransaction>,
    #[serde(default)]
    row_consumption: Option<Vec<RpcRowUsage>>,
}

/// A [`ChainReader`] over any alloy [`Provider`].
///
/// The provider should implement some backoff strategy using
/// [`alloy_transport::layers::RetryBackoffLayer`] in the client in order to
/// avoid excessive queries on the RPC provider.
#[derive(Debug, Clone)]
pub struct AlloyChainReader<P> {
    provider: P,
}

impl<P> AlloyChainReader<P> {
    /// Returns a new [`AlloyChainReader`] over the provided provider.
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl<P> ChainReader for AlloyChainReader<P>
where
    P: Provider + Sync,
{
    async fn block_number(&self, tag: BlockNumberOrTag) -> Result<u64, WatcherError> {
        match tag {
            BlockNumberOrTag::Number(number) => Ok(number),
            BlockNumberOrTag::Latest => Ok(self.provider.get_block_number().await?),
            tag => Ok(self
                .provider
                .get_block(tag.into())
                .await?
                .ok_or(WatcherError::MissingTaggedBlock(tag))?
                .header
                .number),
        }
    }

    async fn header_by_number(&self, number: u64) -> Result<Option<HeaderInfo>, WatcherError> {
        Ok(self.provider.get_block(number.into()).await?.map(|block| HeaderInfo {
            number: block.header.number,
            hash: block.header.hash,
            parent_hash: block.header.parent_hash,
            timestamp: block.header.timestamp,
            base_fee_per_gas: block.header.base_fee_per_gas,
            excess_blob_gas: block.header.excess_blob_gas,
        }))
    }

    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>, WatcherError> {
        Ok(self.provider.get_logs(filter).await?)
    }

    async fn l2_block_with_row_consumption(
        &self,
        number: u64,
    ) -> Result<Option<L2BlockData>, WatcherError> {
        let block: Option<RpcBlock> = self
            .provider
            .client()
            .request("scroll_getBlockByNumberWithRowConsumption", (U64::from(number),))
            .await?;
        let Some(block) = block else { return Ok(None) };

        let row_consumption = block
            .row_consumption
            .ok_or(WatcherError::MissingRowConsumption(number))?
            .into_iter()
            .map(|usage| RowUsage { name: usage.name, row_number: usage.row_number })
            .collect();

        let mut transactions = Vec::with_capacity(block.transactions.len());
        for tx in block.transactions {
            let payload = self
                .provider
                .get_raw_transaction_by_hash(tx.hash)
                .await?
                .ok_or(WatcherError::MissingBlock(number))?;
            let tx_type = tx.tx_type.to::<u8>();
            transactions.push(TransactionData {
                tx_type,
                tx_hash: tx.hash,
                queue_index: (tx_type == L1_MESSAGE_TX_TYPE)
                    .then(|| tx.queue_index.map(|index| index.to::<u64>()))
                    .flatten(),
                payload,
            });
        }

        Ok(Some(L2BlockData {
            header: BlockHeaderInfo {
                number: block.number.to::<u64>(),
                hash: block.hash,
                parent_hash: block.parent_hash,
                timestamp: block.timestamp.to::<u64>(),
                base_fee: block.base_fee_per_gas,
                gas_limit: block.gas_limit.to::<u64>(),
                state_root: block.state_root,
            },
            transactions,
            row_consumption,
        }))
    }

    async fn storage_at(
        &self,
        address: Address,
        slot: B256,
        number: u64,
    ) -> Result<B256, WatcherError> {
        let value =
            self.provider.get_storage_at(address, slot.into()).block_id(number.into()).await?;
        Ok(B256::from(value))
    }

    async fn suggest_gas_price(&self) -> Result<u128, WatcherError> {
        Ok(self.provider.get_gas_price().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_block_deserializes_row_consumption() {
        let json = r#"{
            "number": "0x10",
            "hash": "0x61e7e1b4a2a1da274a45bffca32b0b78ecff6f68531a0db0a537f5292a51bd42",
            "parentHash": "0x41e7e1b4a2a1da274a45bffca32b0b78ecff6f68531a0db0a537f5292a51bd42",
            "timestamp": "0x64",
            "baseFeePerGas": "0x3b9aca00",
            "gasLimit": "0x989680",
            "stateRoot": "0x51e7e1b4a2a1da274a45bffca32b0b78ecff6f68531a0db0a537f5292a51bd42",
            "transactions": [
                {
                    "type": "0x7e",
                    "hash": "0x71e7e1b4a2a1da274a45bffca32b0b78ecff6f68531a0db0a537f5292a51bd42",
                    "queueIndex": "0x5"
                }
            ],
            "rowConsumption": [{"name": "evm", "rowNumber": 250}]
        }"#;

        let block: RpcBlock = serde_json::from_str(json).unwrap();
        assert_eq!(block.number.to::<u64>(), 16);
        assert_eq!(block.transactions[0].tx_type.to::<u8>(), L1_MESSAGE_TX_TYPE);
        assert_eq!(block.transactions[0].queue_index, Some(U64::from(5)));
        assert_eq!(block.row_consumption.unwrap()[0].row_number, 250);
    }

    #[test]
    fn rpc_block_tolerates_missing_row_consumption() {
        let json = r#"{
            "number": "0x1",
            "hash": "0x61e7e1b4a2a1da274a45bffca32b0b78ecff6f68531a0db0a537f5292a51bd42",
            "parentHash": "0x41e7e1b4a2a1da274a45bffca32b0b78ecff6f68531a0db0a537f5292a51bd42",
            "timestamp": "0x64",
            "gasLimit": "0x989680",
            "stateRoot": "0x51e7e1b4a2a1da274a45bffca32b0b78ecff6f68531a0db0a537f5292a51bd42",
            "transactions": []
        }"#;

        let block: RpcBlock = serde_json::from_str(json).unwrap();
        assert!(block.row_consumption.is_none());
        assert!(block.base_fee_per_gas.is_none());
    }
}
