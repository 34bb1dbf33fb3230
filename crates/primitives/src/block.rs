use alloy_primitives::{Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// The transaction type marker of an L1 message transaction.
pub const L1_MESSAGE_TX_TYPE: u8 = 0x7e;

/// Information about a block.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
}

impl BlockInfo {
    /// Returns a new instance of [`BlockInfo`].
    pub const fn new(number: u64, hash: B256) -> Self {
        Self { number, hash }
    }
}

/// The header fields of an L2 block that the codec and proposers consume.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeaderInfo {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
    /// The parent block hash.
    pub parent_hash: B256,
    /// The block timestamp.
    pub timestamp: u64,
    /// The block base fee. [`None`] before the fee-market fork.
    pub base_fee: Option<U256>,
    /// The block gas limit.
    pub gas_limit: u64,
    /// The post-state root of the block.
    pub state_root: B256,
}

/// A single transaction of an ingested L2 block.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionData {
    /// The transaction type byte.
    pub tx_type: u8,
    /// The transaction hash.
    pub tx_hash: B256,
    /// The L1 message queue index. [`Some`] iff this is an L1 message transaction.
    pub queue_index: Option<u64>,
    /// The RLP-encoded transaction payload.
    pub payload: Bytes,
}

impl TransactionData {
    /// Returns true if this is an L1 message transaction.
    pub const fn is_l1_message(&self) -> bool {
        self.tx_type == L1_MESSAGE_TX_TYPE
    }
}

/// A named zk circuit row usage entry reported by the execution node.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowUsage {
    /// The sub-circuit name.
    pub name: String,
    /// The number of rows consumed.
    pub row_number: u64,
}

/// An L2 block as ingested by the watcher. Immutable once stored.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L2Block {
    /// The block header fields.
    pub header: BlockHeaderInfo,
    /// The block transactions, in execution order.
    pub transactions: Vec<TransactionData>,
    /// The withdraw trie root after this block.
    pub withdraw_root: B256,
    /// The per-circuit row consumption of the block.
    pub row_consumption: Vec<RowUsage>,
}

impl L2Block {
    /// Returns the total number of transactions in the block.
    pub fn num_transactions(&self) -> u64 {
        self.transactions.len() as u64
    }

    /// Returns the number of L2 (non L1 message) transactions in the block.
    pub fn num_l2_transactions(&self) -> u64 {
        self.transactions.iter().filter(|tx| !tx.is_l1_message()).count() as u64
    }

    /// Returns the number of L1 messages popped by this block, given the total
    /// number of messages popped before it.
    ///
    /// Skipped messages count as popped: the result is derived from the highest
    /// included queue index, not from the number of included L1 transactions.
    /// A queue index below the watermark yields zero rather than underflowing.
    pub fn num_l1_messages(&self, total_l1_messages_popped_before: u64) -> u64 {
        let mut last_queue_index = None;
        for tx in &self.transactions {
            if let Some(queue_index) = tx.queue_index {
                last_queue_index = Some(queue_index);
            }
        }
        match last_queue_index {
            Some(index) => (index + 1).saturating_sub(total_l1_messages_popped_before),
            None => 0,
        }
    }

    /// Returns the maximum row consumption over all sub-circuits, or zero when
    /// the node reported none.
    pub fn crc_max(&self) -> u64 {
        self.row_consumption.iter().map(|usage| usage.row_number).max().unwrap_or(0)
    }
}

/// A stored L1 block row, the input to the L1 gas price oracle.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1BlockRecord {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
    /// The block base fee.
    pub base_fee: u64,
    /// The blob base fee derived from the excess blob gas.
    pub blob_base_fee: u64,
    /// The gas oracle lifecycle state.
    pub oracle_status: crate::status::GasOracleStatus,
    /// The hash of the gas oracle update transaction.
    pub oracle_tx_hash: Option<B256>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l1_message(queue_index: u64) -> TransactionData {
        TransactionData {
            tx_type: L1_MESSAGE_TX_TYPE,
            queue_index: Some(queue_index),
            ..Default::default()
        }
    }

    fn l2_transaction() -> TransactionData {
        TransactionData { tx_type: 2, ..Default::default() }
    }

    #[test]
    fn num_l1_messages_counts_skipped_messages() {
        let block = L2Block {
            transactions: vec![l1_message(3), l1_message(5), l2_transaction()],
            ..Default::default()
        };
        // queue indices 0..=5 are popped, 2 of which were popped before.
        assert_eq!(block.num_l1_messages(2), 4);
        assert_eq!(block.num_l2_transactions(), 1);
        assert_eq!(block.num_transactions(), 3);
    }

    #[test]
    fn num_l1_messages_without_messages_is_zero() {
        let block = L2Block { transactions: vec![l2_transaction()], ..Default::default() };
        assert_eq!(block.num_l1_messages(7), 0);
    }

    #[test]
    fn num_l1_messages_clamps_below_the_watermark() {
        let block = L2Block { transactions: vec![l1_message(3)], ..Default::default() };
        assert_eq!(block.num_l1_messages(10), 0);
    }

    #[test]
    fn crc_max_takes_the_largest_entry() {
        let block = L2Block {
            row_consumption: vec![
                RowUsage { name: "evm".into(), row_number: 100 },
                RowUsage { name: "keccak".into(), row_number: 250 },
            ],
            ..Default::default()
        };
        assert_eq!(block.crc_max(), 250);
        assert_eq!(L2Block::default().crc_max(), 0);
    }
}
