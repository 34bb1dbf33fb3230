use crate::CodecError;
use alloy_primitives::U256;
use rollup_relayer_primitives::L2Block;

/// The size of an encoded block context.
pub(crate) const BLOCK_CONTEXT_BYTES: usize = 60;

/// The leading bytes of a block context that enter the chunk hash. The two
/// trailing transaction-count bytes are excluded.
pub(crate) const BLOCK_CONTEXT_BYTES_FOR_HASHING: usize = 58;

/// The block context committed to L1 for one L2 block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DABlock {
    /// The block number.
    pub number: u64,
    /// The block timestamp.
    pub timestamp: u64,
    /// The block base fee, zero-encoded when absent.
    pub base_fee: Option<U256>,
    /// The block gas limit.
    pub gas_limit: u64,
    /// The total number of transactions, skipped L1 messages included.
    pub num_transactions: u16,
    /// The number of L1 messages popped by the block, skipped ones included.
    pub num_l1_messages: u16,
}

impl DABlock {
    /// Builds the context for a block given the total number of L1 messages
    /// popped before it.
    pub fn new(block: &L2Block, total_l1_messages_popped_before: u64) -> Result<Self, CodecError> {
        let num_l1_messages = block.num_l1_messages(total_l1_messages_popped_before);
        if num_l1_messages > u16::MAX as u64 {
            return Err(CodecError::TooManyL1Messages {
                block: block.header.number,
                count: num_l1_messages,
            });
        }

        let num_transactions = num_l1_messages + block.num_l2_transactions();
        if num_transactions > u16::MAX as u64 {
            return Err(CodecError::TooManyTransactions {
                block: block.header.number,
                count: num_transactions,
            });
        }

        Ok(Self {
            number: block.header.number,
            timestamp: block.header.timestamp,
            base_fee: block.header.base_fee,
            gas_limit: block.header.gas_limit,
            num_transactions: num_transactions as u16,
            num_l1_messages: num_l1_messages as u16,
        })
    }

    /// Serializes the block context.
    pub fn encode(&self) -> [u8; BLOCK_CONTEXT_BYTES] {
        let mut bytes = [0u8; BLOCK_CONTEXT_BYTES];
        bytes[0..8].copy_from_slice(&self.number.to_be_bytes());
        bytes[8..16].copy_from_slice(&self.timestamp.to_be_bytes());
        if let Some(base_fee) = self.base_fee {
            bytes[16..48].copy_from_slice(&base_fee.to_be_bytes::<32>());
        }
        bytes[48..56].copy_from_slice(&self.gas_limit.to_be_bytes());
        bytes[56..58].copy_from_slice(&self.num_transactions.to_be_bytes());
        bytes[58..60].copy_from_slice(&self.num_l1_messages.to_be_bytes());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollup_relayer_primitives::{BlockHeaderInfo, TransactionData, L1_MESSAGE_TX_TYPE};

    #[test]
    fn encode_lays_out_fields_big_endian() {
        let block = L2Block {
            header: BlockHeaderInfo {
                number: 0x0102,
                timestamp: 0x0304,
                base_fee: Some(U256::from(1_000_000_000u64)),
                gas_limit: 10_000_000,
                ..Default::default()
            },
            transactions: vec![
                TransactionData {
                    tx_type: L1_MESSAGE_TX_TYPE,
                    queue_index: Some(2),
                    ..Default::default()
                },
                TransactionData { tx_type: 2, ..Default::default() },
            ],
            ..Default::default()
        };

        let context = DABlock::new(&block, 0).unwrap();
        // queue indices 0..=2 are popped, plus one L2 transaction.
        assert_eq!(context.num_l1_messages, 3);
        assert_eq!(context.num_transactions, 4);

        let encoded = context.encode();
        assert_eq!(&encoded[0..8], &0x0102u64.to_be_bytes());
        assert_eq!(&encoded[8..16], &0x0304u64.to_be_bytes());
        assert_eq!(&encoded[40..48], &1_000_000_000u64.to_be_bytes());
        assert_eq!(&encoded[48..56], &10_000_000u64.to_be_bytes());
        assert_eq!(&encoded[56..58], &4u16.to_be_bytes());
        assert_eq!(&encoded[58..60], &3u16.to_be_bytes());
    }

    #[test]
    fn encode_zeroes_base_fee_when_absent() {
        let block = L2Block::default();
        let encoded = DABlock::new(&block, 0).unwrap().encode();
        assert!(encoded[16..48].iter().all(|byte| *byte == 0));
    }
}
