use alloy_primitives::{B256, U256};
use rollup_relayer_primitives::{BlockHeaderInfo, L2Block};
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents an ingested L2 block.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "l2_block")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    number: i64,
    hash: Vec<u8>,
    parent_hash: Vec<u8>,
    block_timestamp: i64,
    base_fee: Option<Vec<u8>>,
    gas_limit: i64,
    state_root: Vec<u8>,
    withdraw_root: Vec<u8>,
    tx_num: i64,
    transactions: Vec<u8>,
    row_consumption: Vec<u8>,
    chunk_hash: Option<Vec<u8>>,
}

/// The relation for the L2 block model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the L2 block model.
impl ActiveModelBehavior for ActiveModel {}

impl From<&L2Block> for ActiveModel {
    fn from(block: &L2Block) -> Self {
        Self {
            number: ActiveValue::Set(
                block.header.number.try_into().expect("block number should fit in i64"),
            ),
            hash: ActiveValue::Set(block.header.hash.to_vec()),
            parent_hash: ActiveValue::Set(block.header.parent_hash.to_vec()),
            block_timestamp: ActiveValue::Set(
                block.header.timestamp.try_into().expect("timestamp should fit in i64"),
            ),
            base_fee: ActiveValue::Set(
                block.header.base_fee.map(|fee| fee.to_be_bytes::<32>().to_vec()),
            ),
            gas_limit: ActiveValue::Set(
                block.header.gas_limit.try_into().expect("gas limit should fit in i64"),
            ),
            state_root: ActiveValue::Set(block.header.state_root.to_vec()),
            withdraw_root: ActiveValue::Set(block.withdraw_root.to_vec()),
            tx_num: ActiveValue::Set(block.transactions.len() as i64),
            transactions: ActiveValue::Set(
                serde_json::to_vec(&block.transactions).expect("transactions are serializable"),
            ),
            row_consumption: ActiveValue::Set(
                serde_json::to_vec(&block.row_consumption)
                    .expect("row consumption is serializable"),
            ),
            chunk_hash: ActiveValue::Set(None),
        }
    }
}

impl From<Model> for L2Block {
    fn from(value: Model) -> Self {
        Self {
            header: BlockHeaderInfo {
                number: value.number as u64,
                hash: B256::from_slice(&value.hash),
                parent_hash: B256::from_slice(&value.parent_hash),
                timestamp: value.block_timestamp as u64,
                base_fee: value.base_fee.map(|fee| U256::from_be_slice(&fee)),
                gas_limit: value.gas_limit as u64,
                state_root: B256::from_slice(&value.state_root),
            },
            transactions: serde_json::from_slice(&value.transactions)
                .expect("data persisted in database is valid"),
            withdraw_root: B256::from_slice(&value.withdraw_root),
            row_consumption: serde_json::from_slice(&value.row_consumption)
                .expect("data persisted in database is valid"),
        }
    }
}
