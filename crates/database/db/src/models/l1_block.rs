use alloy_primitives::B256;
use rollup_relayer_primitives::L1BlockRecord;
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents an ingested L1 block.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "l1_block")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    number: i64,
    hash: Vec<u8>,
    base_fee: i64,
    blob_base_fee: i64,
    oracle_status: i16,
    oracle_tx_hash: Option<Vec<u8>>,
}

/// The relation for the L1 block model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the L1 block model.
impl ActiveModelBehavior for ActiveModel {}

impl From<L1BlockRecord> for ActiveModel {
    fn from(block: L1BlockRecord) -> Self {
        Self {
            number: ActiveValue::Set(
                block.number.try_into().expect("block number should fit in i64"),
            ),
            hash: ActiveValue::Set(block.hash.to_vec()),
            base_fee: ActiveValue::Set(
                block.base_fee.try_into().expect("base fee should fit in i64"),
            ),
            blob_base_fee: ActiveValue::Set(
                block.blob_base_fee.try_into().expect("blob base fee should fit in i64"),
            ),
            oracle_status: ActiveValue::Set(block.oracle_status.into()),
            oracle_tx_hash: ActiveValue::Set(block.oracle_tx_hash.map(|hash| hash.to_vec())),
        }
    }
}

impl From<Model> for L1BlockRecord {
    fn from(value: Model) -> Self {
        Self {
            number: value.number as u64,
            hash: B256::from_slice(&value.hash),
            base_fee: value.base_fee as u64,
            blob_base_fee: value.blob_base_fee as u64,
            oracle_status: value
                .oracle_status
                .try_into()
                .expect("data persisted in database is valid"),
            oracle_tx_hash: value.oracle_tx_hash.map(|hash| B256::from_slice(&hash)),
        }
    }
}
