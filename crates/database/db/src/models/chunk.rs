use alloy_primitives::B256;
use rollup_relayer_primitives::ChunkRecord;
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents a proposed chunk.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "chunk")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    index: i64,
    hash: Vec<u8>,
    start_block_number: i64,
    end_block_number: i64,
    total_l1_messages_popped_before: i64,
    total_l1_messages_popped_in_chunk: i64,
    start_block_timestamp: i64,
    tx_num: i64,
    max_row_consumption: i64,
    l1_commit_gas: i64,
    l1_commit_calldata_size: i64,
    l1_commit_blob_size: i64,
    parent_chunk_hash: Vec<u8>,
    codec_version: i16,
    proving_status: i16,
    batch_hash: Option<Vec<u8>>,
}

/// The relation for the chunk model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the chunk model.
impl ActiveModelBehavior for ActiveModel {}

impl From<&ChunkRecord> for ActiveModel {
    fn from(chunk: &ChunkRecord) -> Self {
        Self {
            index: ActiveValue::Set(chunk.index.try_into().expect("index should fit in i64")),
            hash: ActiveValue::Set(chunk.hash.to_vec()),
            start_block_number: ActiveValue::Set(
                chunk.start_block_number.try_into().expect("block number should fit in i64"),
            ),
            end_block_number: ActiveValue::Set(
                chunk.end_block_number.try_into().expect("block number should fit in i64"),
            ),
            total_l1_messages_popped_before: ActiveValue::Set(
                chunk
                    .total_l1_messages_popped_before
                    .try_into()
                    .expect("message count should fit in i64"),
            ),
            total_l1_messages_popped_in_chunk: ActiveValue::Set(
                chunk
                    .total_l1_messages_popped_in_chunk
                    .try_into()
                    .expect("message count should fit in i64"),
            ),
            start_block_timestamp: ActiveValue::Set(
                chunk.start_block_timestamp.try_into().expect("timestamp should fit in i64"),
            ),
            tx_num: ActiveValue::Set(chunk.tx_num.try_into().expect("tx count should fit in i64")),
            max_row_consumption: ActiveValue::Set(
                chunk.max_row_consumption.try_into().expect("row count should fit in i64"),
            ),
            l1_commit_gas: ActiveValue::Set(
                chunk.l1_commit_gas.try_into().expect("gas should fit in i64"),
            ),
            l1_commit_calldata_size: ActiveValue::Set(
                chunk.l1_commit_calldata_size.try_into().expect("size should fit in i64"),
            ),
            l1_commit_blob_size: ActiveValue::Set(
                chunk.l1_commit_blob_size.try_into().expect("size should fit in i64"),
            ),
            parent_chunk_hash: ActiveValue::Set(chunk.parent_chunk_hash.to_vec()),
            codec_version: ActiveValue::Set(chunk.codec_version.into()),
            proving_status: ActiveValue::Set(chunk.proving_status.into()),
            batch_hash: ActiveValue::Set(chunk.batch_hash.map(|hash| hash.to_vec())),
        }
    }
}

impl From<Model> for ChunkRecord {
    fn from(value: Model) -> Self {
        Self {
            index: value.index as u64,
            hash: B256::from_slice(&value.hash),
            start_block_number: value.start_block_number as u64,
            end_block_number: value.end_block_number as u64,
            total_l1_messages_popped_before: value.total_l1_messages_popped_before as u64,
            total_l1_messages_popped_in_chunk: value.total_l1_messages_popped_in_chunk as u64,
            start_block_timestamp: value.start_block_timestamp as u64,
            tx_num: value.tx_num as u64,
            max_row_consumption: value.max_row_consumption as u64,
            l1_commit_gas: value.l1_commit_gas as u64,
            l1_commit_calldata_size: value.l1_commit_calldata_size as u64,
            l1_commit_blob_size: value.l1_commit_blob_size as u64,
            parent_chunk_hash: B256::from_slice(&value.parent_chunk_hash),
            codec_version: value.codec_version as u8,
            proving_status: value
                .proving_status
                .try_into()
                .expect("data persisted in database is valid"),
            batch_hash: value.batch_hash.map(|hash| B256::from_slice(&hash)),
        }
    }
}
