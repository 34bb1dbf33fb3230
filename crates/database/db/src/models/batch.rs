use alloy_primitives::B256;
use rollup_relayer_primitives::BatchRecord;
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents a proposed batch.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "batch")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    index: i64,
    hash: Vec<u8>,
    start_chunk_index: i64,
    start_chunk_hash: Vec<u8>,
    end_chunk_index: i64,
    end_chunk_hash: Vec<u8>,
    parent_batch_hash: Vec<u8>,
    codec_version: i16,
    batch_header: Vec<u8>,
    blob_bytes: Option<Vec<u8>>,
    blob_data_proof: Option<Vec<u8>>,
    state_root: Vec<u8>,
    withdraw_root: Vec<u8>,
    rollup_status: i16,
    proving_status: i16,
    oracle_status: i16,
    commit_tx_hash: Option<Vec<u8>>,
    finalize_tx_hash: Option<Vec<u8>>,
    oracle_tx_hash: Option<Vec<u8>>,
    proof: Option<Vec<u8>>,
    committed_at: Option<i64>,
    finalized_at: Option<i64>,
}

/// The relation for the batch model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the batch model.
impl ActiveModelBehavior for ActiveModel {}

impl From<&BatchRecord> for ActiveModel {
    fn from(batch: &BatchRecord) -> Self {
        Self {
            index: ActiveValue::Set(batch.index.try_into().expect("index should fit in i64")),
            hash: ActiveValue::Set(batch.hash.to_vec()),
            start_chunk_index: ActiveValue::Set(
                batch.start_chunk_index.try_into().expect("index should fit in i64"),
            ),
            start_chunk_hash: ActiveValue::Set(batch.start_chunk_hash.to_vec()),
            end_chunk_index: ActiveValue::Set(
                batch.end_chunk_index.try_into().expect("index should fit in i64"),
            ),
            end_chunk_hash: ActiveValue::Set(batch.end_chunk_hash.to_vec()),
            parent_batch_hash: ActiveValue::Set(batch.parent_batch_hash.to_vec()),
            codec_version: ActiveValue::Set(batch.codec_version.into()),
            batch_header: ActiveValue::Set(batch.batch_header.to_vec()),
            blob_bytes: ActiveValue::Set(batch.blob_bytes.as_ref().map(|bytes| bytes.to_vec())),
            blob_data_proof: ActiveValue::Set(
                batch.blob_data_proof.as_ref().map(|bytes| bytes.to_vec()),
            ),
            state_root: ActiveValue::Set(batch.state_root.to_vec()),
            withdraw_root: ActiveValue::Set(batch.withdraw_root.to_vec()),
            rollup_status: ActiveValue::Set(batch.rollup_status.into()),
            proving_status: ActiveValue::Set(batch.proving_status.into()),
            oracle_status: ActiveValue::Set(batch.oracle_status.into()),
            commit_tx_hash: ActiveValue::Set(batch.commit_tx_hash.map(|hash| hash.to_vec())),
            finalize_tx_hash: ActiveValue::Set(batch.finalize_tx_hash.map(|hash| hash.to_vec())),
            oracle_tx_hash: ActiveValue::Set(batch.oracle_tx_hash.map(|hash| hash.to_vec())),
            proof: ActiveValue::Set(batch.proof.as_ref().map(|bytes| bytes.to_vec())),
            committed_at: ActiveValue::Set(
                batch.committed_at.map(|at| at.try_into().expect("timestamp should fit in i64")),
            ),
            finalized_at: ActiveValue::Set(
                batch.finalized_at.map(|at| at.try_into().expect("timestamp should fit in i64")),
            ),
        }
    }
}

impl From<Model> for BatchRecord {
    fn from(value: Model) -> Self {
        Self {
            index: value.index as u64,
            hash: B256::from_slice(&value.hash),
            start_chunk_index: value.start_chunk_index as u64,
            start_chunk_hash: B256::from_slice(&value.start_chunk_hash),
            end_chunk_index: value.end_chunk_index as u64,
            end_chunk_hash: B256::from_slice(&value.end_chunk_hash),
            parent_batch_hash: B256::from_slice(&value.parent_batch_hash),
            codec_version: value.codec_version as u8,
            batch_header: value.batch_header.into(),
            blob_bytes: value.blob_bytes.map(Into::into),
            blob_data_proof: value.blob_data_proof.map(Into::into),
            state_root: B256::from_slice(&value.state_root),
            withdraw_root: B256::from_slice(&value.withdraw_root),
            rollup_status: value
                .rollup_status
                .try_into()
                .expect("data persisted in database is valid"),
            proving_status: value
                .proving_status
                .try_into()
                .expect("data persisted in database is valid"),
            oracle_status: value
                .oracle_status
                .try_into()
                .expect("data persisted in database is valid"),
            commit_tx_hash: value.commit_tx_hash.map(|hash| B256::from_slice(&hash)),
            finalize_tx_hash: value.finalize_tx_hash.map(|hash| B256::from_slice(&hash)),
            oracle_tx_hash: value.oracle_tx_hash.map(|hash| B256::from_slice(&hash)),
            proof: value.proof.map(Into::into),
            committed_at: value.committed_at.map(|at| at as u64),
            finalized_at: value.finalized_at.map(|at| at as u64),
        }
    }
}
