use super::{models, DatabaseError};
use crate::DatabaseConnectionProvider;

use alloy_primitives::B256;
use rollup_relayer_primitives::{
    BatchRecord, ChunkRecord, GasOracleStatus, L1BlockRecord, L2Block, RollupStatus,
};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// The metadata key holding the highest L1 block whose rollup contract events
/// have been applied.
const L1_EVENT_SCAN_HEIGHT_KEY: &str = "l1_event_scan_height";

/// The [`DatabaseOperations`] trait provides methods for interacting with the database.
#[async_trait::async_trait]
pub trait DatabaseOperations: DatabaseConnectionProvider {
    /// Insert a window of L2 blocks into the database.
    async fn insert_l2_blocks(&self, blocks: &[L2Block]) -> Result<(), DatabaseError> {
        if blocks.is_empty() {
            return Ok(());
        }
        tracing::trace!(
            target: "rollup::db",
            start = blocks.first().map(|block| block.header.number),
            end = blocks.last().map(|block| block.header.number),
            "inserting L2 blocks into database"
        );
        let blocks = blocks.iter().map(models::l2_block::ActiveModel::from);
        models::l2_block::Entity::insert_many(blocks).exec(self.get_connection()).await?;
        Ok(())
    }

    /// Get the highest stored L2 block number.
    async fn get_latest_l2_block_number(&self) -> Result<Option<u64>, DatabaseError> {
        Ok(models::l2_block::Entity::find()
            .order_by_desc(models::l2_block::Column::Number)
            .select_only()
            .column(models::l2_block::Column::Number)
            .into_tuple::<i64>()
            .one(self.get_connection())
            .await?
            .map(|number| number as u64))
    }

    /// Get up to `limit` blocks that are not yet part of a chunk, ascending
    /// by block number.
    async fn get_unchunked_blocks(&self, limit: u64) -> Result<Vec<L2Block>, DatabaseError> {
        Ok(models::l2_block::Entity::find()
            .filter(models::l2_block::Column::ChunkHash.is_null())
            .order_by_asc(models::l2_block::Column::Number)
            .limit(limit)
            .all(self.get_connection())
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Get the inclusive block range `[start, end]`, erroring when a block of
    /// the range is missing.
    async fn get_l2_blocks_in_range(
        &self,
        start: u64,
        end: u64,
    ) -> Result<Vec<L2Block>, DatabaseError> {
        let blocks: Vec<L2Block> = models::l2_block::Entity::find()
            .filter(models::l2_block::Column::Number.between(start as i64, end as i64))
            .order_by_asc(models::l2_block::Column::Number)
            .all(self.get_connection())
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        if blocks.len() as u64 != end - start + 1 {
            return Err(DatabaseError::IncompleteBlockRange { start, end });
        }
        Ok(blocks)
    }

    /// Stamp the chunk hash on the blocks of the inclusive range `[start, end]`.
    async fn set_chunk_hash_for_blocks(
        &self,
        start: u64,
        end: u64,
        chunk_hash: B256,
    ) -> Result<(), DatabaseError> {
        models::l2_block::Entity::update_many()
            .col_expr(models::l2_block::Column::ChunkHash, Expr::value(chunk_hash.to_vec()))
            .filter(models::l2_block::Column::Number.between(start as i64, end as i64))
            .exec(self.get_connection())
            .await?;
        Ok(())
    }

    /// Insert a chunk row into the database.
    async fn insert_chunk(&self, chunk: &ChunkRecord) -> Result<(), DatabaseError> {
        tracing::trace!(
            target: "rollup::db",
            chunk_index = chunk.index,
            chunk_hash = ?chunk.hash,
            "inserting chunk into database"
        );
        let chunk: models::chunk::ActiveModel = chunk.into();
        chunk.insert(self.get_connection()).await?;
        Ok(())
    }

    /// Get the newest chunk row.
    async fn get_latest_chunk(&self) -> Result<Option<ChunkRecord>, DatabaseError> {
        Ok(models::chunk::Entity::find()
            .order_by_desc(models::chunk::Column::Index)
            .one(self.get_connection())
            .await?
            .map(Into::into))
    }

    /// Get up to `limit` chunks that are not yet part of a batch, ascending
    /// by chunk index.
    async fn get_unbatched_chunks(&self, limit: u64) -> Result<Vec<ChunkRecord>, DatabaseError> {
        Ok(models::chunk::Entity::find()
            .filter(models::chunk::Column::BatchHash.is_null())
            .order_by_asc(models::chunk::Column::Index)
            .limit(limit)
            .all(self.get_connection())
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Get the inclusive chunk range `[start, end]`, erroring when a chunk of
    /// the range is missing.
    async fn get_chunks_in_range(
        &self,
        start: u64,
        end: u64,
    ) -> Result<Vec<ChunkRecord>, DatabaseError> {
        let chunks: Vec<ChunkRecord> = models::chunk::Entity::find()
            .filter(models::chunk::Column::Index.between(start as i64, end as i64))
            .order_by_asc(models::chunk::Column::Index)
            .all(self.get_connection())
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        if chunks.len() as u64 != end - start + 1 {
            return Err(DatabaseError::IncompleteChunkRange { start, end });
        }
        Ok(chunks)
    }

    /// Stamp the batch hash on the chunks of the inclusive range `[start, end]`.
    async fn set_batch_hash_for_chunks(
        &self,
        start: u64,
        end: u64,
        batch_hash: B256,
    ) -> Result<(), DatabaseError> {
        models::chunk::Entity::update_many()
            .col_expr(models::chunk::Column::BatchHash, Expr::value(batch_hash.to_vec()))
            .filter(models::chunk::Column::Index.between(start as i64, end as i64))
            .exec(self.get_connection())
            .await?;
        Ok(())
    }

    /// Insert a batch row into the database.
    async fn insert_batch(&self, batch: &BatchRecord) -> Result<(), DatabaseError> {
        tracing::trace!(
            target: "rollup::db",
            batch_index = batch.index,
            batch_hash = ?batch.hash,
            "inserting batch into database"
        );
        let batch: models::batch::ActiveModel = batch.into();
        batch.insert(self.get_connection()).await?;
        Ok(())
    }

    /// Get the newest batch row.
    async fn get_latest_batch(&self) -> Result<Option<BatchRecord>, DatabaseError> {
        Ok(models::batch::Entity::find()
            .order_by_desc(models::batch::Column::Index)
            .one(self.get_connection())
            .await?
            .map(Into::into))
    }

    /// Get a batch row by its index.
    async fn get_batch_by_index(&self, index: u64) -> Result<Option<BatchRecord>, DatabaseError> {
        Ok(models::batch::Entity::find_by_id(
            TryInto::<i64>::try_into(index).expect("index should fit in i64"),
        )
        .one(self.get_connection())
        .await?
        .map(Into::into))
    }

    /// Get a batch row by its hash.
    async fn get_batch_by_hash(&self, hash: B256) -> Result<Option<BatchRecord>, DatabaseError> {
        Ok(models::batch::Entity::find()
            .filter(models::batch::Column::Hash.eq(hash.to_vec()))
            .one(self.get_connection())
            .await?
            .map(Into::into))
    }

    /// Get up to `limit` batches whose rollup status is one of `statuses`,
    /// ascending by batch index.
    async fn get_batches_by_rollup_status(
        &self,
        statuses: &[RollupStatus],
        limit: u64,
    ) -> Result<Vec<BatchRecord>, DatabaseError> {
        Ok(models::batch::Entity::find()
            .filter(
                models::batch::Column::RollupStatus
                    .is_in(statuses.iter().map(|status| i16::from(*status))),
            )
            .order_by_asc(models::batch::Column::Index)
            .limit(limit)
            .all(self.get_connection())
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Get the newest batch whose gas oracle status is pending.
    async fn get_latest_oracle_pending_batch(&self) -> Result<Option<BatchRecord>, DatabaseError> {
        Ok(models::batch::Entity::find()
            .filter(
                models::batch::Column::OracleStatus.eq(i16::from(GasOracleStatus::Pending)),
            )
            .order_by_desc(models::batch::Column::Index)
            .one(self.get_connection())
            .await?
            .map(Into::into))
    }

    /// Guarded transition to `Committing`, recording the commit transaction
    /// hash. Returns false when the batch was not awaiting a commit.
    async fn set_batch_committing(
        &self,
        hash: B256,
        tx_hash: B256,
    ) -> Result<bool, DatabaseError> {
        let result = models::batch::Entity::update_many()
            .col_expr(
                models::batch::Column::RollupStatus,
                Expr::value(i16::from(RollupStatus::Committing)),
            )
            .col_expr(models::batch::Column::CommitTxHash, Expr::value(Some(tx_hash.to_vec())))
            .filter(models::batch::Column::Hash.eq(hash.to_vec()))
            .filter(models::batch::Column::RollupStatus.is_in([
                i16::from(RollupStatus::Pending),
                i16::from(RollupStatus::CommitFailed),
            ]))
            .exec(self.get_connection())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Guarded transition to `Committed`, applied when the commit event is
    /// observed on L1.
    async fn set_batch_committed(
        &self,
        hash: B256,
        tx_hash: B256,
        committed_at: u64,
    ) -> Result<bool, DatabaseError> {
        let result = models::batch::Entity::update_many()
            .col_expr(
                models::batch::Column::RollupStatus,
                Expr::value(i16::from(RollupStatus::Committed)),
            )
            .col_expr(models::batch::Column::CommitTxHash, Expr::value(Some(tx_hash.to_vec())))
            .col_expr(
                models::batch::Column::CommittedAt,
                Expr::value(Some(
                    TryInto::<i64>::try_into(committed_at).expect("timestamp should fit in i64"),
                )),
            )
            .filter(models::batch::Column::Hash.eq(hash.to_vec()))
            .filter(models::batch::Column::RollupStatus.is_in([
                i16::from(RollupStatus::Pending),
                i16::from(RollupStatus::Committing),
            ]))
            .exec(self.get_connection())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Guarded transition to `Finalizing`, recording the finalize transaction
    /// hash.
    async fn set_batch_finalizing(
        &self,
        hash: B256,
        tx_hash: B256,
    ) -> Result<bool, DatabaseError> {
        let result = models::batch::Entity::update_many()
            .col_expr(
                models::batch::Column::RollupStatus,
                Expr::value(i16::from(RollupStatus::Finalizing)),
            )
            .col_expr(models::batch::Column::FinalizeTxHash, Expr::value(Some(tx_hash.to_vec())))
            .filter(models::batch::Column::Hash.eq(hash.to_vec()))
            .filter(models::batch::Column::RollupStatus.is_in([
                i16::from(RollupStatus::Committed),
                i16::from(RollupStatus::FinalizeFailed),
            ]))
            .exec(self.get_connection())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Guarded transition to `Finalized`, applied when the finalize event is
    /// observed on L1. A `Committed` source state is admitted for proofless
    /// configurations.
    async fn set_batch_finalized(
        &self,
        hash: B256,
        tx_hash: B256,
        finalized_at: u64,
    ) -> Result<bool, DatabaseError> {
        let result = models::batch::Entity::update_many()
            .col_expr(
                models::batch::Column::RollupStatus,
                Expr::value(i16::from(RollupStatus::Finalized)),
            )
            .col_expr(models::batch::Column::FinalizeTxHash, Expr::value(Some(tx_hash.to_vec())))
            .col_expr(
                models::batch::Column::FinalizedAt,
                Expr::value(Some(
                    TryInto::<i64>::try_into(finalized_at).expect("timestamp should fit in i64"),
                )),
            )
            .filter(models::batch::Column::Hash.eq(hash.to_vec()))
            .filter(models::batch::Column::RollupStatus.is_in([
                i16::from(RollupStatus::Committed),
                i16::from(RollupStatus::Finalizing),
            ]))
            .exec(self.get_connection())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Guarded transition to the terminal `Reverted` state.
    async fn set_batch_reverted(&self, hash: B256) -> Result<bool, DatabaseError> {
        let result = models::batch::Entity::update_many()
            .col_expr(
                models::batch::Column::RollupStatus,
                Expr::value(i16::from(RollupStatus::Reverted)),
            )
            .filter(models::batch::Column::Hash.eq(hash.to_vec()))
            .filter(models::batch::Column::RollupStatus.is_in([
                i16::from(RollupStatus::Committing),
                i16::from(RollupStatus::Committed),
                i16::from(RollupStatus::Finalizing),
            ]))
            .exec(self.get_connection())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Guarded transition to `CommitFailed`, applied when the commit
    /// transaction confirms as failed. The commit loop retries such batches.
    async fn set_batch_commit_failed(&self, hash: B256) -> Result<bool, DatabaseError> {
        let result = models::batch::Entity::update_many()
            .col_expr(
                models::batch::Column::RollupStatus,
                Expr::value(i16::from(RollupStatus::CommitFailed)),
            )
            .filter(models::batch::Column::Hash.eq(hash.to_vec()))
            .filter(
                models::batch::Column::RollupStatus.eq(i16::from(RollupStatus::Committing)),
            )
            .exec(self.get_connection())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Guarded transition to `FinalizeFailed`, applied when the finalize
    /// transaction confirms as failed.
    async fn set_batch_finalize_failed(&self, hash: B256) -> Result<bool, DatabaseError> {
        let result = models::batch::Entity::update_many()
            .col_expr(
                models::batch::Column::RollupStatus,
                Expr::value(i16::from(RollupStatus::FinalizeFailed)),
            )
            .filter(models::batch::Column::Hash.eq(hash.to_vec()))
            .filter(
                models::batch::Column::RollupStatus.eq(i16::from(RollupStatus::Finalizing)),
            )
            .exec(self.get_connection())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Update the proving status of a batch. The proving lifecycle is driven
    /// by an external prover, only its terminal gate matters here.
    async fn update_batch_proving_status(
        &self,
        hash: B256,
        status: rollup_relayer_primitives::ProvingStatus,
    ) -> Result<(), DatabaseError> {
        models::batch::Entity::update_many()
            .col_expr(models::batch::Column::ProvingStatus, Expr::value(i16::from(status)))
            .filter(models::batch::Column::Hash.eq(hash.to_vec()))
            .exec(self.get_connection())
            .await?;
        Ok(())
    }

    /// Guarded transition of the batch gas oracle status to `Importing`,
    /// recording the oracle transaction hash.
    async fn set_batch_oracle_importing(
        &self,
        hash: B256,
        tx_hash: B256,
    ) -> Result<bool, DatabaseError> {
        let result = models::batch::Entity::update_many()
            .col_expr(
                models::batch::Column::OracleStatus,
                Expr::value(i16::from(GasOracleStatus::Importing)),
            )
            .col_expr(models::batch::Column::OracleTxHash, Expr::value(Some(tx_hash.to_vec())))
            .filter(models::batch::Column::Hash.eq(hash.to_vec()))
            .filter(
                models::batch::Column::OracleStatus.eq(i16::from(GasOracleStatus::Pending)),
            )
            .exec(self.get_connection())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Guarded terminal transition of the batch gas oracle status, to
    /// `Imported` on success and `Failed` otherwise.
    async fn set_batch_oracle_terminal(
        &self,
        hash: B256,
        success: bool,
    ) -> Result<bool, DatabaseError> {
        let status =
            if success { GasOracleStatus::Imported } else { GasOracleStatus::Failed };
        let result = models::batch::Entity::update_many()
            .col_expr(models::batch::Column::OracleStatus, Expr::value(i16::from(status)))
            .filter(models::batch::Column::Hash.eq(hash.to_vec()))
            .filter(
                models::batch::Column::OracleStatus.eq(i16::from(GasOracleStatus::Importing)),
            )
            .exec(self.get_connection())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Insert a window of L1 blocks into the database.
    async fn insert_l1_blocks(&self, blocks: Vec<L1BlockRecord>) -> Result<(), DatabaseError> {
        if blocks.is_empty() {
            return Ok(());
        }
        let blocks = blocks.into_iter().map(models::l1_block::ActiveModel::from);
        models::l1_block::Entity::insert_many(blocks).exec(self.get_connection()).await?;
        Ok(())
    }

    /// Get the highest stored L1 block number.
    async fn get_latest_l1_block_number(&self) -> Result<Option<u64>, DatabaseError> {
        Ok(models::l1_block::Entity::find()
            .order_by_desc(models::l1_block::Column::Number)
            .select_only()
            .column(models::l1_block::Column::Number)
            .into_tuple::<i64>()
            .one(self.get_connection())
            .await?
            .map(|number| number as u64))
    }

    /// Get an L1 block row by its number.
    async fn get_l1_block(&self, number: u64) -> Result<Option<L1BlockRecord>, DatabaseError> {
        Ok(models::l1_block::Entity::find_by_id(
            TryInto::<i64>::try_into(number).expect("block number should fit in i64"),
        )
        .one(self.get_connection())
        .await?
        .map(Into::into))
    }

    /// Get the newest L1 block whose gas oracle status is pending.
    async fn get_latest_oracle_pending_l1_block(
        &self,
    ) -> Result<Option<L1BlockRecord>, DatabaseError> {
        Ok(models::l1_block::Entity::find()
            .filter(
                models::l1_block::Column::OracleStatus.eq(i16::from(GasOracleStatus::Pending)),
            )
            .order_by_desc(models::l1_block::Column::Number)
            .one(self.get_connection())
            .await?
            .map(Into::into))
    }

    /// Guarded transition of an L1 block gas oracle status to `Importing`,
    /// recording the oracle transaction hash.
    async fn set_l1_oracle_importing(
        &self,
        number: u64,
        tx_hash: B256,
    ) -> Result<bool, DatabaseError> {
        let result = models::l1_block::Entity::update_many()
            .col_expr(
                models::l1_block::Column::OracleStatus,
                Expr::value(i16::from(GasOracleStatus::Importing)),
            )
            .col_expr(models::l1_block::Column::OracleTxHash, Expr::value(Some(tx_hash.to_vec())))
            .filter(models::l1_block::Column::Number.eq(number as i64))
            .filter(
                models::l1_block::Column::OracleStatus.eq(i16::from(GasOracleStatus::Pending)),
            )
            .exec(self.get_connection())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Guarded terminal transition of an L1 block gas oracle status.
    async fn set_l1_oracle_terminal(
        &self,
        number: u64,
        success: bool,
    ) -> Result<bool, DatabaseError> {
        let status =
            if success { GasOracleStatus::Imported } else { GasOracleStatus::Failed };
        let result = models::l1_block::Entity::update_many()
            .col_expr(models::l1_block::Column::OracleStatus, Expr::value(i16::from(status)))
            .filter(models::l1_block::Column::Number.eq(number as i64))
            .filter(
                models::l1_block::Column::OracleStatus.eq(i16::from(GasOracleStatus::Importing)),
            )
            .exec(self.get_connection())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Get the highest L1 block whose rollup contract events have been
    /// applied.
    async fn get_l1_event_scan_height(&self) -> Result<Option<u64>, DatabaseError> {
        Ok(models::metadata::Entity::find_by_id(L1_EVENT_SCAN_HEIGHT_KEY.to_owned())
            .one(self.get_connection())
            .await?
            .map(|row| row.value.parse().expect("data persisted in database is valid")))
    }

    /// Advance the L1 event scan watermark.
    async fn set_l1_event_scan_height(&self, number: u64) -> Result<(), DatabaseError> {
        let row = models::metadata::ActiveModel {
            key: ActiveValue::Set(L1_EVENT_SCAN_HEIGHT_KEY.to_owned()),
            value: ActiveValue::Set(number.to_string()),
        };
        models::metadata::Entity::insert(row)
            .on_conflict(
                OnConflict::column(models::metadata::Column::Key)
                    .update_column(models::metadata::Column::Value)
                    .to_owned(),
            )
            .exec(self.get_connection())
            .await?;
        Ok(())
    }
}

impl<T: DatabaseConnectionProvider + Sync> DatabaseOperations for T {}
