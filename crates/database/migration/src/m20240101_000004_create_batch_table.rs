use sea_orm_migration::{prelude::*, schema::*};

const HASH_LENGTH: u32 = 32;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Batch::Table)
                    .if_not_exists()
                    .col(big_integer(Batch::Index).primary_key())
                    .col(binary_len(Batch::Hash, HASH_LENGTH))
                    .col(big_integer(Batch::StartChunkIndex))
                    .col(binary_len(Batch::StartChunkHash, HASH_LENGTH))
                    .col(big_integer(Batch::EndChunkIndex))
                    .col(binary_len(Batch::EndChunkHash, HASH_LENGTH))
                    .col(binary_len(Batch::ParentBatchHash, HASH_LENGTH))
                    .col(small_integer(Batch::CodecVersion))
                    .col(binary(Batch::BatchHeader))
                    .col(binary_null(Batch::BlobBytes))
                    .col(binary_null(Batch::BlobDataProof))
                    .col(binary_len(Batch::StateRoot, HASH_LENGTH))
                    .col(binary_len(Batch::WithdrawRoot, HASH_LENGTH))
                    .col(small_integer(Batch::RollupStatus))
                    .col(small_integer(Batch::ProvingStatus))
                    .col(small_integer(Batch::OracleStatus))
                    .col(binary_len_null(Batch::CommitTxHash, HASH_LENGTH))
                    .col(binary_len_null(Batch::FinalizeTxHash, HASH_LENGTH))
                    .col(binary_len_null(Batch::OracleTxHash, HASH_LENGTH))
                    .col(binary_null(Batch::Proof))
                    .col(big_integer_null(Batch::CommittedAt))
                    .col(big_integer_null(Batch::FinalizedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_batch_rollup_status")
                    .table(Batch::Table)
                    .col(Batch::RollupStatus)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Batch::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Batch {
    Table,
    Index,
    Hash,
    StartChunkIndex,
    StartChunkHash,
    EndChunkIndex,
    EndChunkHash,
    ParentBatchHash,
    CodecVersion,
    BatchHeader,
    BlobBytes,
    BlobDataProof,
    StateRoot,
    WithdrawRoot,
    RollupStatus,
    ProvingStatus,
    OracleStatus,
    CommitTxHash,
    FinalizeTxHash,
    OracleTxHash,
    Proof,
    CommittedAt,
    FinalizedAt,
}
