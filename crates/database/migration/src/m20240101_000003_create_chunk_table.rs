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
                    .table(Chunk::Table)
                    .if_not_exists()
                    .col(big_integer(Chunk::Index).primary_key())
                    .col(binary_len(Chunk::Hash, HASH_LENGTH))
                    .col(big_integer(Chunk::StartBlockNumber))
                    .col(big_integer(Chunk::EndBlockNumber))
                    .col(big_integer(Chunk::TotalL1MessagesPoppedBefore))
                    .col(big_integer(Chunk::TotalL1MessagesPoppedInChunk))
                    .col(big_integer(Chunk::StartBlockTimestamp))
                    .col(big_integer(Chunk::TxNum))
                    .col(big_integer(Chunk::MaxRowConsumption))
                    .col(big_integer(Chunk::L1CommitGas))
                    .col(big_integer(Chunk::L1CommitCalldataSize))
                    .col(big_integer(Chunk::L1CommitBlobSize))
                    .col(binary_len(Chunk::ParentChunkHash, HASH_LENGTH))
                    .col(small_integer(Chunk::CodecVersion))
                    .col(small_integer(Chunk::ProvingStatus))
                    .col(binary_len_null(Chunk::BatchHash, HASH_LENGTH))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_chunk_batch_hash")
                    .table(Chunk::Table)
                    .col(Chunk::BatchHash)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Chunk::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Chunk {
    Table,
    Index,
    Hash,
    StartBlockNumber,
    EndBlockNumber,
    TotalL1MessagesPoppedBefore,
    TotalL1MessagesPoppedInChunk,
    StartBlockTimestamp,
    TxNum,
    MaxRowConsumption,
    L1CommitGas,
    L1CommitCalldataSize,
    L1CommitBlobSize,
    ParentChunkHash,
    CodecVersion,
    ProvingStatus,
    BatchHash,
}
