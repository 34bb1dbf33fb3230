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
                    .table(L2Block::Table)
                    .if_not_exists()
                    .col(big_integer(L2Block::Number).primary_key())
                    .col(binary_len(L2Block::Hash, HASH_LENGTH))
                    .col(binary_len(L2Block::ParentHash, HASH_LENGTH))
                    .col(big_integer(L2Block::BlockTimestamp))
                    .col(binary_len_null(L2Block::BaseFee, HASH_LENGTH))
                    .col(big_integer(L2Block::GasLimit))
                    .col(binary_len(L2Block::StateRoot, HASH_LENGTH))
                    .col(binary_len(L2Block::WithdrawRoot, HASH_LENGTH))
                    .col(big_integer(L2Block::TxNum))
                    .col(binary(L2Block::Transactions))
                    .col(binary(L2Block::RowConsumption))
                    .col(binary_len_null(L2Block::ChunkHash, HASH_LENGTH))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_l2_block_chunk_hash")
                    .table(L2Block::Table)
                    .col(L2Block::ChunkHash)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(L2Block::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum L2Block {
    Table,
    Number,
    Hash,
    ParentHash,
    BlockTimestamp,
    BaseFee,
    GasLimit,
    StateRoot,
    WithdrawRoot,
    TxNum,
    Transactions,
    RowConsumption,
    ChunkHash,
}
