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
                    .table(L1Block::Table)
                    .if_not_exists()
                    .col(big_integer(L1Block::Number).primary_key())
                    .col(binary_len(L1Block::Hash, HASH_LENGTH))
                    .col(big_integer(L1Block::BaseFee))
                    .col(big_integer(L1Block::BlobBaseFee))
                    .col(small_integer(L1Block::OracleStatus))
                    .col(binary_len_null(L1Block::OracleTxHash, HASH_LENGTH))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(L1Block::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum L1Block {
    Table,
    Number,
    Hash,
    BaseFee,
    BlobBaseFee,
    OracleStatus,
    OracleTxHash,
}
