use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CoinRaw::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CoinRaw::CoinId).string().not_null())
                    .col(ColumnDef::new(CoinRaw::Date).date().not_null())
                    .col(ColumnDef::new(CoinRaw::Price).double().not_null())
                    .col(ColumnDef::new(CoinRaw::Response).json().not_null())
                    // One snapshot per coin per day; duplicate inserts fail on this key
                    .primary_key(
                        Index::create()
                            .name("pk_coin_raw")
                            .col(CoinRaw::CoinId)
                            .col(CoinRaw::Date),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CoinRaw::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CoinRaw {
    Table,
    CoinId,
    Date,
    Price,
    Response,
}
