use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CoinAggregated::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CoinAggregated::CoinId).string().not_null())
                    // First calendar day of the month
                    .col(ColumnDef::new(CoinAggregated::YearMonth).date().not_null())
                    .col(ColumnDef::new(CoinAggregated::MaxPrice).double().not_null())
                    .col(ColumnDef::new(CoinAggregated::MinPrice).double().not_null())
                    .primary_key(
                        Index::create()
                            .name("pk_coin_aggregated")
                            .col(CoinAggregated::CoinId)
                            .col(CoinAggregated::YearMonth),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CoinAggregated::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CoinAggregated {
    Table,
    CoinId,
    YearMonth,
    MaxPrice,
    MinPrice,
}
