use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Trades::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Trades::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Trades::UserId).uuid().not_null())
                    .col(ColumnDef::new(Trades::Symbol).string().not_null())
                    .col(ColumnDef::new(Trades::Direction).string_len(8).not_null())
                    .col(ColumnDef::new(Trades::EntryPrice).double().not_null())
                    .col(ColumnDef::new(Trades::ExitPrice).double().null())
                    .col(ColumnDef::new(Trades::Amount).double().not_null())
                    .col(ColumnDef::new(Trades::Status).string_len(16).not_null().default("open")) // "open", "pending", "closed"
                    .col(ColumnDef::new(Trades::ProfitLoss).double().null())
                    .col(ColumnDef::new(Trades::OpenedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Trades::ClosedAt).timestamp_with_time_zone().null())
                    .index(
                        Index::create()
                            .name("idx_trades_user_opened")
                            .table(Trades::Table)
                            .col(Trades::UserId)
                            .col(Trades::OpenedAt)
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Wallets::UserId).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Wallets::Balance).double().not_null())
                    .col(ColumnDef::new(Wallets::InitialBalance).double().not_null())
                    .col(ColumnDef::new(Wallets::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Wallets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Trades::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Trades {
    Table,
    Id,
    UserId,
    Symbol,
    Direction,
    EntryPrice,
    ExitPrice,
    Amount,
    Status,
    ProfitLoss,
    OpenedAt,
    ClosedAt,
}

#[derive(DeriveIden)]
enum Wallets {
    Table,
    UserId,
    Balance,
    InitialBalance,
    UpdatedAt,
}
