use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Signals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Signals::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Signals::Asset).string().not_null()) // "EUR/USD OTC"
                    .col(ColumnDef::new(Signals::Timeframe).string_len(8).not_null()) // "M5"
                    .col(ColumnDef::new(Signals::Direction).string_len(8).not_null()) // "call" or "put"
                    .col(ColumnDef::new(Signals::RawMessage).text().not_null())
                    .col(ColumnDef::new(Signals::TelegramMessageId).big_integer().not_null().unique_key())
                    .col(ColumnDef::new(Signals::ChatId).big_integer().null())
                    .col(ColumnDef::new(Signals::EntryTime).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Signals::Status).string_len(16).not_null().default("pending")) // "pending", "executed", "failed"
                    .col(ColumnDef::new(Signals::Result).string_len(8).null()) // "win", "win1", "win2", "loss"
                    .col(ColumnDef::new(Signals::FailureReason).text().null())
                    .col(ColumnDef::new(Signals::ReceivedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Signals::ExecutedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Signals::ResolvedAt).timestamp_with_time_zone().null())
                    .index(
                        Index::create()
                            .name("idx_signals_status_received")
                            .table(Signals::Table)
                            .col(Signals::Status)
                            .col(Signals::ReceivedAt)
                    )
                    .index(
                        Index::create()
                            .name("idx_signals_result_received")
                            .table(Signals::Table)
                            .col(Signals::Result)
                            .col(Signals::ReceivedAt)
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Signals::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Signals {
    Table,
    Id,
    Asset,
    Timeframe,
    Direction,
    RawMessage,
    TelegramMessageId,
    ChatId,
    EntryTime,
    Status,
    Result,
    FailureReason,
    ReceivedAt,
    ExecutedAt,
    ResolvedAt,
}
