use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Favorites::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Favorites::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Favorites::UserId).uuid().not_null())
                    .col(ColumnDef::new(Favorites::Symbol).string().not_null())
                    .col(ColumnDef::new(Favorites::CreatedAt).timestamp_with_time_zone().not_null())
                    .index(
                        Index::create()
                            .name("uq_favorites_user_symbol")
                            .table(Favorites::Table)
                            .col(Favorites::UserId)
                            .col(Favorites::Symbol)
                            .unique()
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JournalEntries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(JournalEntries::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(JournalEntries::UserId).uuid().not_null())
                    .col(ColumnDef::new(JournalEntries::Symbol).string().not_null())
                    .col(ColumnDef::new(JournalEntries::Direction).string_len(8).not_null())
                    .col(ColumnDef::new(JournalEntries::EntryPrice).double().not_null())
                    .col(ColumnDef::new(JournalEntries::ExitPrice).double().null())
                    .col(ColumnDef::new(JournalEntries::Amount).double().null())
                    .col(ColumnDef::new(JournalEntries::Outcome).string_len(8).null())
                    .col(ColumnDef::new(JournalEntries::Notes).text().null())
                    .col(ColumnDef::new(JournalEntries::CreatedAt).timestamp_with_time_zone().not_null())
                    .index(
                        Index::create()
                            .name("idx_journal_user_created")
                            .table(JournalEntries::Table)
                            .col(JournalEntries::UserId)
                            .col(JournalEntries::CreatedAt)
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Goals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Goals::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Goals::UserId).uuid().not_null())
                    .col(ColumnDef::new(Goals::Title).string().not_null())
                    .col(ColumnDef::new(Goals::TargetAmount).double().not_null())
                    .col(ColumnDef::new(Goals::CurrentAmount).double().not_null().default(0.0))
                    .col(ColumnDef::new(Goals::Deadline).date().null())
                    .col(ColumnDef::new(Goals::Achieved).boolean().not_null().default(false))
                    .col(ColumnDef::new(Goals::CreatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Goals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Favorites::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Favorites {
    Table,
    Id,
    UserId,
    Symbol,
    CreatedAt,
}

#[derive(DeriveIden)]
enum JournalEntries {
    Table,
    Id,
    UserId,
    Symbol,
    Direction,
    EntryPrice,
    ExitPrice,
    Amount,
    Outcome,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Goals {
    Table,
    Id,
    UserId,
    Title,
    TargetAmount,
    CurrentAmount,
    Deadline,
    Achieved,
    CreatedAt,
}
