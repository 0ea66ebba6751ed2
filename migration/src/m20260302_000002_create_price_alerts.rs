use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PriceAlerts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PriceAlerts::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(PriceAlerts::UserId).uuid().not_null())
                    .col(ColumnDef::new(PriceAlerts::Symbol).string().not_null())
                    .col(ColumnDef::new(PriceAlerts::TargetPrice).double().not_null())
                    .col(ColumnDef::new(PriceAlerts::Condition).string_len(8).not_null()) // "above" or "below"
                    .col(ColumnDef::new(PriceAlerts::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(PriceAlerts::TriggeredAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(PriceAlerts::CreatedAt).timestamp_with_time_zone().not_null())
                    .index(
                        Index::create()
                            .name("idx_price_alerts_symbol_active")
                            .table(PriceAlerts::Table)
                            .col(PriceAlerts::Symbol)
                            .col(PriceAlerts::IsActive)
                    )
                    .index(
                        Index::create()
                            .name("idx_price_alerts_user")
                            .table(PriceAlerts::Table)
                            .col(PriceAlerts::UserId)
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PriceAlerts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PriceAlerts {
    Table,
    Id,
    UserId,
    Symbol,
    TargetPrice,
    Condition,
    IsActive,
    TriggeredAt,
    CreatedAt,
}
