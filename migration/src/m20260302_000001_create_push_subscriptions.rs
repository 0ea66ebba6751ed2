use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PushSubscriptions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PushSubscriptions::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(PushSubscriptions::UserId).uuid().not_null())
                    // Bounded so (user_id, endpoint) can carry a unique index.
                    .col(ColumnDef::new(PushSubscriptions::Endpoint).string_len(512).not_null())
                    .col(ColumnDef::new(PushSubscriptions::P256dh).string().not_null())
                    .col(ColumnDef::new(PushSubscriptions::Auth).string().not_null())
                    .col(ColumnDef::new(PushSubscriptions::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(PushSubscriptions::UpdatedAt).timestamp_with_time_zone().not_null())
                    .index(
                        Index::create()
                            .name("uq_push_subscriptions_user_endpoint")
                            .table(PushSubscriptions::Table)
                            .col(PushSubscriptions::UserId)
                            .col(PushSubscriptions::Endpoint)
                            .unique()
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PushSubscriptions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PushSubscriptions {
    Table,
    Id,
    UserId,
    Endpoint,
    P256dh,
    Auth,
    CreatedAt,
    UpdatedAt,
}
