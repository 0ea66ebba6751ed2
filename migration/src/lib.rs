pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_signals;
mod m20260301_000002_create_trades_and_wallets;
mod m20260302_000001_create_push_subscriptions;
mod m20260302_000002_create_price_alerts;
mod m20260303_000001_create_favorites_journal_goals;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_signals::Migration),
            Box::new(m20260301_000002_create_trades_and_wallets::Migration),
            Box::new(m20260302_000001_create_push_subscriptions::Migration),
            Box::new(m20260302_000002_create_price_alerts::Migration),
            Box::new(m20260303_000001_create_favorites_journal_goals::Migration),
        ]
    }
}
