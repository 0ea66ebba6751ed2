use anyhow::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::info;

use crate::entity::{
    favorites, goals, journal_entries, price_alerts, push_subscriptions, signals, trades, wallets,
};

pub async fn get_db_connection(database_url: &str) -> Result<DatabaseConnection> {
    info!("Connecting to database via Sea-ORM");
    let db = Database::connect(database_url).await?;
    Ok(db)
}

/// Create every table straight from the entity definitions.
///
/// Production databases are managed by the `migration` crate; this is for
/// throwaway databases such as the in-memory SQLite used by the test suites.
pub async fn sync_schema(db: &DatabaseConnection) -> Result<()> {
    create_table(db, signals::Entity).await?;
    create_table(db, trades::Entity).await?;
    create_table(db, wallets::Entity).await?;
    create_table(db, push_subscriptions::Entity).await?;
    create_table(db, price_alerts::Entity).await?;
    create_table(db, favorites::Entity).await?;
    create_table(db, journal_entries::Entity).await?;
    create_table(db, goals::Entity).await?;
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<()> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
