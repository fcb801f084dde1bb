//! Database layer for the webhook sink: entities, migrations, connection helpers

pub mod entities;
pub mod migrator;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

/// Open a connection pool to the given database URL.
///
/// Supports Postgres ("postgres://...") and SQLite ("sqlite://./sink.db?mode=rwc",
/// "sqlite::memory:").
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;
    info!("Connected to database ({:?})", db.get_database_backend());
    Ok(db)
}

/// Apply all pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    migrator::Migrator::up(db, None).await
}
