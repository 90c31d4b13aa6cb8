//! Database layer for the estate backend.

pub mod entities;
pub mod migrations;
pub mod repositories;

use estate_common::{AppError, Config};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, SqlErr};
use std::time::Duration;
use tracing::log::LevelFilter;

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Map a sea-orm error into the application error type.
///
/// Unique constraint violations become `Conflict`.
pub(crate) fn db_err(e: sea_orm::DbErr) -> AppError {
    classify(e.sql_err(), e.to_string())
}

fn classify(sql_err: Option<SqlErr>, message: String) -> AppError {
    match sql_err {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!(detail = %detail, "Unique constraint violation");
            AppError::Conflict("Resource already exists".to_string())
        }
        _ => AppError::Database(message),
    }
}
