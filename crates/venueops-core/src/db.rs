use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use crate::error::CoreError;

pub type DbPool = SqlitePool;

/// Opens (creating if needed) the SQLite database and applies pending migrations.
///
/// Accepts either a `sqlite:` URL or a plain file path.
pub async fn establish_connection(database_url: &str) -> Result<DbPool, CoreError> {
    let pool = connect(database_url).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Opens the pool without touching the schema.
pub async fn connect(database_url: &str) -> Result<DbPool, CoreError> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite://{}", database_url)
    };

    let options = SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    info!(database = %database_url, "connected to database");
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), CoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("database migrations applied");
    Ok(())
}
