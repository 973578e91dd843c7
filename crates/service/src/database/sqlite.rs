use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use super::DatabaseSetupError;

pub(super) async fn connect_sqlite(url: &url::Url) -> Result<SqlitePool, DatabaseSetupError> {
    let options = SqliteConnectOptions::from_str(url.as_str())
        .map_err(|e| DatabaseSetupError::InvalidUrl(e.to_string()))?
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    // every connection to an in-memory database is its own database,
    //  so keep exactly one alive for the lifetime of the pool
    let pool = if is_in_memory(url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(
                options
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal),
            )
            .await
    }
    .map_err(DatabaseSetupError::Unavailable)?;

    tracing::debug!(url = %url, "connected to sqlite");
    Ok(pool)
}

pub(super) async fn migrate_sqlite(pool: &SqlitePool) -> Result<(), DatabaseSetupError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(DatabaseSetupError::MigrationFailed)
}

fn is_in_memory(url: &url::Url) -> bool {
    url.path().contains(":memory:") || url.query().is_some_and(|q| q.contains("mode=memory"))
}
