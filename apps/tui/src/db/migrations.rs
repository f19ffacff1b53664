use sqlx::{migrate::MigrateDatabase, query, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};
use tracing::{debug, info};

/// Creates the `reports` table and its recency index if they don't exist.
pub async fn setup_database(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    query(
        "CREATE TABLE IF NOT EXISTS reports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            photo_url TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )",
    )
    .execute(pool)
    .await?;

    query("CREATE INDEX IF NOT EXISTS reports_created_at_idx ON reports (created_at DESC)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Opens a pool with the connection settings the local store relies on.
/// In-memory databases are per connection, so callers pass
/// `max_connections = 1` for them.
pub async fn connect_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .after_connect(|conn, _| {
            Box::pin(async move {
                use sqlx::Executor as _;
                // WAL keeps readers going while an insert commits
                conn.execute("PRAGMA journal_mode = WAL;").await?;
                conn.execute("PRAGMA synchronous = NORMAL;").await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}

/// Creates the database file if needed, connects and applies the schema.
pub async fn create_database_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = database_url.contains(":memory:");

    if !in_memory && !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!(%database_url, "creating SQLite database");
        Sqlite::create_database(database_url).await?;
    }

    let pool = connect_pool(database_url, if in_memory { 1 } else { 5 }).await?;
    setup_database(&pool).await?;

    debug!(%database_url, "database schema ready");
    Ok(pool)
}
