use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use crate::error::{AppError, Result};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

pub fn create_pool(database_url: &str) -> std::result::Result<DbPool, r2d2::Error> {
    let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);
    // Remove query parameters (e.g., ?mode=rwc)
    let path = path.split('?').next().unwrap_or(path);

    let manager = if path == ":memory:" {
        SqliteConnectionManager::memory()
    } else {
        SqliteConnectionManager::file(Path::new(path))
    }
    .with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));

    Pool::builder().max_size(5).build(manager)
}

pub fn create_memory_pool() -> std::result::Result<DbPool, r2d2::Error> {
    let manager =
        SqliteConnectionManager::memory().with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));
    Pool::builder().max_size(1).build(manager)
}

/// Run a blocking closure against a pooled connection off the async executor.
pub async fn interact<F, T>(pool: &DbPool, f: F) -> Result<T>
where
    F: FnOnce(&DbConnection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool.get()?;
        f(&conn)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?
}
