//! The forum database pool.
//!
//! Every pooled connection enforces foreign keys (posts cascade with their
//! author) and waits up to [`BUSY_TIMEOUT`] for a competing writer. File
//! databases run in WAL mode so readers rendering posts do not block
//! registrations.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::time::Duration;
use thiserror::Error;

/// How long a connection waits on a locked database before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool size used when the configuration does not set one.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 8;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("database pool needs at least one connection")]
    NoConnections,

    #[error("failed to open database pool: {0}")]
    Open(#[from] r2d2::Error),
}

fn prepare_connection(conn: &mut Connection, wal: bool) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update(None, "foreign_keys", true)?;
    if wal {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") {
            tracing::warn!(journal_mode = %mode, "database refused WAL mode");
        }
    }
    Ok(())
}

/// Opens (creating if needed) the database file at `path`.
pub fn open_pool(path: &str, max_connections: u32) -> Result<DbPool, PoolError> {
    if max_connections == 0 {
        return Err(PoolError::NoConnections);
    }
    let manager =
        SqliteConnectionManager::file(path).with_init(|conn| prepare_connection(conn, true));
    let pool = Pool::builder().max_size(max_connections).build(manager)?;
    tracing::debug!(path, max_connections, "database pool ready");
    Ok(pool)
}

/// A single-connection in-memory database, for tests and throwaway runs.
///
/// SQLite gives each in-memory connection its own database, so the pool is
/// capped at one connection to keep every caller on the same data.
pub fn open_memory_pool() -> Result<DbPool, PoolError> {
    let manager =
        SqliteConnectionManager::memory().with_init(|conn| prepare_connection(conn, false));
    Ok(Pool::builder().max_size(1).build(manager)?)
}
