use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Error, Result};

/// Schema version this build creates and understands.
pub const SCHEMA_VERSION: u32 = 1;

pub fn index_by_name(store: &str) -> String {
    format!("{store}_by_name")
}

pub fn index_by_created(store: &str) -> String {
    format!("{store}_by_created")
}

/// Create the version bookkeeping table. Safe to call on every open.
pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS meta (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

pub fn current_version(conn: &Connection) -> Result<u32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
}

/// Bring the database up to [`SCHEMA_VERSION`]. The upgrade runs in one
/// transaction, so a half-created collection is never visible.
pub fn migrate(conn: &Connection, store: &str) -> Result<()> {
    let version = current_version(conn)?;
    if version > SCHEMA_VERSION {
        return Err(Error::SchemaTooNew {
            db: version,
            code: SCHEMA_VERSION,
        });
    }
    if version == SCHEMA_VERSION && store_exists(conn, store)? {
        return Ok(());
    }

    let tx = conn.unchecked_transaction()?;
    create_store_v1(&tx, store)?;
    tx.execute(
        "INSERT INTO meta (key, value) VALUES ('schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![SCHEMA_VERSION.to_string()],
    )?;
    tx.commit()?;
    log::info!("initialized photo store {store:?} at schema version {SCHEMA_VERSION}");
    Ok(())
}

fn store_exists(conn: &Connection, store: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![store],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn create_store_v1(conn: &Connection, store: &str) -> Result<()> {
    let by_name = index_by_name(store);
    let by_created = index_by_created(store);
    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS {store} (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            type        TEXT NOT NULL CHECK(length(type) > 0),
            size        INTEGER NOT NULL CHECK(size >= 0),
            created_at  INTEGER NOT NULL,
            blob        BLOB NOT NULL
        );

        CREATE INDEX IF NOT EXISTS {by_name} ON {store}(name);
        CREATE INDEX IF NOT EXISTS {by_created} ON {store}(created_at);
        "
    ))?;
    Ok(())
}
