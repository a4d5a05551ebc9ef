pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

use crate::config::GalleryConfig;
use crate::domain::{NewPhoto, PhotoRecord};
use crate::error::{Error, Result};

const COLUMNS: &str = "id, name, type, size, created_at, blob";

/// Access mode of a store transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

impl TxMode {
    fn behavior(self) -> TransactionBehavior {
        match self {
            TxMode::ReadOnly => TransactionBehavior::Deferred,
            TxMode::ReadWrite => TransactionBehavior::Immediate,
        }
    }

    fn failure(self, op: &'static str, err: rusqlite::Error) -> Error {
        match self {
            TxMode::ReadOnly => Error::Database(err),
            TxMode::ReadWrite => Error::write(op, err),
        }
    }
}

/// SQLite-backed photo collection: one table, auto-incrementing keys,
/// and two non-unique indexes (`by_name`, `by_created`) kept by the engine.
///
/// Every operation runs in exactly one transaction. An operation only
/// reports success once its transaction has committed.
pub struct PhotoStore {
    conn: Connection,
    name: String,
    location: Option<PathBuf>,
}

impl PhotoStore {
    /// Open (or create) the collection described by `config`.
    pub fn open(config: &GalleryConfig) -> Result<Self> {
        config.validate()?;
        let location = config.database_path.clone();
        let conn = match &location {
            Some(path) => open_file(path)?,
            None => Connection::open_in_memory().map_err(|e| unavailable(Path::new(":memory:"), e))?,
        };

        let display_path = location.clone().unwrap_or_else(|| PathBuf::from(":memory:"));
        schema::initialize(&conn).map_err(|e| unavailable(&display_path, e))?;
        match schema::migrate(&conn, &config.store_name) {
            Ok(()) => {}
            Err(e @ Error::SchemaTooNew { .. }) => return Err(e),
            Err(e) => return Err(unavailable(&display_path, e)),
        }

        log::info!(
            "opened photo store {:?} at {}",
            config.store_name,
            display_path.display()
        );
        Ok(Self {
            conn,
            name: config.store_name.clone(),
            location,
        })
    }

    /// Open an in-memory store with the default collection name (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&GalleryConfig::in_memory())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Database file, or `None` for an in-memory store.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Run `f` inside one transaction on the collection. The result is
    /// returned only after `COMMIT` succeeds; any error rolls everything back.
    pub fn with_store<T, F>(&self, mode: TxMode, op: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = Transaction::new_unchecked(&self.conn, mode.behavior())
            .map_err(|e| mode.failure(op, e))?;
        log::debug!("{op}: {mode:?} transaction on {:?}", self.name);

        let value = match f(&tx) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("{op}: rolling back: {err}");
                return Err(match (mode, err) {
                    (TxMode::ReadWrite, Error::Database(e)) => Error::write(op, e),
                    (_, e) => e,
                });
            }
        };

        tx.commit().map_err(|e| mode.failure(op, e))?;
        log::debug!("{op}: committed");
        Ok(value)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Persist one record and return its store-assigned id.
    pub fn add(&self, photo: &NewPhoto) -> Result<i64> {
        self.with_store(TxMode::ReadWrite, "add", |tx| {
            insert(tx, &self.name, "add", photo)
        })
    }

    /// Persist a batch in a single transaction. All or nothing: if any
    /// record fails, none of the batch is kept.
    pub fn bulk_add(&self, photos: &[NewPhoto]) -> Result<Vec<i64>> {
        self.with_store(TxMode::ReadWrite, "bulk_add", |tx| {
            let mut ids = Vec::with_capacity(photos.len());
            for photo in photos {
                ids.push(insert(tx, &self.name, "bulk_add", photo)?);
            }
            Ok(ids)
        })
    }

    /// Remove the record with `id`. Returns false (not an error) if absent.
    pub fn delete(&self, id: i64) -> Result<bool> {
        self.with_store(TxMode::ReadWrite, "delete", |tx| {
            let removed = tx.execute(
                &format!("DELETE FROM {} WHERE id = ?1", self.name),
                params![id],
            )?;
            Ok(removed > 0)
        })
    }

    /// Remove every record atomically. Returns how many were removed.
    /// Key allocation is not reset, so cleared ids are never handed out again.
    pub fn clear(&self) -> Result<usize> {
        let removed = self.with_store(TxMode::ReadWrite, "clear", |tx| {
            Ok(tx.execute(&format!("DELETE FROM {}", self.name), [])?)
        })?;
        log::info!("cleared {removed} photos from {:?}", self.name);
        Ok(removed)
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Every record in ascending id order, materialized at call time.
    pub fn all(&self) -> Result<Vec<PhotoRecord>> {
        self.with_store(TxMode::ReadOnly, "all", |tx| {
            let mut stmt = tx.prepare(&format!("SELECT {COLUMNS} FROM {} ORDER BY id", self.name))?;
            let records = stmt
                .query_map([], record_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(records)
        })
    }

    pub fn get(&self, id: i64) -> Result<Option<PhotoRecord>> {
        self.with_store(TxMode::ReadOnly, "get", |tx| {
            let record = tx
                .query_row(
                    &format!("SELECT {COLUMNS} FROM {} WHERE id = ?1", self.name),
                    params![id],
                    record_from_row,
                )
                .optional()?;
            Ok(record)
        })
    }

    pub fn count(&self) -> Result<usize> {
        self.with_store(TxMode::ReadOnly, "count", |tx| {
            let count: i64 = tx.query_row(&format!("SELECT COUNT(*) FROM {}", self.name), [], |row| {
                row.get(0)
            })?;
            Ok(count as usize)
        })
    }

    /// Records whose name equals `name` exactly, looked up through `by_name`.
    pub fn find_by_name(&self, name: &str) -> Result<Vec<PhotoRecord>> {
        self.with_store(TxMode::ReadOnly, "find_by_name", |tx| {
            let mut stmt = tx.prepare(&format!(
                "SELECT {COLUMNS} FROM {store} INDEXED BY {index}
                 WHERE name = ?1 ORDER BY id",
                store = self.name,
                index = schema::index_by_name(&self.name),
            ))?;
            let records = stmt
                .query_map(params![name], record_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(records)
        })
    }

    /// Records created within `[from, to]` (epoch ms, inclusive), oldest
    /// first, looked up through `by_created`.
    pub fn created_between(&self, from: i64, to: i64) -> Result<Vec<PhotoRecord>> {
        self.with_store(TxMode::ReadOnly, "created_between", |tx| {
            let mut stmt = tx.prepare(&format!(
                "SELECT {COLUMNS} FROM {store} INDEXED BY {index}
                 WHERE created_at BETWEEN ?1 AND ?2 ORDER BY created_at, id",
                store = self.name,
                index = schema::index_by_created(&self.name),
            ))?;
            let records = stmt
                .query_map(params![from, to], record_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(records)
        })
    }
}

fn open_file(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| unavailable(path, e))?;
        }
    }
    let conn = Connection::open(path).map_err(|e| unavailable(path, e))?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|e| unavailable(path, e))?;
    Ok(conn)
}

fn unavailable(path: &Path, reason: impl ToString) -> Error {
    Error::StorageUnavailable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn insert(tx: &Transaction<'_>, store: &str, op: &'static str, photo: &NewPhoto) -> Result<i64> {
    photo.validate().map_err(|reason| Error::write(op, reason))?;
    let mut stmt = tx.prepare_cached(&format!(
        "INSERT INTO {store} (name, type, size, created_at, blob) VALUES (?1, ?2, ?3, ?4, ?5)"
    ))?;
    stmt.execute(params![
        photo.name,
        photo.mime_type,
        photo.size as i64,
        photo.created_at,
        photo.blob,
    ])?;
    Ok(tx.last_insert_rowid())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<PhotoRecord> {
    Ok(PhotoRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        mime_type: row.get(2)?,
        size: row.get::<_, i64>(3)? as u64,
        created_at: row.get(4)?,
        blob: row.get(5)?,
    })
}
