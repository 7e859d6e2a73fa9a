//! Local storage layer for remessa.
//!
//! This module provides the `SQLite`-backed local cache: the authoritative
//! fallback store every mutation lands in before any remote call is
//! attempted. The whole record collection is kept as one JSON blob under a
//! fixed key, so reads and writes behave like the original single-key
//! cache the application contract is written against.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::record::ShipmentRecord;

/// Fixed key the record collection blob is stored under.
const RECORDS_KEY: &str = "records";

/// Local cache store for shipment records.
///
/// Backed by `SQLite` in WAL mode. Collection operations read and rewrite
/// the blob under [`RECORDS_KEY`]; each rewrite is a single statement, so
/// callers never observe a partial write.
#[derive(Debug)]
pub struct LocalStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl LocalStore {
    /// Open or create a store database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        // Initialize schema
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a raw value from the key-value table.
    pub(crate) fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Write a raw value into the key-value table, replacing any existing one.
    pub(crate) fn kv_put(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            (key, value),
        )?;
        Ok(())
    }

    /// Delete a key from the key-value table. No-op if absent.
    pub(crate) fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    /// List the full record collection in storage order.
    ///
    /// An absent blob yields an empty list. A corrupt blob also yields an
    /// empty list (with a warning) rather than an error, so a damaged cache
    /// never takes the application down.
    ///
    /// # Errors
    ///
    /// Returns an error only if the database itself cannot be read.
    pub fn list(&self) -> Result<Vec<ShipmentRecord>> {
        let Some(blob) = self.kv_get(RECORDS_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&blob) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!("Record blob is corrupt, treating store as empty: {e}");
                Ok(Vec::new())
            }
        }
    }

    /// Overwrite the stored collection with the given records.
    ///
    /// The write is a single statement: callers never observe a partial
    /// collection.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database write fails.
    pub fn replace_all(&self, records: &[ShipmentRecord]) -> Result<()> {
        let blob = serde_json::to_string(records)?;
        self.kv_put(RECORDS_KEY, &blob)?;
        debug!("Stored {} records", records.len());
        Ok(())
    }

    /// Get a record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: &str) -> Result<Option<ShipmentRecord>> {
        Ok(self.list()?.into_iter().find(|r| r.id == id))
    }

    /// Insert or update a record.
    ///
    /// If a record with the same id exists it is replaced in place,
    /// preserving its position in the collection; otherwise the record is
    /// appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn upsert(&self, record: &ShipmentRecord) -> Result<()> {
        let mut records = self.list()?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.replace_all(&records)
    }

    /// Remove a record by id.
    ///
    /// Returns `true` if a record was removed, `false` if no record with
    /// that id existed (a no-op).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut records = self.list()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.replace_all(&records)?;
        Ok(true)
    }

    /// Count records in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }

    /// Produce a backup payload: the serialized full collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read or serialization fails.
    pub fn export_backup(&self) -> Result<Vec<u8>> {
        let records = self.list()?;
        Ok(serde_json::to_vec(&records)?)
    }

    /// Import a backup payload, merging it into the current collection.
    ///
    /// Records whose id already exists are skipped (current data wins);
    /// new records are appended in payload order. Returns the number of
    /// records appended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedBackup`] if the payload is not a
    /// well-formed record array; nothing is imported in that case.
    pub fn import_backup(&self, payload: &[u8]) -> Result<usize> {
        let imported: Vec<ShipmentRecord> =
            serde_json::from_slice(payload).map_err(|e| Error::MalformedBackup {
                message: e.to_string(),
            })?;

        let mut records = self.list()?;
        let existing: std::collections::HashSet<String> =
            records.iter().map(|r| r.id.clone()).collect();

        let mut added = 0;
        for record in imported {
            if existing.contains(&record.id) {
                debug!("Skipping backup record with existing id {}", record.id);
                continue;
            }
            records.push(record);
            added += 1;
        }

        if added > 0 {
            self.replace_all(&records)?;
        }
        info!("Imported {added} records from backup");
        Ok(added)
    }
}
