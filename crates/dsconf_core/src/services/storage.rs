//! Local SQLite storage for persisted connector records.
//!
//! Records are stored in their wire form (`extra` as JSON text), exactly as a
//! transport layer would send or receive them.
//!
//! # Data Directory Locations
//!
//! - **macOS**: `~/Library/Application Support/dev.dsconf.Dsconf`
//! - **Windows**: `%APPDATA%\dsconf\Dsconf`
//! - **Linux**: `~/.local/share/dsconf`
//! - **Debug builds**: `./dsconf_data` in current directory

use crate::error::ConfigError;
use crate::models::RawRecord;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// Get the default data directory for the application.
pub fn default_data_dir() -> PathBuf {
    #[cfg(debug_assertions)]
    {
        PathBuf::from("./dsconf_data")
    }

    #[cfg(not(debug_assertions))]
    {
        dirs::data_dir()
            .map(|d| {
                #[cfg(target_os = "macos")]
                {
                    d.join("dev.dsconf.Dsconf")
                }
                #[cfg(target_os = "windows")]
                {
                    d.join("dsconf").join("Dsconf")
                }
                #[cfg(not(any(target_os = "macos", target_os = "windows")))]
                {
                    d.join("dsconf")
                }
            })
            .unwrap_or_else(|| PathBuf::from("./dsconf_data"))
    }
}

/// Initialize the data directory, creating it if needed.
pub fn init_data_dir(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(ConfigError::storage(
                format!("Data path exists but is not a directory: {}", path.display()),
                Some("Select a different location or remove the existing file"),
            ));
        }
        return Ok(());
    }

    std::fs::create_dir_all(path).map_err(|e| {
        ConfigError::storage(
            format!("Failed to create data directory '{}': {}", path.display(), e),
            Some("Check permissions or select a different location"),
        )
    })?;

    tracing::info!(path = %path.display(), "Created data directory");
    Ok(())
}

/// Listing entry for a stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSummary {
    pub id: i64,
    pub database_name: Option<String>,
    pub engine: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// SQLite-based store for connector records.
///
/// Thread-safe via internal Mutex.
pub struct RecordStore {
    connection: Mutex<Connection>,
    data_dir: PathBuf,
}

impl RecordStore {
    /// Open or create the store in the given data directory.
    pub fn open(data_dir: PathBuf) -> Result<Self, ConfigError> {
        init_data_dir(&data_dir)?;
        let db_path = data_dir.join("dsconf.db");
        Self::open_with_path(db_path, data_dir)
    }

    /// Open the store with a specific database path (for testing).
    pub fn open_with_path(db_path: PathBuf, data_dir: PathBuf) -> Result<Self, ConfigError> {
        let connection = Connection::open(&db_path).map_err(|e| {
            ConfigError::storage(
                format!("Failed to open database '{}': {}", db_path.display(), e),
                Some("The database file may be corrupted. Try deleting it to start fresh."),
            )
        })?;

        Self::configure_connection(&connection)?;

        let store = Self { connection: Mutex::new(connection), data_dir };
        store.run_migrations()?;

        tracing::info!(path = %db_path.display(), "Record store opened");
        Ok(store)
    }

    fn configure_connection(conn: &Connection) -> Result<(), ConfigError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA temp_store = MEMORY;
            ",
        )
        .map_err(|e| ConfigError::storage(format!("Failed to configure database: {e}"), None))
    }

    fn run_migrations(&self) -> Result<(), ConfigError> {
        let conn = self.connection.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS migrations (
                domain TEXT NOT NULL,
                step INTEGER NOT NULL,
                migration TEXT NOT NULL,
                PRIMARY KEY(domain, step)
            ) STRICT",
            [],
        )
        .map_err(|e| ConfigError::storage(format!("Failed to create migrations table: {e}"), None))?;

        Self::migrate_schema(&conn)
    }

    fn migrate_schema(conn: &Connection) -> Result<(), ConfigError> {
        const DOMAIN: &str = "records";

        let current_step: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(step), 0) FROM migrations WHERE domain = ?",
                [DOMAIN],
                |row| row.get(0),
            )
            .unwrap_or(0);

        if current_step < 1 {
            conn.execute_batch(
                "
                CREATE TABLE records (
                    record_id INTEGER PRIMARY KEY,
                    database_name TEXT,
                    engine TEXT,
                    record_json TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                ) STRICT;

                CREATE INDEX idx_records_name ON records(database_name);
                ",
            )
            .map_err(|e| ConfigError::storage(format!("Migration 1 failed: {e}"), None))?;

            conn.execute(
                "INSERT INTO migrations (domain, step, migration) VALUES (?, 1, 'initial_schema')",
                [DOMAIN],
            )
            .map_err(|e| ConfigError::storage(format!("Failed to record migration: {e}"), None))?;

            tracing::info!("Applied migration 1: initial_schema");
        }

        Ok(())
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // ========== Record Operations ==========

    /// Save a record and return its ID.
    ///
    /// Records without an `id` get the next free one; the stored JSON always
    /// carries the ID.
    pub fn save(&self, record: &RawRecord) -> Result<i64, ConfigError> {
        let conn = self.connection.lock();
        let now = Utc::now().to_rfc3339();

        let id = match record.id() {
            Some(id) => id,
            None => conn
                .query_row("SELECT COALESCE(MAX(record_id), 0) + 1 FROM records", [], |row| {
                    row.get(0)
                })
                .map_err(|e| ConfigError::storage(format!("Failed to allocate record ID: {e}"), None))?,
        };

        let mut record = record.clone();
        record.set_id(id);
        let record_json = serde_json::to_string(&record)?;

        conn.execute(
            "INSERT INTO records (record_id, database_name, engine, record_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(record_id) DO UPDATE SET
                database_name = excluded.database_name,
                engine = excluded.engine,
                record_json = excluded.record_json,
                updated_at = excluded.updated_at",
            params![id, record.database_name(), record.engine_name(), record_json, now],
        )
        .map_err(|e| ConfigError::storage(format!("Failed to save record: {e}"), None))?;

        tracing::debug!(record_id = id, name = ?record.database_name(), "Record saved");
        Ok(id)
    }

    /// Load a record by ID.
    pub fn load(&self, id: i64) -> Result<Option<RawRecord>, ConfigError> {
        let conn = self.connection.lock();

        let json: Option<String> = conn
            .query_row("SELECT record_json FROM records WHERE record_id = ?", [id], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| ConfigError::storage(format!("Failed to load record: {e}"), None))?;

        match json {
            Some(json) => {
                let record = serde_json::from_str(&json).map_err(|e| {
                    ConfigError::storage(format!("Invalid record JSON for {id}: {e}"), None)
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List all stored records ordered by name.
    pub fn list(&self) -> Result<Vec<RecordSummary>, ConfigError> {
        let conn = self.connection.lock();

        let mut stmt = conn
            .prepare(
                "SELECT record_id, database_name, engine, updated_at
                 FROM records ORDER BY database_name, record_id",
            )
            .map_err(|e| ConfigError::storage(format!("Failed to prepare query: {e}"), None))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| ConfigError::storage(format!("Failed to query records: {e}"), None))?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, database_name, engine, updated_at) =
                row.map_err(|e| ConfigError::storage(format!("Failed to read row: {e}"), None))?;
            summaries.push(RecordSummary {
                id,
                database_name,
                engine,
                updated_at: DateTime::parse_from_rfc3339(&updated_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            });
        }

        Ok(summaries)
    }

    /// Delete a record. Returns true if a record was removed.
    pub fn delete(&self, id: i64) -> Result<bool, ConfigError> {
        let conn = self.connection.lock();

        let removed = conn
            .execute("DELETE FROM records WHERE record_id = ?", [id])
            .map_err(|e| ConfigError::storage(format!("Failed to delete record: {e}"), None))?;

        tracing::debug!(record_id = id, removed, "Record deleted");
        Ok(removed > 0)
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore").field("data_dir", &self.data_dir).finish()
    }
}
