//! SQLite-backed store.
//!
//! Every entry is one row:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS kv_values (
//!     name       TEXT PRIMARY KEY,
//!     value      INTEGER NOT NULL,
//!     updated_at TEXT NOT NULL
//! );
//! ```
//!
//! WAL mode keeps reads cheap while the server writes, and backups go through
//! SQLite's online-backup API so they can run during an event.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tracing::{debug, info};

use super::KeyValueStore;
use crate::config::PersistenceConfig;
use crate::error::Result;

const MEMORY_PATH: &str = ":memory:";
const SNAPSHOT_PAGES_PER_STEP: std::os::raw::c_int = 256;
const SNAPSHOT_STEP_PAUSE: Duration = Duration::from_millis(50);

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv_values (
    name       TEXT PRIMARY KEY,
    value      INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);";

/// Handle to an open SQLite database holding event state.
///
/// ```no_run
/// # use ctf_core::store::{SqliteStore, StoreExt};
/// # use ctf_core::config::PersistenceConfig;
/// let store = SqliteStore::open("ctf.db", &PersistenceConfig::default())?;
/// store.set_bool("ctf:flags_prepared", true)?;
/// assert!(store.get_bool("ctf:flags_prepared")?);
/// # Ok::<(), ctf_core::error::CtfError>(())
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
    config: PersistenceConfig,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CtfError::Database`](crate::error::CtfError::Database) on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "CTF store opened"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            config: config.clone(),
            db_path,
        })
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`CtfError::Database`](crate::error::CtfError::Database) on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            config: config.clone(),
            db_path: PathBuf::from(MEMORY_PATH),
        })
    }

    /// Number of stored entries.
    ///
    /// # Errors
    ///
    /// Returns [`CtfError::Database`](crate::error::CtfError::Database) on SQLite failures.
    pub fn entry_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM kv_values", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Write a consistent copy of the live database to `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`CtfError::Database`](crate::error::CtfError::Database) on SQLite failures.
    pub fn backup_to(&self, dest: &Path) -> Result<()> {
        let conn = self.conn.lock();
        let mut target = Connection::open(dest)?;
        rusqlite::backup::Backup::new(&conn, &mut target)?.run_to_completion(
            SNAPSHOT_PAGES_PER_STEP,
            SNAPSHOT_STEP_PAUSE,
            None,
        )?;
        debug!(dest = %dest.display(), "Store snapshot written");
        Ok(())
    }

    /// Keep the newest `backup_count` snapshots beside the database as
    /// `<file>.bak.1` (newest) through `<file>.bak.N`, and return the path
    /// just written. `None` when snapshots are disabled or the database
    /// lives in memory.
    ///
    /// # Errors
    ///
    /// Returns [`CtfError::Database`](crate::error::CtfError::Database) or
    /// [`CtfError::Io`](crate::error::CtfError::Io) on failure.
    pub fn create_rotating_backup(&self) -> Result<Option<PathBuf>> {
        let keep = self.config.backup_count;
        if keep == 0 || self.db_path.as_path() == Path::new(MEMORY_PATH) {
            return Ok(None);
        }

        let slots: Vec<PathBuf> = (1..=keep).map(|n| self.snapshot_slot(n)).collect();
        if let Some(oldest) = slots.last().filter(|p| p.exists()) {
            std::fs::remove_file(oldest)?;
        }
        for pair in slots.windows(2).rev() {
            if pair[0].exists() {
                std::fs::rename(&pair[0], &pair[1])?;
            }
        }

        let newest = self.snapshot_slot(1);
        self.backup_to(&newest)?;
        info!(path = %newest.display(), keep, "Rotating snapshot written");
        Ok(Some(newest))
    }

    fn snapshot_slot(&self, n: u32) -> PathBuf {
        let mut name = self.db_path.clone().into_os_string();
        name.push(format!(".bak.{n}"));
        PathBuf::from(name)
    }

    // ------------------------------------------------------------------
    // Utility
    // ------------------------------------------------------------------

    /// Path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run `PRAGMA integrity_check`; `Ok(false)` means corruption was found.
    ///
    /// # Errors
    ///
    /// Returns [`CtfError::Database`](crate::error::CtfError::Database) if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .lock()
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }

    /// Reclaim unused space.
    ///
    /// # Errors
    ///
    /// Returns [`CtfError::Database`](crate::error::CtfError::Database) on SQLite failures.
    pub fn vacuum(&self) -> Result<()> {
        self.conn.lock().execute_batch("VACUUM;")?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn load(&self, key: &str) -> Result<Option<i32>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT value FROM kv_values WHERE name = ?1")?;
        let value = stmt.query_row(params![key], |row| row.get(0)).optional()?;
        debug!(key, ?value, "Loaded value");
        Ok(value)
    }

    fn save(&self, key: &str, value: i32) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.lock().execute(
            "INSERT INTO kv_values (name, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        debug!(key, value, "Saved value");
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        // substr rather than LIKE: keys contain `_`, a LIKE wildcard.
        let mut stmt = conn.prepare_cached(
            "SELECT name FROM kv_values WHERE substr(name, 1, length(?1)) = ?1",
        )?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    fn add(&self, key: &str, amount: i32) -> Result<i32> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock();
        let value: i32 = conn.query_row(
            "INSERT INTO kv_values (name, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET
                value = value + excluded.value,
                updated_at = excluded.updated_at
             RETURNING value",
            params![key, amount, now],
            |row| row.get(0),
        )?;
        debug!(key, amount, value, "Incremented value");
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
