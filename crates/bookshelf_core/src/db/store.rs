//! Shared storage engine handle and session factory.
//!
//! # Responsibility
//! - Open file or in-memory SQLite stores and establish the schema once.
//! - Hand out sessions, each on its own configured connection.
//! - Keep process-wide session bookkeeping consistent under concurrent use.
//!
//! # Invariants
//! - Session connections have `foreign_keys=ON` and the configured busy timeout.
//! - An in-memory store lives exactly as long as its last `Store`/`Session` handle.
//! - `StoreStats::open` only counts sessions that are not yet committed or rolled back.

use super::schema::create_all;
use super::session::{Session, SessionMode, SessionOutcome};
use super::{DbError, DbResult};
use crate::error::PersistenceResult;
use log::{debug, error, info};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoreLocation {
    /// Private in-memory database (`memdb` VFS), discarded with the store.
    #[default]
    Memory,
    /// SQLite database file, opened in WAL mode.
    File(PathBuf),
}

/// Construction options for `Store::open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// How long a session waits for a competing writer before failing.
    pub busy_timeout: Duration,
    /// Logs every statement at `debug` under target `bookshelf_core::sql`.
    pub echo_sql: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::Memory,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            echo_sql: false,
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            ..Self::default()
        }
    }

    pub fn with_echo_sql(mut self, echo_sql: bool) -> Self {
        self.echo_sql = echo_sql;
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

/// Snapshot of session bookkeeping for one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub opened: u64,
    pub committed: u64,
    pub rolled_back: u64,
    pub open: usize,
}

pub(super) struct StoreInner {
    location: StoreLocation,
    memory_uri: String,
    busy_timeout: Duration,
    echo_sql: bool,
    next_session_id: AtomicU64,
    committed: AtomicU64,
    rolled_back: AtomicU64,
    open: AtomicUsize,
    // Keeps a shared in-memory database alive; also used for out-of-band schema work.
    anchor: Mutex<Connection>,
}

impl StoreInner {
    fn mode_label(&self) -> &'static str {
        match self.location {
            StoreLocation::Memory => "memory",
            StoreLocation::File(_) => "file",
        }
    }

    fn connect(&self) -> DbResult<Connection> {
        let mut conn = match &self.location {
            StoreLocation::Memory => open_memory(&self.memory_uri)?,
            StoreLocation::File(path) => Connection::open(path)?,
        };
        configure_connection(&mut conn, self.busy_timeout, self.echo_sql)?;
        Ok(conn)
    }

    pub(super) fn record_open(&self) -> u64 {
        self.open.fetch_add(1, Ordering::AcqRel);
        self.next_session_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(super) fn record_close(&self, outcome: SessionOutcome) {
        match outcome {
            SessionOutcome::Committed => self.committed.fetch_add(1, Ordering::Relaxed),
            SessionOutcome::RolledBack => self.rolled_back.fetch_add(1, Ordering::Relaxed),
        };
        self.open.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Process-wide storage engine handle.
///
/// Cloning is cheap and every clone refers to the same engine. The handle is
/// `Send + Sync`; sessions can be opened concurrently from any thread.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("location", &self.inner.location)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Store {
    /// Opens the store and establishes the declared schema.
    ///
    /// # Side effects
    /// - Creates absent tables and stamps the baseline revision on a fresh store.
    /// - Emits `store_open` logging events with duration and status.
    pub fn open(config: StoreConfig) -> DbResult<Self> {
        let started_at = Instant::now();
        let memory_uri = format!("file:/bookshelf-{}?vfs=memdb", Uuid::new_v4().simple());
        let mode = match config.location {
            StoreLocation::Memory => "memory",
            StoreLocation::File(_) => "file",
        };
        info!("event=store_open module=db status=start mode={mode}");

        match bootstrap(&config, &memory_uri) {
            Ok(anchor) => {
                info!(
                    "event=store_open module=db status=ok mode={} duration_ms={}",
                    mode,
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    inner: Arc::new(StoreInner {
                        location: config.location,
                        memory_uri,
                        busy_timeout: config.busy_timeout,
                        echo_sql: config.echo_sql,
                        next_session_id: AtomicU64::new(0),
                        committed: AtomicU64::new(0),
                        rolled_back: AtomicU64::new(0),
                        open: AtomicUsize::new(0),
                        anchor: Mutex::new(anchor),
                    }),
                })
            }
            Err(err) => {
                error!(
                    "event=store_open module=db status=error mode={} duration_ms={} error_code=store_bootstrap_failed error={}",
                    mode,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Opens a private in-memory store with default options.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open(StoreConfig::in_memory())
    }

    pub fn location(&self) -> &StoreLocation {
        &self.inner.location
    }

    /// Opens a deferred unit of work suitable for reads.
    pub fn open_session(&self) -> PersistenceResult<Session> {
        self.open_session_with_mode(SessionMode::Read)
    }

    /// Opens a unit of work holding the store's write lock from the start.
    pub fn open_write_session(&self) -> PersistenceResult<Session> {
        self.open_session_with_mode(SessionMode::Write)
    }

    pub fn open_session_with_mode(&self, mode: SessionMode) -> PersistenceResult<Session> {
        let conn = self.inner.connect().map_err(|err| {
            error!(
                "event=session_open module=db status=error mode={} error_code=connect_failed error={}",
                self.inner.mode_label(),
                err
            );
            err
        })?;
        Session::begin(Arc::clone(&self.inner), conn, mode)
    }

    /// Runs schema-level work on the store's anchor connection.
    ///
    /// Used for out-of-band revisions (`migrations::upgrade`/`downgrade`).
    pub fn with_connection<T>(
        &self,
        work: impl FnOnce(&mut Connection) -> DbResult<T>,
    ) -> DbResult<T> {
        let mut anchor = self
            .inner
            .anchor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        work(&mut anchor)
    }

    pub fn stats(&self) -> StoreStats {
        let committed = self.inner.committed.load(Ordering::Relaxed);
        let rolled_back = self.inner.rolled_back.load(Ordering::Relaxed);
        StoreStats {
            opened: self.inner.next_session_id.load(Ordering::Relaxed),
            committed,
            rolled_back,
            open: self.inner.open.load(Ordering::Acquire),
        }
    }
}

fn bootstrap(config: &StoreConfig, memory_uri: &str) -> DbResult<Connection> {
    if config.busy_timeout.is_zero() {
        return Err(DbError::InvalidConfig(
            "busy_timeout must be greater than zero".to_string(),
        ));
    }

    let mut conn = match &config.location {
        StoreLocation::Memory => open_memory(memory_uri)?,
        StoreLocation::File(path) => {
            if path.as_os_str().is_empty() {
                return Err(DbError::InvalidConfig(
                    "database file path cannot be empty".to_string(),
                ));
            }
            let conn = Connection::open(path)?;
            let journal: String =
                conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
            debug!("event=store_open module=db status=ok journal_mode={journal}");
            conn
        }
    };
    configure_connection(&mut conn, config.busy_timeout, config.echo_sql)?;
    create_all(&mut conn)?;
    Ok(conn)
}

/// Opens one connection to a named `memdb` database.
///
/// `memdb` uses regular file locking, so contention surfaces as `SQLITE_BUSY`
/// and waits on the busy timeout. Journals stay in memory; `memdb` would
/// otherwise hand them to the default VFS.
fn open_memory(uri: &str) -> DbResult<Connection> {
    let conn = Connection::open(uri)?;
    let journal: String = conn.query_row("PRAGMA journal_mode = MEMORY;", [], |row| row.get(0))?;
    debug!("event=store_connect module=db status=ok mode=memory journal_mode={journal}");
    Ok(conn)
}

fn configure_connection(
    conn: &mut Connection,
    busy_timeout: Duration,
    echo_sql: bool,
) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    if echo_sql {
        conn.trace(Some(echo_statement));
    }
    Ok(())
}

fn echo_statement(sql: &str) {
    debug!(
        target: "bookshelf_core::sql",
        "event=sql_echo module=db sql={}",
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    );
}
