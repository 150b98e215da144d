//! Unit of work bound to one store connection.
//!
//! # Responsibility
//! - Wrap one SQLite transaction from `BEGIN` to `COMMIT`/`ROLLBACK`.
//! - Count statements issued, so loading strategies can be compared.
//!
//! # Invariants
//! - A session is `OPEN` from construction until `commit`/`rollback`/drop.
//! - `commit` and `rollback` consume the session; terminal sessions cannot be used.
//! - Dropping an open session rolls it back, including during panic unwinding.

use super::store::StoreInner;
use crate::error::PersistenceResult;
use log::{debug, error, warn};
use rusqlite::{Connection, Params, Row};
use std::cell::Cell;
use std::sync::Arc;
use std::time::Instant;

/// Locking behavior requested when the session begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// `BEGIN DEFERRED`: takes locks lazily on first read/write.
    Read,
    /// `BEGIN IMMEDIATE`: takes the write lock up front, one writer per store.
    Write,
}

impl SessionMode {
    fn begin_sql(self) -> &'static str {
        match self {
            Self::Read => "BEGIN DEFERRED;",
            Self::Write => "BEGIN IMMEDIATE;",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Open,
    Committed,
    RolledBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SessionOutcome {
    Committed,
    RolledBack,
}

/// Isolated unit of work against the shared store.
pub struct Session {
    conn: Connection,
    store: Arc<StoreInner>,
    id: u64,
    mode: SessionMode,
    state: SessionState,
    queries: Cell<u32>,
    opened_at: Instant,
}

impl Session {
    pub(super) fn begin(
        store: Arc<StoreInner>,
        conn: Connection,
        mode: SessionMode,
    ) -> PersistenceResult<Self> {
        if let Err(err) = conn.execute_batch(mode.begin_sql()) {
            error!(
                "event=session_open module=db status=error mode={} error_code=begin_failed error={}",
                mode.as_str(),
                err
            );
            return Err(err.into());
        }

        let id = store.record_open();
        debug!(
            "event=session_open module=db status=ok session_id={} mode={}",
            id,
            mode.as_str()
        );
        Ok(Self {
            conn,
            store,
            id,
            mode,
            state: SessionState::Open,
            queries: Cell::new(0),
            opened_at: Instant::now(),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Number of statements issued through this session so far.
    pub fn query_count(&self) -> u32 {
        self.queries.get()
    }

    /// Executes one write statement and returns the number of changed rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> PersistenceResult<usize> {
        self.note_query();
        let mut stmt = self.conn.prepare_cached(sql)?;
        Ok(stmt.execute(params)?)
    }

    /// Executes one `INSERT` and returns the store-assigned row id.
    pub fn insert<P: Params>(&self, sql: &str, params: P) -> PersistenceResult<i64> {
        self.execute(sql, params)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Runs one query and maps every returned row.
    pub fn query_rows<T, P, F>(&self, sql: &str, params: P, mut map: F) -> PersistenceResult<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> PersistenceResult<T>,
    {
        self.note_query();
        let mut stmt = self.conn.prepare_cached(sql)?;
        let mut rows = stmt.query(params)?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(map(row)?);
        }
        Ok(items)
    }

    /// Runs one query and maps the first row, if any.
    pub fn query_optional<T, P, F>(&self, sql: &str, params: P, map: F) -> PersistenceResult<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> PersistenceResult<T>,
    {
        self.note_query();
        let mut stmt = self.conn.prepare_cached(sql)?;
        let mut rows = stmt.query(params)?;
        match rows.next()? {
            Some(row) => Ok(Some(map(row)?)),
            None => Ok(None),
        }
    }

    /// Makes every write of this unit of work durable.
    ///
    /// A failed `COMMIT` is followed by a rollback; the error is returned.
    pub fn commit(mut self) -> PersistenceResult<()> {
        match self.conn.execute_batch("COMMIT;") {
            Ok(()) => {
                self.state = SessionState::Committed;
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=session_commit module=db status=error session_id={} error_code=commit_failed error={}",
                    self.id, err
                );
                self.rollback_in_place("commit_failed");
                Err(err.into())
            }
        }
    }

    /// Discards every write of this unit of work.
    pub fn rollback(mut self) -> PersistenceResult<()> {
        let result = self.conn.execute_batch("ROLLBACK;");
        self.state = SessionState::RolledBack;
        Ok(result?)
    }

    fn note_query(&self) {
        self.queries.set(self.queries.get() + 1);
    }

    fn rollback_in_place(&mut self, reason: &str) {
        if let Err(err) = self.conn.execute_batch("ROLLBACK;") {
            // SQLite may already have rolled back on its own.
            if !self.conn.is_autocommit() {
                warn!(
                    "event=session_rollback module=db status=error session_id={} reason={} error={}",
                    self.id, reason, err
                );
            }
        }
        self.state = SessionState::RolledBack;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state == SessionState::Open {
            self.rollback_in_place("dropped_open");
        }

        let outcome = match self.state {
            SessionState::Committed => SessionOutcome::Committed,
            SessionState::Open | SessionState::RolledBack => SessionOutcome::RolledBack,
        };
        self.store.record_close(outcome);
        debug!(
            "event=session_close module=db status=ok session_id={} outcome={} queries={} duration_ms={}",
            self.id,
            match outcome {
                SessionOutcome::Committed => "committed",
                SessionOutcome::RolledBack => "rolled_back",
            },
            self.queries.get(),
            self.opened_at.elapsed().as_millis()
        );
    }
}
