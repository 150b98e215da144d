//! Atomic execution of multi-step write sequences.
//!
//! # Responsibility
//! - Run caller work inside exactly one session and decide its outcome.
//! - Guarantee rollback on every failure path before the error reaches the caller.
//!
//! # Invariants
//! - `Ok` from the work commits; `Err` rolls back; a panic rolls back via drop.
//! - Writes staged by the work are invisible to other sessions until commit.
//! - The session is closed before `run`/`read` returns.

use crate::db::{Session, SessionMode, Store};
use crate::error::PersistenceError;
use crate::model::user::{NewUser, User};
use crate::repo::user_repo::insert_user;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Failure of a transactional scope that was not caused by the store alone.
#[derive(Debug)]
pub enum TransactionError {
    /// The scope aborted itself; every staged write was discarded.
    Aborted(String),
    /// The store rejected a step or the commit.
    Persistence(PersistenceError),
}

impl Display for TransactionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aborted(reason) => write!(f, "transaction aborted: {reason}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TransactionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Aborted(_) => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<PersistenceError> for TransactionError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

/// Runs closures as single units of work against one store.
#[derive(Debug, Clone)]
pub struct TransactionCoordinator {
    store: Store,
}

impl TransactionCoordinator {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Runs `work` in a write session and commits only when it returns `Ok`.
    ///
    /// # Errors
    /// - The error returned by `work`, after the session was rolled back.
    /// - A `PersistenceError` when the session cannot be opened or committed.
    pub fn run<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Session) -> Result<T, E>,
        E: From<PersistenceError>,
    {
        self.run_in_mode(SessionMode::Write, work)
    }

    /// Runs read-only `work` in a deferred session.
    pub fn read<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Session) -> Result<T, E>,
        E: From<PersistenceError>,
    {
        self.run_in_mode(SessionMode::Read, work)
    }

    fn run_in_mode<T, E, F>(&self, mode: SessionMode, work: F) -> Result<T, E>
    where
        F: FnOnce(&Session) -> Result<T, E>,
        E: From<PersistenceError>,
    {
        let started_at = Instant::now();
        let session = self.store.open_session_with_mode(mode)?;
        let session_id = session.id();

        match work(&session) {
            Ok(value) => {
                session.commit()?;
                if mode == SessionMode::Write {
                    info!(
                        "event=transaction module=tx status=ok session_id={} duration_ms={}",
                        session_id,
                        started_at.elapsed().as_millis()
                    );
                }
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = session.rollback() {
                    warn!(
                        "event=transaction module=tx status=error session_id={} error_code=rollback_failed error={}",
                        session_id, rollback_err
                    );
                }
                info!(
                    "event=transaction module=tx status=rolled_back session_id={} duration_ms={}",
                    session_id,
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }
}

/// Inserts two users, then aborts before the third one.
///
/// Always ends in `TransactionError::Aborted` with neither user persisted,
/// unless the store itself fails first.
pub fn create_users_with_injected_failure(store: &Store) -> Result<Vec<User>, TransactionError> {
    let coordinator = TransactionCoordinator::new(store.clone());
    coordinator.run(|session| -> Result<Vec<User>, TransactionError> {
        let staged = vec![
            insert_user(session, &NewUser::new("user1", "user1@example.com"))?,
            insert_user(session, &NewUser::new("user2", "user2@example.com"))?,
        ];

        Err(TransactionError::Aborted(format!(
            "injected failure while adding the third user after {} staged inserts",
            staged.len()
        )))
    })
}
