//! Persistence error taxonomy shared by sessions, repositories and loaders.
//!
//! # Responsibility
//! - Classify storage failures into integrity violations vs. other store errors.
//! - Keep one error type flowing from `Session` up to repository callers.
//!
//! # Invariants
//! - Every SQLite constraint failure surfaces as `PersistenceError::Integrity`.
//! - Absence of an entity is never an error here; callers get `Option`/`bool`.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

// SQLite extended result codes for constraint failures.
const SQLITE_CONSTRAINT_FOREIGNKEY: i32 = 787;
const SQLITE_CONSTRAINT_NOTNULL: i32 = 1299;
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Constraint that rejected a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    /// A foreign key does not reference an existing row.
    ForeignKey(String),
    /// A `NOT NULL` column received no value.
    NotNull(String),
    /// A primary key or unique index collided.
    Unique(String),
    /// A required field was rejected before reaching the store.
    RequiredField {
        entity: &'static str,
        field: &'static str,
    },
    /// Any other constraint (e.g. `CHECK`).
    Other(String),
}

impl IntegrityViolation {
    fn from_extended_code(extended_code: i32, detail: String) -> Self {
        match extended_code {
            SQLITE_CONSTRAINT_FOREIGNKEY => Self::ForeignKey(detail),
            SQLITE_CONSTRAINT_NOTNULL => Self::NotNull(detail),
            SQLITE_CONSTRAINT_PRIMARYKEY | SQLITE_CONSTRAINT_UNIQUE => Self::Unique(detail),
            _ => Self::Other(detail),
        }
    }
}

impl Display for IntegrityViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ForeignKey(detail) => write!(f, "foreign key violation: {detail}"),
            Self::NotNull(detail) => write!(f, "not-null violation: {detail}"),
            Self::Unique(detail) => write!(f, "uniqueness violation: {detail}"),
            Self::RequiredField { entity, field } => {
                write!(f, "{entity}.{field} is required and cannot be blank")
            }
            Self::Other(detail) => write!(f, "constraint violation: {detail}"),
        }
    }
}

/// Failure raised by the store during a read or write.
#[derive(Debug)]
pub enum PersistenceError {
    /// Foreign-key or required-field constraint was violated.
    Integrity(IntegrityViolation),
    /// Connectivity, locking, SQL or schema bootstrap failure.
    Db(DbError),
    /// Persisted data cannot be mapped back to a domain value.
    InvalidData(String),
}

impl PersistenceError {
    /// Returns whether this failure is a constraint violation.
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }

    /// Stable short code used in log lines and client-facing mappings.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Integrity(_) => "integrity_violation",
            Self::Db(_) => "store_failure",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integrity(violation) => write!(f, "integrity error: {violation}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Integrity(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<IntegrityViolation> for PersistenceError {
    fn from(value: IntegrityViolation) -> Self {
        Self::Integrity(value)
    }
}

impl From<DbError> for PersistenceError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &value {
            if failure.code == rusqlite::ErrorCode::ConstraintViolation {
                let detail = message.clone().unwrap_or_else(|| failure.to_string());
                return Self::Integrity(IntegrityViolation::from_extended_code(
                    failure.extended_code,
                    detail,
                ));
            }
        }
        Self::Db(DbError::Sqlite(value))
    }
}
