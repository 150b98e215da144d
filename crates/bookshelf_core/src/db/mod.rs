//! SQLite storage engine handle, units of work and schema entry points.
//!
//! # Responsibility
//! - Own the shared storage engine (`Store`) for the process lifetime.
//! - Issue isolated units of work (`Session`) per logical operation.
//! - Establish the declared schema and expose out-of-band revisions.
//!
//! # Invariants
//! - Schema revision is tracked via `PRAGMA user_version`.
//! - No application data is read or written before `schema::create_all` succeeds.
//! - Every session connection runs with `foreign_keys=ON`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
pub mod schema;
mod session;
mod store;

pub use session::{Session, SessionMode};
pub use store::{Store, StoreConfig, StoreLocation, StoreStats};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    NoRevisionToDowngrade,
    InvalidConfig(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema revision {db_version} is newer than supported {latest_supported}"
            ),
            Self::NoRevisionToDowngrade => write!(f, "schema is already at base revision 0"),
            Self::InvalidConfig(message) => write!(f, "invalid store config: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::NoRevisionToDowngrade => None,
            Self::InvalidConfig(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
