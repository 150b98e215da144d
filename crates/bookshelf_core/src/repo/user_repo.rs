//! User repository and session-level user writes.
//!
//! `insert_user` is exposed separately so transactional scopes can stage
//! several users inside one session.

use crate::db::{Session, Store};
use crate::error::{PersistenceError, PersistenceResult};
use crate::model::user::{NewUser, User, UserId};
use crate::transaction::TransactionCoordinator;
use log::info;
use rusqlite::{params, Row};

const USERS_SQL: &str = "SELECT id, username, email FROM users ORDER BY id ASC;";

pub trait UserRepository {
    fn add(&self, user: &NewUser) -> PersistenceResult<User>;
    fn list(&self) -> PersistenceResult<Vec<User>>;
    fn count(&self) -> PersistenceResult<u64>;
}

#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    tx: TransactionCoordinator,
}

impl SqliteUserRepository {
    pub fn new(store: Store) -> Self {
        Self {
            tx: TransactionCoordinator::new(store),
        }
    }
}

impl UserRepository for SqliteUserRepository {
    fn add(&self, user: &NewUser) -> PersistenceResult<User> {
        let created = self.tx.run(|session| insert_user(session, user))?;
        info!("event=user_add module=repo status=ok user_id={}", created.id);
        Ok(created)
    }

    fn list(&self) -> PersistenceResult<Vec<User>> {
        self.tx
            .read(|session| session.query_rows(USERS_SQL, [], user_from_row))
    }

    fn count(&self) -> PersistenceResult<u64> {
        self.tx.read(|session| -> PersistenceResult<u64> {
            let count = session
                .query_optional("SELECT COUNT(*) FROM users;", [], |row| {
                    Ok(row.get::<_, i64>(0)?)
                })?
                .unwrap_or(0);
            u64::try_from(count).map_err(|_| {
                PersistenceError::InvalidData(format!("negative user count `{count}`"))
            })
        })
    }
}

/// Inserts one user inside the caller's session; nothing is committed here.
pub fn insert_user(session: &Session, user: &NewUser) -> PersistenceResult<User> {
    user.validate()?;
    let id: UserId = session.insert(
        "INSERT INTO users (username, email) VALUES (?1, ?2);",
        params![user.username, user.email],
    )?;
    Ok(User {
        id,
        username: user.username.clone(),
        email: user.email.clone(),
    })
}

fn user_from_row(row: &Row<'_>) -> PersistenceResult<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
    })
}
