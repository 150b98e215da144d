//! Use-case API consumed by outer layers (HTTP handlers, CLI).
//!
//! # Responsibility
//! - Expose the function-call contract with serializable request/response shapes.
//! - Map repository outcomes to contract results (`not found`, status envelopes).
//!
//! # Invariants
//! - No call leaves a session open.
//! - Failures carry a stable `ApiError::kind()` for client-facing mapping.

use crate::db::Store;
use crate::error::PersistenceError;
use crate::loader::{author_views, AuthorView, LoadStrategy};
use crate::model::author::{Author, AuthorId};
use crate::model::book::{Book, BookId};
use crate::report::book_counts::{author_book_counts, AuthorBookCount};
use crate::repo::author_repo::{AuthorRepository, SqliteAuthorRepository};
use crate::repo::book_repo::{BookRepository, SqliteBookRepository};
use crate::transaction::{create_users_with_injected_failure, TransactionCoordinator};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEMO_AUTHOR: &str = "Ahmatova";
const DEMO_TITLES: &[&str] = &["Rekviem", "Poema bez geroya"];

/// Create-book request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author_id: AuthorId,
}

/// Generic `{ status, message? }` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn success(message: Option<String>) -> Self {
        Self {
            status: "success".to_string(),
            message,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug)]
pub enum ApiError {
    NotFound { entity: &'static str, id: i64 },
    Persistence(PersistenceError),
}

impl ApiError {
    /// Stable category for mapping to client-visible statuses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Persistence(err) if err.is_integrity() => "integrity",
            Self::Persistence(_) => "persistence",
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

/// Facade bundling the repositories over one explicitly passed store.
#[derive(Debug, Clone)]
pub struct BookshelfApi {
    books: SqliteBookRepository,
    authors: SqliteAuthorRepository,
    tx: TransactionCoordinator,
}

impl BookshelfApi {
    pub fn new(store: Store) -> Self {
        Self {
            books: SqliteBookRepository::new(store.clone()),
            authors: SqliteAuthorRepository::new(store.clone()),
            tx: TransactionCoordinator::new(store),
        }
    }

    pub fn store(&self) -> &Store {
        self.tx.store()
    }

    pub fn create_book(&self, request: &CreateBookRequest) -> Result<Book, ApiError> {
        Ok(self
            .books
            .add(request.title.as_str(), Some(request.author_id))?)
    }

    pub fn books_by_author(&self, author_id: AuthorId) -> Result<Vec<Book>, ApiError> {
        Ok(self.books.list_by_author(author_id)?)
    }

    /// Deletes one book; absence maps to `ApiError::NotFound`.
    pub fn delete_book(&self, book_id: BookId) -> Result<StatusResponse, ApiError> {
        if self.books.delete(book_id)? {
            Ok(StatusResponse::success(Some(format!(
                "book {book_id} deleted"
            ))))
        } else {
            Err(ApiError::NotFound {
                entity: "book",
                id: book_id,
            })
        }
    }

    /// Runs the two-users-then-failure sequence and reports the rollback.
    pub fn users_transaction_demo(&self) -> StatusResponse {
        match create_users_with_injected_failure(self.store()) {
            Ok(users) => StatusResponse::success(Some(format!("{} users created", users.len()))),
            Err(err) => {
                warn!("event=users_transaction_demo module=api status=rolled_back error={err}");
                StatusResponse::error(format!("transaction rolled back: {err}"))
            }
        }
    }

    pub fn authors(&self, strategy: LoadStrategy) -> Result<Vec<AuthorView>, ApiError> {
        Ok(self.tx.read(|session| author_views(session, strategy))?)
    }

    pub fn author_book_counts(&self) -> Result<Vec<AuthorBookCount>, ApiError> {
        Ok(self.tx.read(author_book_counts)?)
    }

    /// Inserts the demo author with two books when the store has no authors.
    ///
    /// Returns the created author, or `None` when data already exists.
    pub fn seed_demo_data(&self) -> Result<Option<Author>, ApiError> {
        if !self.authors.list(LoadStrategy::Lazy)?.is_empty() {
            return Ok(None);
        }
        let author = self.authors.add_with_books(DEMO_AUTHOR, DEMO_TITLES)?;
        info!(
            "event=seed_demo_data module=api status=ok author_id={}",
            author.id
        );
        Ok(Some(author))
    }
}
