//! Book repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/delete APIs for books with unit-of-work handling hidden.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Every call opens and closes exactly one session.
//! - A failed write leaves no partial state; the error reaches the caller.
//! - `delete` of an absent id returns `false` and changes nothing.

use crate::db::Store;
use crate::error::{PersistenceError, PersistenceResult};
use crate::loader::{book_from_row, books_for_author};
use crate::model::author::AuthorId;
use crate::model::book::{Book, BookId};
use crate::transaction::TransactionCoordinator;
use log::{debug, error, info};
use rusqlite::params;
use std::time::Instant;

const BOOK_BY_ID_SQL: &str = "SELECT id, title, author_id FROM books WHERE id = ?1;";

/// Repository interface for book operations.
pub trait BookRepository {
    /// Persists a new book and returns it with its assigned id.
    fn add(&self, title: &str, author_id: Option<AuthorId>) -> PersistenceResult<Book>;
    /// Loads one book by id.
    fn get(&self, book_id: BookId) -> PersistenceResult<Option<Book>>;
    /// Lists books referencing `author_id`; empty when there are none.
    fn list_by_author(&self, author_id: AuthorId) -> PersistenceResult<Vec<Book>>;
    /// Hard-deletes one book. Returns `false` when it does not exist.
    fn delete(&self, book_id: BookId) -> PersistenceResult<bool>;
}

/// SQLite-backed book repository.
#[derive(Debug, Clone)]
pub struct SqliteBookRepository {
    tx: TransactionCoordinator,
}

impl SqliteBookRepository {
    pub fn new(store: Store) -> Self {
        Self {
            tx: TransactionCoordinator::new(store),
        }
    }
}

impl BookRepository for SqliteBookRepository {
    fn add(&self, title: &str, author_id: Option<AuthorId>) -> PersistenceResult<Book> {
        let started_at = Instant::now();
        let result = self.tx.run(|session| -> PersistenceResult<Book> {
            Book::validate_title(title)?;
            let id = session.insert(
                "INSERT INTO books (title, author_id) VALUES (?1, ?2);",
                params![title, author_id],
            )?;
            session
                .query_optional(BOOK_BY_ID_SQL, [id], book_from_row)?
                .ok_or_else(|| {
                    PersistenceError::InvalidData(format!("book {id} missing in read-back"))
                })
        });

        match &result {
            Ok(book) => info!(
                "event=book_add module=repo status=ok book_id={} duration_ms={}",
                book.id,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=book_add module=repo status=error duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }
        result
    }

    fn get(&self, book_id: BookId) -> PersistenceResult<Option<Book>> {
        self.tx
            .read(|session| session.query_optional(BOOK_BY_ID_SQL, [book_id], book_from_row))
    }

    fn list_by_author(&self, author_id: AuthorId) -> PersistenceResult<Vec<Book>> {
        let books = self
            .tx
            .read(|session| books_for_author(session, author_id))?;
        debug!(
            "event=book_list module=repo status=ok author_id={} count={}",
            author_id,
            books.len()
        );
        Ok(books)
    }

    fn delete(&self, book_id: BookId) -> PersistenceResult<bool> {
        let result = self.tx.run(|session| -> PersistenceResult<bool> {
            let exists = session
                .query_optional(BOOK_BY_ID_SQL, [book_id], book_from_row)?
                .is_some();
            if !exists {
                return Ok(false);
            }
            session.execute("DELETE FROM books WHERE id = ?1;", [book_id])?;
            Ok(true)
        });

        match &result {
            Ok(true) => info!("event=book_delete module=repo status=ok book_id={book_id}"),
            Ok(false) => info!("event=book_delete module=repo status=not_found book_id={book_id}"),
            Err(err) => error!(
                "event=book_delete module=repo status=error book_id={} error_code={} error={}",
                book_id,
                err.code(),
                err
            ),
        }
        result
    }
}
