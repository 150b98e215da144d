//! Author repository contract and SQLite implementation.
//!
//! # Invariants
//! - `add_with_books` writes the author and all of its books in one session.
//! - Authors returned by `list(LoadStrategy::Lazy)` have unresolved books.

use crate::db::Store;
use crate::error::{IntegrityViolation, PersistenceResult};
use crate::loader::{find_author, load_authors, LoadStrategy};
use crate::model::author::{Author, AuthorId};
use crate::model::book::Book;
use crate::transaction::TransactionCoordinator;
use log::info;
use rusqlite::params;

pub trait AuthorRepository {
    /// Persists one author without books.
    fn add(&self, name: &str) -> PersistenceResult<Author>;
    /// Persists one author and its books atomically.
    fn add_with_books(&self, name: &str, titles: &[&str]) -> PersistenceResult<Author>;
    fn get(&self, author_id: AuthorId) -> PersistenceResult<Option<Author>>;
    fn list(&self, strategy: LoadStrategy) -> PersistenceResult<Vec<Author>>;
}

#[derive(Debug, Clone)]
pub struct SqliteAuthorRepository {
    tx: TransactionCoordinator,
}

impl SqliteAuthorRepository {
    pub fn new(store: Store) -> Self {
        Self {
            tx: TransactionCoordinator::new(store),
        }
    }
}

impl AuthorRepository for SqliteAuthorRepository {
    fn add(&self, name: &str) -> PersistenceResult<Author> {
        self.add_with_books(name, &[])
    }

    fn add_with_books(&self, name: &str, titles: &[&str]) -> PersistenceResult<Author> {
        let author = self.tx.run(|session| -> PersistenceResult<Author> {
            if name.trim().is_empty() {
                return Err(IntegrityViolation::RequiredField {
                    entity: "author",
                    field: "name",
                }
                .into());
            }
            let author_id = session.insert("INSERT INTO authors (name) VALUES (?1);", [name])?;

            let mut books = Vec::with_capacity(titles.len());
            for title in titles {
                Book::validate_title(title)?;
                let book_id = session.insert(
                    "INSERT INTO books (title, author_id) VALUES (?1, ?2);",
                    params![title, author_id],
                )?;
                books.push(Book {
                    id: book_id,
                    title: (*title).to_string(),
                    author_id: Some(author_id),
                });
            }
            Ok(Author::with_books(author_id, name, books))
        })?;

        info!(
            "event=author_add module=repo status=ok author_id={} books={}",
            author.id,
            titles.len()
        );
        Ok(author)
    }

    fn get(&self, author_id: AuthorId) -> PersistenceResult<Option<Author>> {
        self.tx.read(|session| find_author(session, author_id))
    }

    fn list(&self, strategy: LoadStrategy) -> PersistenceResult<Vec<Author>> {
        self.tx.read(|session| load_authors(session, strategy))
    }
}
