//! Relationship loading for the author/book association.
//!
//! # Responsibility
//! - Resolve `Author::books` and the `Book` -> `Author` back-reference.
//! - Offer lazy (per-access query) and eager (single join) strategies per call.
//!
//! # Invariants
//! - Both strategies yield the same authors and titles; only query count differs.
//! - Lazy resolution is always an explicit method call taking a `Session`.
//! - Reading N authors lazily and resolving every `books` costs 1 + N queries.

use crate::db::Session;
use crate::error::PersistenceResult;
use crate::model::author::{Association, Author, AuthorId};
use crate::model::book::Book;
use log::debug;
use rusqlite::Row;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const AUTHORS_SQL: &str = "SELECT id, name FROM authors ORDER BY id ASC;";

const AUTHOR_BY_ID_SQL: &str = "SELECT id, name FROM authors WHERE id = ?1;";

const AUTHORS_WITH_BOOKS_SQL: &str = "SELECT
    a.id AS author_id,
    a.name AS author_name,
    b.id AS book_id,
    b.title AS book_title
FROM authors a
LEFT OUTER JOIN books b ON b.author_id = a.id
ORDER BY a.id ASC, b.id ASC;";

const BOOKS_BY_AUTHOR_SQL: &str = "SELECT id, title, author_id
FROM books
WHERE author_id = ?1
ORDER BY id ASC;";

const BOOKS_SQL: &str = "SELECT id, title, author_id FROM books ORDER BY id ASC;";

const BOOKS_WITH_AUTHOR_SQL: &str = "SELECT
    b.id AS id,
    b.title AS title,
    b.author_id AS author_id,
    a.name AS author_name
FROM books b
LEFT OUTER JOIN authors a ON a.id = b.author_id
ORDER BY b.id ASC;";

/// Per-query association loading strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Owners first; each association costs one more query when resolved.
    Lazy,
    /// Owners and associations in one joined query.
    Eager,
}

impl LoadStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lazy => "lazy",
            Self::Eager => "eager",
        }
    }
}

impl Display for LoadStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lazy" => Ok(Self::Lazy),
            "eager" => Ok(Self::Eager),
            other => Err(format!(
                "unsupported load strategy `{other}`; expected lazy|eager"
            )),
        }
    }
}

/// Book paired with its resolved back-reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookWithAuthor {
    pub book: Book,
    /// `None` when the book has no author.
    pub author: Option<Author>,
}

/// Author projection with resolved book titles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorView {
    pub id: AuthorId,
    pub name: String,
    pub books: Vec<String>,
}

impl Author {
    /// Resolves this author's books, querying the store only on first call.
    ///
    /// Repeated calls return the already resolved list without a query.
    pub fn load_books(&mut self, session: &Session) -> PersistenceResult<&[Book]> {
        if !self.books.is_loaded() {
            let books = books_for_author(session, self.id)?;
            self.books = Association::Loaded(books);
        }
        Ok(self.books.as_slice().unwrap_or(&[]))
    }
}

impl Book {
    /// Resolves the owning author with one query; no query when unowned.
    pub fn load_author(&self, session: &Session) -> PersistenceResult<Option<Author>> {
        match self.author_id {
            Some(author_id) => find_author(session, author_id),
            None => Ok(None),
        }
    }
}

/// Reads every author using `strategy`.
///
/// With `LoadStrategy::Lazy` the returned authors have unresolved books.
pub fn load_authors(session: &Session, strategy: LoadStrategy) -> PersistenceResult<Vec<Author>> {
    let authors = match strategy {
        LoadStrategy::Lazy => session.query_rows(AUTHORS_SQL, [], author_from_row)?,
        LoadStrategy::Eager => load_authors_joined(session)?,
    };
    debug!(
        "event=authors_load module=loader status=ok strategy={} authors={}",
        strategy,
        authors.len()
    );
    Ok(authors)
}

/// Reads every book together with its author.
pub fn load_books_with_authors(
    session: &Session,
    strategy: LoadStrategy,
) -> PersistenceResult<Vec<BookWithAuthor>> {
    match strategy {
        LoadStrategy::Lazy => {
            let books = session.query_rows(BOOKS_SQL, [], book_from_row)?;
            let mut items = Vec::with_capacity(books.len());
            for book in books {
                let author = book.load_author(session)?;
                items.push(BookWithAuthor { book, author });
            }
            Ok(items)
        }
        LoadStrategy::Eager => session.query_rows(BOOKS_WITH_AUTHOR_SQL, [], |row| {
            let book = book_from_row(row)?;
            let author_name: Option<String> = row.get("author_name")?;
            let author = match (book.author_id, author_name) {
                (Some(author_id), Some(name)) => Some(Author::new(author_id, name)),
                _ => None,
            };
            Ok(BookWithAuthor { book, author })
        }),
    }
}

/// Reads every author with resolved titles.
///
/// The lazy strategy issues one query per author on top of the author read.
pub fn author_views(session: &Session, strategy: LoadStrategy) -> PersistenceResult<Vec<AuthorView>> {
    let started_with = session.query_count();
    let mut authors = load_authors(session, strategy)?;
    let mut views = Vec::with_capacity(authors.len());
    for author in &mut authors {
        let books = author
            .load_books(session)?
            .iter()
            .map(|book| book.title.clone())
            .collect();
        views.push(AuthorView {
            id: author.id,
            name: author.name.clone(),
            books,
        });
    }
    debug!(
        "event=author_views module=loader status=ok strategy={} authors={} queries={}",
        strategy,
        views.len(),
        session.query_count() - started_with
    );
    Ok(views)
}

/// Reads the books referencing `author_id`, oldest first.
pub fn books_for_author(session: &Session, author_id: AuthorId) -> PersistenceResult<Vec<Book>> {
    session.query_rows(BOOKS_BY_AUTHOR_SQL, [author_id], book_from_row)
}

/// Reads one author by id with unresolved books.
pub fn find_author(session: &Session, author_id: AuthorId) -> PersistenceResult<Option<Author>> {
    session.query_optional(AUTHOR_BY_ID_SQL, [author_id], author_from_row)
}

/// Maps a `books` row as stored; title rules apply on write only.
pub(crate) fn book_from_row(row: &Row<'_>) -> PersistenceResult<Book> {
    Ok(Book {
        id: row.get("id")?,
        title: row.get("title")?,
        author_id: row.get("author_id")?,
    })
}

fn author_from_row(row: &Row<'_>) -> PersistenceResult<Author> {
    Ok(Author::new(row.get("id")?, row.get::<_, String>("name")?))
}

fn load_authors_joined(session: &Session) -> PersistenceResult<Vec<Author>> {
    let rows = session.query_rows(AUTHORS_WITH_BOOKS_SQL, [], |row| {
        let author_id: AuthorId = row.get("author_id")?;
        let author_name: String = row.get("author_name")?;
        let book = match row.get::<_, Option<i64>>("book_id")? {
            Some(book_id) => Some(Book {
                id: book_id,
                title: row.get("book_title")?,
                author_id: Some(author_id),
            }),
            None => None,
        };
        Ok((author_id, author_name, book))
    })?;

    let mut authors: Vec<Author> = Vec::new();
    for (author_id, author_name, book) in rows {
        let is_same_author = authors.last().is_some_and(|last| last.id == author_id);
        if !is_same_author {
            authors.push(Author::with_books(author_id, author_name, Vec::new()));
        }
        if let (Some(book), Some(author)) = (book, authors.last_mut()) {
            if let Association::Loaded(books) = &mut author.books {
                books.push(book);
            }
        }
    }
    Ok(authors)
}

#[cfg(test)]
mod tests {
    use super::LoadStrategy;

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("LAZY".parse::<LoadStrategy>().unwrap(), LoadStrategy::Lazy);
        assert_eq!(" eager ".parse::<LoadStrategy>().unwrap(), LoadStrategy::Eager);
        assert!("joined".parse::<LoadStrategy>().is_err());
    }

    #[test]
    fn strategy_displays_stable_names() {
        assert_eq!(LoadStrategy::Lazy.to_string(), "lazy");
        assert_eq!(LoadStrategy::Eager.to_string(), "eager");
    }
}
