//! Author record and its book association.
//!
//! # Invariants
//! - `books` is a derived view over `books.author_id`, never stored inline.
//! - An author read with the lazy strategy starts with `Association::NotLoaded`.

use crate::model::book::Book;
use serde::Serialize;

/// Store-assigned author identifier.
pub type AuthorId = i64;

/// Resolution state of a one-to-many association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Association<T> {
    /// Not resolved yet; resolving costs one query.
    NotLoaded,
    /// Resolved, either eagerly by a join or by an explicit lazy load.
    Loaded(Vec<T>),
}

impl<T> Association<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn as_slice(&self) -> Option<&[T]> {
        match self {
            Self::NotLoaded => None,
            Self::Loaded(items) => Some(items.as_slice()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    #[serde(skip)]
    pub(crate) books: Association<Book>,
}

impl Author {
    /// Builds an author whose books are not resolved yet.
    pub fn new(id: AuthorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            books: Association::NotLoaded,
        }
    }

    /// Builds an author with an already resolved book list.
    pub fn with_books(id: AuthorId, name: impl Into<String>, books: Vec<Book>) -> Self {
        Self {
            id,
            name: name.into(),
            books: Association::Loaded(books),
        }
    }

    /// Returns resolved books, or `None` when not loaded yet.
    ///
    /// Never touches the store; see `Author::load_books` for lazy resolution.
    pub fn books(&self) -> Option<&[Book]> {
        self.books.as_slice()
    }

    pub fn books_loaded(&self) -> bool {
        self.books.is_loaded()
    }
}
