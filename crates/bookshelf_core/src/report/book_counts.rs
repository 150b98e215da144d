//! Books-per-author report.
//!
//! # Invariants
//! - Uses an inner join: authors without books do not appear.
//! - Groups by author name, so authors sharing a name form one row.
//! - Rows are ordered by author name.

use crate::db::Session;
use crate::error::PersistenceResult;
use log::debug;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

const BOOK_COUNTS_SQL: &str = "SELECT
    authors.name AS author,
    COUNT(books.id) AS book_count
FROM authors
INNER JOIN books ON authors.id = books.author_id
GROUP BY authors.name
ORDER BY authors.name ASC;";

/// One report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorBookCount {
    pub author: String,
    pub book_count: i64,
}

/// Counts books per author name over authors that own at least one book.
pub fn author_book_counts(session: &Session) -> PersistenceResult<Vec<AuthorBookCount>> {
    let rows = session.query_rows(BOOK_COUNTS_SQL, [], parse_count_row)?;
    debug!(
        "event=book_counts module=report status=ok rows={}",
        rows.len()
    );
    Ok(rows)
}

fn parse_count_row(row: &Row<'_>) -> PersistenceResult<AuthorBookCount> {
    Ok(AuthorBookCount {
        author: row.get("author")?,
        book_count: row.get("book_count")?,
    })
}
