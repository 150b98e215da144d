//! Book record.
//!
//! # Invariants
//! - `title` must not be blank.
//! - `author_id`, when set, references an existing author.

use crate::error::IntegrityViolation;
use crate::model::author::AuthorId;
use serde::{Deserialize, Serialize};

/// Store-assigned book identifier.
pub type BookId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author_id: Option<AuthorId>,
}

impl Book {
    /// Checks required fields before a write reaches the store.
    pub fn validate_title(title: &str) -> Result<(), IntegrityViolation> {
        if title.trim().is_empty() {
            return Err(IntegrityViolation::RequiredField {
                entity: "book",
                field: "title",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Book;
    use crate::error::IntegrityViolation;

    #[test]
    fn blank_titles_are_rejected() {
        assert_eq!(
            Book::validate_title("  "),
            Err(IntegrityViolation::RequiredField {
                entity: "book",
                field: "title"
            })
        );
        assert!(Book::validate_title("Rekviem").is_ok());
    }
}
