//! Aggregate read queries over the author/book association.
//!
//! # Responsibility
//! - Expose join + group-by reports that return plain rows, not entities.
//! - Keep report SQL inside core.

pub mod book_counts;
