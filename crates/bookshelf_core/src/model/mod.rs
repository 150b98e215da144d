//! Domain records for the bookshelf store.
//!
//! # Responsibility
//! - Define the entity shapes returned by repositories and loaders.
//! - Keep association state explicit (`Association`) instead of hidden queries.
//!
//! # Invariants
//! - Every persisted record is identified by a store-assigned integer id.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod author;
pub mod book;
pub mod order;
pub mod user;
