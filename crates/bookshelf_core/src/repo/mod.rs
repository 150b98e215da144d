//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define entity-level data access contracts.
//! - Hide unit-of-work management from callers behind `TransactionCoordinator`.
//!
//! # Invariants
//! - Every repository call opens and closes exactly one session.
//! - Store failures are rolled back and returned, never swallowed.
//! - Absence is a normal result (`Option`/`bool`), not an error.

pub mod author_repo;
pub mod book_repo;
pub mod order_repo;
pub mod user_repo;
