//! Data-access core for the bookshelf store.
//! Owns schema, sessions, relationship loading and transactional writes.

pub mod api;
pub mod db;
pub mod error;
pub mod loader;
pub mod logging;
pub mod model;
pub mod repo;
pub mod report;
pub mod transaction;

pub use api::{ApiError, BookshelfApi, CreateBookRequest, StatusResponse};
pub use db::{
    DbError, DbResult, Session, SessionMode, Store, StoreConfig, StoreLocation, StoreStats,
};
pub use error::{IntegrityViolation, PersistenceError, PersistenceResult};
pub use loader::{AuthorView, BookWithAuthor, LoadStrategy};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::author::{Association, Author, AuthorId};
pub use model::book::{Book, BookId};
pub use model::order::{Order, OrderId};
pub use model::user::{NewUser, User, UserId};
pub use report::book_counts::{author_book_counts, AuthorBookCount};
pub use repo::author_repo::{AuthorRepository, SqliteAuthorRepository};
pub use repo::book_repo::{BookRepository, SqliteBookRepository};
pub use repo::order_repo::{OrderRepository, SqliteOrderRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use transaction::{TransactionCoordinator, TransactionError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
