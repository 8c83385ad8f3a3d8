//! Repository Module
//!
//! CRUD and ledger operations over the SurrealDB tables.
//!
//! Counters that live on shared documents (product stock, voucher
//! claim/usage counts) are only ever changed through single-statement
//! conditional updates, evaluated atomically per document by the storage
//! engine. Read-modify-write on those counters in application code is a
//! bug.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;
pub mod voucher;

// Re-exports
pub use cart::CartRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use user::UserRepository;
pub use voucher::VoucherRepository;

use shared::ApiError;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => ApiError::not_found(msg),
            RepoError::Duplicate(msg) => ApiError::conflict(msg),
            RepoError::Validation(msg) => ApiError::validation(msg),
            RepoError::Database(msg) => ApiError::database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
