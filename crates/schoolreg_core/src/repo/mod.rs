//! Storage adapter contract and implementations.
//!
//! # Responsibility
//! - Define the minimal record store the registry needs (`Store`).
//! - Provide SQLite and in-memory adapters of that contract.
//!
//! # Invariants
//! - `save` validates the record before any write.
//! - `save` of an unpersisted record returns it with a fresh, never-reused id.
//! - A second record with the same `unique_key` in one kind is rejected with
//!   `RepoError::UniqueViolation`.

use crate::db::DbError;
use crate::model::record::{EntityKind, Record, RecordId};
use crate::model::validation::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory_store;
mod sqlite_store;

pub use memory_store::MemoryStore;
pub use sqlite_store::SqliteStore;

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level failure.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound {
        kind: EntityKind,
        id: RecordId,
    },
    /// Write collided with another record's unique key.
    UniqueViolation {
        kind: EntityKind,
        key: String,
    },
    /// Persisted body cannot be decoded into its record type.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// `begin`/`commit`/`rollback` called out of order.
    Transaction(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::UniqueViolation { kind, key } => {
                write!(f, "{kind} unique key already taken: `{key}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "store requires table `{table}`"),
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "store requires column `{column}` in table `{table}`"
            ),
            Self::Transaction(message) => write!(f, "transaction misuse: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Minimal record store consumed by the registry.
///
/// Every method is generic over the record type; the record's
/// [`Record::KIND`] selects the backing collection.
pub trait Store {
    /// Inserts an unpersisted record or replaces a persisted one.
    ///
    /// Returns the stored record carrying its id.
    fn save<R: Record>(&mut self, record: R) -> RepoResult<R>;
    /// Removes one record. Missing ids fail with `RepoError::NotFound`.
    fn delete_by_id<R: Record>(&mut self, id: RecordId) -> RepoResult<()>;
    fn find_by_id<R: Record>(&self, id: RecordId) -> RepoResult<Option<R>>;
    /// Exact, case-sensitive match on [`Record::unique_key`].
    fn find_by_unique_field<R: Record>(&self, value: &str) -> RepoResult<Option<R>>;
    /// All records of one kind in id order.
    fn find_all<R: Record>(&self) -> RepoResult<Vec<R>>;
    /// Records whose [`Record::search_key`] starts with `prefix`
    /// (case-sensitive), ordered by search key then id.
    fn find_by_prefix<R: Record>(&self, prefix: &str) -> RepoResult<Vec<R>>;

    /// Opens the atomic unit that the next writes belong to.
    fn begin(&mut self) -> RepoResult<()>;
    fn commit(&mut self) -> RepoResult<()>;
    /// Discards every write since `begin`.
    fn rollback(&mut self) -> RepoResult<()>;
}
