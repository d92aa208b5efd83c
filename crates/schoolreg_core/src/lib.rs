//! Core record store for a school registry.
//! This crate is the single source of truth for relation invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod relation;
pub mod repo;
pub mod service;

pub use config::{ConfigError, RegistryConfig, StorageTarget};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use model::city::City;
pub use model::gender::Gender;
pub use model::meeting::Meeting;
pub use model::record::{EntityKind, Record, RecordId};
pub use model::speciality::Speciality;
pub use model::student::Student;
pub use model::teacher::Teacher;
pub use model::user::{User, UserOwner};
pub use model::validation::ValidationError;
pub use relation::audit::{Inconsistency, Snapshot};
pub use repo::{MemoryStore, RepoError, RepoResult, SqliteStore, Store};
pub use service::{
    Lookup, MeetingDraft, SchoolRegistry, ServiceError, ServiceResult, StudentDraft,
    TeacherDraft,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
