//! Storage-facing record contract.
//!
//! # Responsibility
//! - Give every aggregate a stable kind, id slot, unique key and search key.
//! - Let store adapters persist any aggregate without knowing its shape.
//!
//! # Invariants
//! - `UNPERSISTED_ID` (0) is never assigned by a store.
//! - `unique_key` is enforced unique per `EntityKind` by every store.

use super::validation::ValidationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned record identifier.
pub type RecordId = i64;

/// Id carried by a record that has not been saved yet.
pub const UNPERSISTED_ID: RecordId = 0;

/// Closed set of aggregate kinds held by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    City,
    Speciality,
    User,
    Student,
    Teacher,
    Meeting,
}

impl EntityKind {
    /// Every kind, in dependency order (leaves first).
    pub const ALL: [EntityKind; 6] = [
        EntityKind::City,
        EntityKind::Speciality,
        EntityKind::User,
        EntityKind::Student,
        EntityKind::Teacher,
        EntityKind::Meeting,
    ];

    /// Backing table name used by the SQLite adapter.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::City => "cities",
            Self::Speciality => "specialities",
            Self::User => "users",
            Self::Student => "students",
            Self::Teacher => "teachers",
            Self::Meeting => "meetings",
        }
    }

    /// Lowercase label used in log events and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Speciality => "speciality",
            Self::User => "user",
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Meeting => "meeting",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Aggregate persisted through a [`crate::repo::Store`].
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Kind tag selecting the backing table.
    const KIND: EntityKind;

    /// Current id, `UNPERSISTED_ID` before the first save.
    fn record_id(&self) -> RecordId;

    /// Stamps the store-assigned id. Called by store adapters only.
    fn assign_id(&mut self, id: RecordId);

    /// Value that must be unique among records of the same kind, if any.
    fn unique_key(&self) -> Option<&str>;

    /// Value matched by prefix lookups.
    fn search_key(&self) -> &str;

    /// Checks field invariants. Stores call this before every write.
    fn validate(&self) -> Result<(), ValidationError>;

    fn is_persisted(&self) -> bool {
        self.record_id() != UNPERSISTED_ID
    }
}
