//! City reference record.
//!
//! # Invariants
//! - `name` is unique among cities (exact, case-sensitive).
//! - `students` mirrors every student whose city reference is this city;
//!   only the relationship engine mutates it.

use super::record::{EntityKind, Record, RecordId, UNPERSISTED_ID};
use super::validation::{require_length, require_not_blank, ValidationError};
use serde::{Deserialize, Serialize};

pub(crate) const CITY_NAME_MIN: usize = 3;
pub(crate) const CITY_NAME_MAX: usize = 45;

/// City a student lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    students: Vec<RecordId>,
}

impl City {
    /// Creates an unpersisted city.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(UNPERSISTED_ID, name)
    }

    /// Creates a city with a known id and no linked students.
    pub fn with_id(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            students: Vec::new(),
        }
    }

    /// Ids of students referencing this city.
    pub fn students(&self) -> &[RecordId] {
        &self.students
    }

    pub(crate) fn students_mut(&mut self) -> &mut Vec<RecordId> {
        &mut self.students
    }
}

impl Record for City {
    const KIND: EntityKind = EntityKind::City;

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn unique_key(&self) -> Option<&str> {
        Some(self.name.as_str())
    }

    fn search_key(&self) -> &str {
        self.name.as_str()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_not_blank("name", &self.name)?;
        require_length("name", &self.name, CITY_NAME_MIN, CITY_NAME_MAX)
    }
}
