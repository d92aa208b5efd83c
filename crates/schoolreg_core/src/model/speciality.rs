//! Teacher speciality reference record.

use super::record::{EntityKind, Record, RecordId, UNPERSISTED_ID};
use super::validation::{require_length, require_not_blank, ValidationError};
use serde::{Deserialize, Serialize};

const SPECIALITY_NAME_MAX: usize = 50;

/// Subject area a teacher belongs to.
///
/// `teachers` is a back-reference maintained by the relationship engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speciality {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    teachers: Vec<RecordId>,
}

impl Speciality {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(UNPERSISTED_ID, name)
    }

    pub fn with_id(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            teachers: Vec::new(),
        }
    }

    /// Ids of teachers referencing this speciality.
    pub fn teachers(&self) -> &[RecordId] {
        &self.teachers
    }

    pub(crate) fn teachers_mut(&mut self) -> &mut Vec<RecordId> {
        &mut self.teachers
    }
}

impl Record for Speciality {
    const KIND: EntityKind = EntityKind::Speciality;

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
        require_length("name", &self.name, 1, SPECIALITY_NAME_MAX)
    }
}
