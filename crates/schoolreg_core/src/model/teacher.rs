//! Teacher aggregate.
//!
//! # Invariants
//! - `ssn` is exactly six characters and unique among teachers.
//! - `meetings` only lists meetings whose teacher reference is this teacher.

use super::record::{EntityKind, Record, RecordId, UNPERSISTED_ID};
use super::validation::{require_length, require_not_blank, ValidationError};
use serde::{Deserialize, Serialize};

pub(crate) const SSN_LENGTH: usize = 6;
const NAME_MAX: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: RecordId,
    pub ssn: String,
    pub firstname: String,
    pub lastname: String,
    #[serde(default)]
    speciality: Option<RecordId>,
    #[serde(default)]
    user: Option<RecordId>,
    #[serde(default)]
    meetings: Vec<RecordId>,
}

impl Teacher {
    pub fn new(
        ssn: impl Into<String>,
        firstname: impl Into<String>,
        lastname: impl Into<String>,
    ) -> Self {
        Self::with_id(UNPERSISTED_ID, ssn, firstname, lastname)
    }

    pub fn with_id(
        id: RecordId,
        ssn: impl Into<String>,
        firstname: impl Into<String>,
        lastname: impl Into<String>,
    ) -> Self {
        Self {
            id,
            ssn: ssn.into(),
            firstname: firstname.into(),
            lastname: lastname.into(),
            speciality: None,
            user: None,
            meetings: Vec::new(),
        }
    }

    pub fn speciality(&self) -> Option<RecordId> {
        self.speciality
    }

    pub fn user(&self) -> Option<RecordId> {
        self.user
    }

    /// Ids of meetings assigned to this teacher.
    pub fn meetings(&self) -> &[RecordId] {
        &self.meetings
    }

    pub(crate) fn set_speciality(&mut self, speciality: Option<RecordId>) {
        self.speciality = speciality;
    }

    pub(crate) fn set_user(&mut self, user: Option<RecordId>) {
        self.user = user;
    }

    pub(crate) fn meetings_mut(&mut self) -> &mut Vec<RecordId> {
        &mut self.meetings
    }
}

impl Record for Teacher {
    const KIND: EntityKind = EntityKind::Teacher;

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn unique_key(&self) -> Option<&str> {
        Some(self.ssn.as_str())
    }

    fn search_key(&self) -> &str {
        self.lastname.as_str()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_length("ssn", &self.ssn, SSN_LENGTH, SSN_LENGTH)?;
        require_not_blank("lastname", &self.lastname)?;
        require_length("lastname", &self.lastname, 1, NAME_MAX)?;
        require_length("firstname", &self.firstname, 0, NAME_MAX)
    }
}
