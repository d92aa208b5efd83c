//! Student aggregate.
//!
//! # Invariants
//! - `meetings` contains meeting `m` iff meeting `m` lists this student.
//! - `city` and `user` change only through the relationship engine.

use super::gender::Gender;
use super::record::{EntityKind, Record, RecordId, UNPERSISTED_ID};
use super::validation::{require_length, require_not_blank, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const NAME_MAX: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: RecordId,
    pub firstname: String,
    pub lastname: String,
    pub gender: Gender,
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    city: Option<RecordId>,
    #[serde(default)]
    user: Option<RecordId>,
    #[serde(default)]
    meetings: Vec<RecordId>,
}

impl Student {
    /// Creates an unpersisted student without relations.
    pub fn new(
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        gender: Gender,
        birthdate: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: UNPERSISTED_ID,
            firstname: firstname.into(),
            lastname: lastname.into(),
            gender,
            birthdate,
            city: None,
            user: None,
            meetings: Vec::new(),
        }
    }

    /// Same as [`Student::new`] with a known id.
    pub fn with_id(
        id: RecordId,
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        gender: Gender,
        birthdate: Option<NaiveDate>,
    ) -> Self {
        let mut student = Self::new(firstname, lastname, gender, birthdate);
        student.id = id;
        student
    }

    pub fn city(&self) -> Option<RecordId> {
        self.city
    }

    pub fn user(&self) -> Option<RecordId> {
        self.user
    }

    /// Ids of meetings this student attends.
    pub fn meetings(&self) -> &[RecordId] {
        &self.meetings
    }

    pub(crate) fn set_city(&mut self, city: Option<RecordId>) {
        self.city = city;
    }

    pub(crate) fn set_user(&mut self, user: Option<RecordId>) {
        self.user = user;
    }

    pub(crate) fn meetings_mut(&mut self) -> &mut Vec<RecordId> {
        &mut self.meetings
    }
}

impl Record for Student {
    const KIND: EntityKind = EntityKind::Student;

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn unique_key(&self) -> Option<&str> {
        None
    }

    fn search_key(&self) -> &str {
        self.lastname.as_str()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_not_blank("lastname", &self.lastname)?;
        require_length("lastname", &self.lastname, 1, NAME_MAX)?;
        require_length("firstname", &self.firstname, 0, NAME_MAX)
    }
}
