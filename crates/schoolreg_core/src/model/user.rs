//! Authentication identity record.
//!
//! # Responsibility
//! - Hold the login name and opaque password hash of one person.
//! - Point back at the student or teacher that owns this identity.
//!
//! # Invariants
//! - `username` is lowercase and unique.
//! - At most one of `teacher` / `student` is set.
//! - The password hash is never written to `Debug` output.

use super::record::{EntityKind, Record, RecordId, UNPERSISTED_ID};
use super::validation::{require_length, require_not_blank, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 52;
const PASSWORD_HASH_MAX: usize = 150;

/// Person that owns a user identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOwner {
    Student(RecordId),
    Teacher(RecordId),
}

impl UserOwner {
    pub fn kind(self) -> EntityKind {
        match self {
            Self::Student(_) => EntityKind::Student,
            Self::Teacher(_) => EntityKind::Teacher,
        }
    }

    pub fn id(self) -> RecordId {
        match self {
            Self::Student(id) | Self::Teacher(id) => id,
        }
    }
}

/// Login identity of a student or teacher.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    teacher: Option<RecordId>,
    #[serde(default)]
    student: Option<RecordId>,
}

/// Normalizes a raw username to its stored form.
pub fn normalize_username(raw: &str) -> String {
    raw.to_lowercase()
}

impl User {
    /// Creates an unpersisted user. The username is stored as given.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self::with_id(UNPERSISTED_ID, username, password_hash)
    }

    pub fn with_id(
        id: RecordId,
        username: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            password_hash: password_hash.into(),
            teacher: None,
            student: None,
        }
    }

    pub fn teacher(&self) -> Option<RecordId> {
        self.teacher
    }

    pub fn student(&self) -> Option<RecordId> {
        self.student
    }

    /// Returns the person owning this identity, if any.
    pub fn owner(&self) -> Option<UserOwner> {
        match (self.student, self.teacher) {
            (Some(id), _) => Some(UserOwner::Student(id)),
            (None, Some(id)) => Some(UserOwner::Teacher(id)),
            (None, None) => None,
        }
    }

    pub(crate) fn set_teacher(&mut self, teacher: Option<RecordId>) {
        self.teacher = teacher;
    }

    pub(crate) fn set_student(&mut self, student: Option<RecordId>) {
        self.student = student;
    }
}

impl Debug for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("teacher", &self.teacher)
            .field("student", &self.student)
            .finish()
    }
}

impl Record for User {
    const KIND: EntityKind = EntityKind::User;

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn unique_key(&self) -> Option<&str> {
        Some(self.username.as_str())
    }

    fn search_key(&self) -> &str {
        self.username.as_str()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_not_blank("username", &self.username)?;
        require_length("username", &self.username, USERNAME_MIN, USERNAME_MAX)?;
        if self.username != normalize_username(&self.username) {
            return Err(ValidationError::NotLowercase { field: "username" });
        }
        require_not_blank("password_hash", &self.password_hash)?;
        require_length("password_hash", &self.password_hash, 1, PASSWORD_HASH_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::{User, UserOwner};
    use crate::model::record::Record;
    use crate::model::validation::ValidationError;

    #[test]
    fn debug_output_hides_password_hash() {
        let user = User::new("anad", "s3cret-hash");
        let rendered = format!("{user:?}");
        assert!(rendered.contains("anad"));
        assert!(!rendered.contains("s3cret-hash"));
    }

    #[test]
    fn mixed_case_username_fails_validation() {
        let err = User::new("AnaD", "hash").validate().unwrap_err();
        assert_eq!(err, ValidationError::NotLowercase { field: "username" });
    }

    #[test]
    fn owner_reports_student_link() {
        let mut user = User::with_id(5, "anad", "hash");
        assert_eq!(user.owner(), None);
        user.set_student(Some(9));
        assert_eq!(user.owner(), Some(UserOwner::Student(9)));
    }
}
