//! Meeting aggregate.
//!
//! # Invariants
//! - `students` contains student `s` iff student `s` lists this meeting.
//! - When `teacher` is set, that teacher's meeting list contains this id.

use super::record::{EntityKind, Record, RecordId, UNPERSISTED_ID};
use super::validation::{require_length, ValidationError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

const ROOM_MAX: usize = 45;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: RecordId,
    pub room: Option<String>,
    pub scheduled_at: NaiveDateTime,
    #[serde(default)]
    teacher: Option<RecordId>,
    #[serde(default)]
    students: Vec<RecordId>,
}

impl Meeting {
    pub fn new(room: Option<String>, scheduled_at: NaiveDateTime) -> Self {
        Self::with_id(UNPERSISTED_ID, room, scheduled_at)
    }

    pub fn with_id(id: RecordId, room: Option<String>, scheduled_at: NaiveDateTime) -> Self {
        Self {
            id,
            room,
            scheduled_at,
            teacher: None,
            students: Vec::new(),
        }
    }

    pub fn teacher(&self) -> Option<RecordId> {
        self.teacher
    }

    /// Ids of attending students.
    pub fn students(&self) -> &[RecordId] {
        &self.students
    }

    pub(crate) fn set_teacher(&mut self, teacher: Option<RecordId>) {
        self.teacher = teacher;
    }

    pub(crate) fn students_mut(&mut self) -> &mut Vec<RecordId> {
        &mut self.students
    }
}

impl Record for Meeting {
    const KIND: EntityKind = EntityKind::Meeting;

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
        self.room.as_deref().unwrap_or("")
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self.room.as_deref() {
            Some(room) => require_length("room", room, 0, ROOM_MAX),
            None => Ok(()),
        }
    }
}
