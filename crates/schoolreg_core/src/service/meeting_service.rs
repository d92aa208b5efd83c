//! Meeting use-cases.
//!
//! # Responsibility
//! - Schedule meetings, assign a teacher and enroll students.
//! - Route every membership change through the relationship engine.
//!
//! # Invariants
//! - A meeting lists student `s` iff `s` lists the meeting.
//! - A meeting's teacher lists the meeting.
//! - Deleting a meeting never deletes its teacher or students.

use super::crud::{insert_new, non_empty, require, require_key};
use super::error::ServiceResult;
use super::registry::SchoolRegistry;
use crate::model::meeting::Meeting;
use crate::model::record::RecordId;
use crate::model::student::Student;
use crate::model::teacher::Teacher;
use crate::relation::engine::{
    link_meeting_student, link_meeting_teacher, unlink_meeting_student, unlink_meeting_teacher,
};
use crate::repo::Store;
use chrono::NaiveDateTime;
use log::warn;

const SCOPE: &str = "meeting";

/// Caller input for a meeting insert or full replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingDraft {
    pub room: Option<String>,
    pub scheduled_at: NaiveDateTime,
    /// SSN of the assigned teacher.
    pub teacher_ssn: Option<String>,
    /// Enrolled students; duplicates are ignored.
    pub student_ids: Vec<RecordId>,
}

pub struct MeetingService<'r, S: Store> {
    registry: &'r SchoolRegistry<S>,
}

impl<'r, S: Store> MeetingService<'r, S> {
    pub(crate) fn new(registry: &'r SchoolRegistry<S>) -> Self {
        Self { registry }
    }

    /// Schedules a meeting with its teacher and students.
    ///
    /// # Errors
    /// - `NotFound` for an unknown teacher SSN or student id.
    pub fn insert(&self, draft: MeetingDraft) -> ServiceResult<Meeting> {
        self.registry.run(SCOPE, "insert", |store| {
            let teacher = resolve_teacher(store, draft.teacher_ssn.as_deref())?;
            let students = resolve_students(store, &draft.student_ids)?;

            let mut meeting = insert_new(store, Meeting::new(draft.room, draft.scheduled_at))?;
            reassign_teacher(store, &mut meeting, teacher)?;
            for student in students {
                enroll(store, &mut meeting, student)?;
            }
            Ok(store.save(meeting)?)
        })
    }

    /// Replaces room, time, teacher and the enrolled set of meeting `id`.
    ///
    /// Students missing from the draft are withdrawn; new ones are enrolled.
    pub fn update(&self, id: RecordId, draft: MeetingDraft) -> ServiceResult<Meeting> {
        self.registry.run(SCOPE, "update", |store| {
            let mut meeting = require::<Meeting, S>(store, id)?;
            let teacher = resolve_teacher(store, draft.teacher_ssn.as_deref())?;
            let students = resolve_students(store, &draft.student_ids)?;

            meeting.room = draft.room;
            meeting.scheduled_at = draft.scheduled_at;
            reassign_teacher(store, &mut meeting, teacher)?;

            let dropped: Vec<RecordId> = meeting
                .students()
                .iter()
                .copied()
                .filter(|student_id| !draft.student_ids.contains(student_id))
                .collect();
            for student_id in dropped {
                withdraw(store, &mut meeting, student_id)?;
            }
            for student in students {
                enroll(store, &mut meeting, student)?;
            }
            Ok(store.save(meeting)?)
        })
    }

    /// Removes meeting `id` from its teacher and students, then deletes it.
    pub fn delete(&self, id: RecordId) -> ServiceResult<Meeting> {
        self.registry.run(SCOPE, "delete", |store| {
            let mut meeting = require::<Meeting, S>(store, id)?;
            let snapshot = meeting.clone();

            reassign_teacher(store, &mut meeting, None)?;
            for student_id in meeting.students().to_vec() {
                withdraw(store, &mut meeting, student_id)?;
            }
            store.delete_by_id::<Meeting>(id)?;
            Ok(snapshot)
        })
    }

    pub fn get_by_id(&self, id: RecordId) -> ServiceResult<Meeting> {
        self.registry
            .run(SCOPE, "get_by_id", |store| require::<Meeting, S>(store, id))
    }

    pub fn list_all(&self) -> ServiceResult<Vec<Meeting>> {
        self.registry
            .run(SCOPE, "list_all", |store| non_empty(store.find_all::<Meeting>()?))
    }

    /// Adds a student to a meeting. Returns `false` if already enrolled.
    pub fn enroll_student(
        &self,
        meeting_id: RecordId,
        student_id: RecordId,
    ) -> ServiceResult<bool> {
        self.registry.run(SCOPE, "enroll_student", |store| {
            let mut meeting = require::<Meeting, S>(store, meeting_id)?;
            let student = require::<Student, S>(store, student_id)?;
            let linked = enroll(store, &mut meeting, student)?;
            if linked {
                store.save(meeting)?;
            }
            Ok(linked)
        })
    }

    /// Removes a student from a meeting.
    ///
    /// Returns `true` only if both sides held the link; `false` reports a
    /// link that was absent or one-sided, and is not an error.
    pub fn withdraw_student(
        &self,
        meeting_id: RecordId,
        student_id: RecordId,
    ) -> ServiceResult<bool> {
        self.registry.run(SCOPE, "withdraw_student", |store| {
            let mut meeting = require::<Meeting, S>(store, meeting_id)?;
            require::<Student, S>(store, student_id)?;
            let consistent = withdraw(store, &mut meeting, student_id)?;
            store.save(meeting)?;
            Ok(consistent)
        })
    }

    /// Assigns the teacher with `ssn`, detaching any previous teacher.
    ///
    /// Returns `false` when that teacher was already assigned.
    pub fn assign_teacher(&self, meeting_id: RecordId, ssn: &str) -> ServiceResult<bool> {
        self.registry.run(SCOPE, "assign_teacher", |store| {
            let mut meeting = require::<Meeting, S>(store, meeting_id)?;
            let teacher = require_key::<Teacher, S>(store, ssn)?;
            let assigned = reassign_teacher(store, &mut meeting, Some(teacher))?;
            if assigned {
                store.save(meeting)?;
            }
            Ok(assigned)
        })
    }
}

fn resolve_teacher<S: Store>(store: &S, ssn: Option<&str>) -> ServiceResult<Option<Teacher>> {
    ssn.map(|ssn| require_key::<Teacher, S>(store, ssn))
        .transpose()
}

fn resolve_students<S: Store>(store: &S, ids: &[RecordId]) -> ServiceResult<Vec<Student>> {
    let mut students: Vec<Student> = Vec::with_capacity(ids.len());
    for id in ids {
        if students.iter().any(|student| student.id == *id) {
            continue;
        }
        students.push(require::<Student, S>(store, *id)?);
    }
    Ok(students)
}

/// Moves `meeting` from its current teacher to `target`. Saves the teachers
/// only; the caller saves the meeting.
fn reassign_teacher<S: Store>(
    store: &mut S,
    meeting: &mut Meeting,
    target: Option<Teacher>,
) -> ServiceResult<bool> {
    let target_id = target.as_ref().map(|teacher| teacher.id);
    if meeting.teacher() == target_id {
        return Ok(false);
    }
    if let Some(current_id) = meeting.teacher() {
        match store.find_by_id::<Teacher>(current_id)? {
            Some(mut current) => {
                unlink_meeting_teacher(meeting, &mut current);
                store.save(current)?;
            }
            None => {
                warn!(
                    "event=meeting_reassign module=service status=dangling meeting_id={} teacher_id={current_id}",
                    meeting.id
                );
                meeting.set_teacher(None);
            }
        }
    }
    let Some(mut teacher) = target else {
        return Ok(true);
    };
    let linked = link_meeting_teacher(meeting, Some(&mut teacher));
    store.save(teacher)?;
    Ok(linked)
}

/// Links `student` into `meeting` and saves the student when changed.
fn enroll<S: Store>(
    store: &mut S,
    meeting: &mut Meeting,
    mut student: Student,
) -> ServiceResult<bool> {
    let linked = link_meeting_student(meeting, Some(&mut student));
    if linked {
        store.save(student)?;
    }
    Ok(linked)
}

/// Unlinks student `student_id` from `meeting`, tolerating a missing student.
fn withdraw<S: Store>(
    store: &mut S,
    meeting: &mut Meeting,
    student_id: RecordId,
) -> ServiceResult<bool> {
    match store.find_by_id::<Student>(student_id)? {
        Some(mut student) => {
            let consistent = unlink_meeting_student(meeting, &mut student);
            if !consistent {
                warn!(
                    "event=meeting_withdraw module=service status=inconsistent meeting_id={} student_id={student_id}",
                    meeting.id
                );
            }
            store.save(student)?;
            Ok(consistent)
        }
        None => {
            warn!(
                "event=meeting_withdraw module=service status=dangling meeting_id={} student_id={student_id}",
                meeting.id
            );
            meeting.students_mut().retain(|id| *id != student_id);
            Ok(false)
        }
    }
}
