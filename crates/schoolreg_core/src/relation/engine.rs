//! Link/unlink primitives over in-memory aggregates.
//!
//! Callers load both records, apply one of these functions, then save both
//! inside the same store transaction. The functions never touch storage.
//!
//! A `false` return is informational: either the call was a no-op or the
//! input was already inconsistent. It is never an error.

use crate::model::city::City;
use crate::model::meeting::Meeting;
use crate::model::record::RecordId;
use crate::model::speciality::Speciality;
use crate::model::student::Student;
use crate::model::teacher::Teacher;
use crate::model::user::User;

/// Points `student` at `city` and records it in the city's back-references.
///
/// Returns `false` when `student` is absent or already in this city. Detaching
/// the student from a previous city is the caller's job
/// ([`unlink_city_student`]).
pub fn link_city_student(city: &mut City, student: Option<&mut Student>) -> bool {
    let Some(student) = student else {
        return false;
    };
    if student.city() == Some(city.id) {
        return false;
    }
    student.set_city(Some(city.id));
    push_unique(city.students_mut(), student.id);
    true
}

/// Clears `student.city` if it points at `city` and drops the back-reference.
pub fn unlink_city_student(city: &mut City, student: &mut Student) -> bool {
    let listed = remove_id(city.students_mut(), student.id);
    let pointed = student.city() == Some(city.id);
    if pointed {
        student.set_city(None);
    }
    listed && pointed
}

/// Points `teacher` at `speciality`; same contract as [`link_city_student`].
pub fn link_speciality_teacher(speciality: &mut Speciality, teacher: Option<&mut Teacher>) -> bool {
    let Some(teacher) = teacher else {
        return false;
    };
    if teacher.speciality() == Some(speciality.id) {
        return false;
    }
    teacher.set_speciality(Some(speciality.id));
    push_unique(speciality.teachers_mut(), teacher.id);
    true
}

pub fn unlink_speciality_teacher(speciality: &mut Speciality, teacher: &mut Teacher) -> bool {
    let listed = remove_id(speciality.teachers_mut(), teacher.id);
    let pointed = teacher.speciality() == Some(speciality.id);
    if pointed {
        teacher.set_speciality(None);
    }
    listed && pointed
}

/// Adds `student` to `meeting` on both sides.
///
/// Membership is decided by scanning the student's own meeting set, so a
/// meeting-side entry left behind by an earlier inconsistency is not
/// duplicated either.
pub fn link_meeting_student(meeting: &mut Meeting, student: Option<&mut Student>) -> bool {
    let Some(student) = student else {
        return false;
    };
    if student.meetings().iter().any(|id| *id == meeting.id) {
        return false;
    }
    student.meetings_mut().push(meeting.id);
    push_unique(meeting.students_mut(), student.id);
    true
}

/// Removes `student` from `meeting` on both sides.
///
/// Returns `true` only when both sides held the link before the call.
pub fn unlink_meeting_student(meeting: &mut Meeting, student: &mut Student) -> bool {
    let in_meeting = remove_id(meeting.students_mut(), student.id);
    let in_student = remove_id(student.meetings_mut(), meeting.id);
    in_meeting && in_student
}

/// Assigns `meeting` to `teacher`.
///
/// Returns `false` when `teacher` is absent or already assigned. A previous
/// teacher must be detached first with [`unlink_meeting_teacher`].
pub fn link_meeting_teacher(meeting: &mut Meeting, teacher: Option<&mut Teacher>) -> bool {
    let Some(teacher) = teacher else {
        return false;
    };
    if meeting.teacher() == Some(teacher.id) {
        return false;
    }
    meeting.set_teacher(Some(teacher.id));
    push_unique(teacher.meetings_mut(), meeting.id);
    true
}

pub fn unlink_meeting_teacher(meeting: &mut Meeting, teacher: &mut Teacher) -> bool {
    let listed = remove_id(teacher.meetings_mut(), meeting.id);
    let pointed = meeting.teacher() == Some(teacher.id);
    if pointed {
        meeting.set_teacher(None);
    }
    listed && pointed
}

/// Binds `user` to `student` one-to-one.
///
/// Returns `false` when already bound to each other, or when the user belongs
/// to a different person (nothing is changed in that case).
pub fn link_user_student(user: &mut User, student: &mut Student) -> bool {
    if user.student() == Some(student.id) && student.user() == Some(user.id) {
        return false;
    }
    if user.teacher().is_some() || user.student().is_some_and(|id| id != student.id) {
        return false;
    }
    user.set_student(Some(student.id));
    student.set_user(Some(user.id));
    true
}

pub fn unlink_user_student(user: &mut User, student: &mut Student) -> bool {
    let user_side = user.student() == Some(student.id);
    let student_side = student.user() == Some(user.id);
    if user_side {
        user.set_student(None);
    }
    if student_side {
        student.set_user(None);
    }
    user_side && student_side
}

/// Binds `user` to `teacher`; same contract as [`link_user_student`].
pub fn link_user_teacher(user: &mut User, teacher: &mut Teacher) -> bool {
    if user.teacher() == Some(teacher.id) && teacher.user() == Some(user.id) {
        return false;
    }
    if user.student().is_some() || user.teacher().is_some_and(|id| id != teacher.id) {
        return false;
    }
    user.set_teacher(Some(teacher.id));
    teacher.set_user(Some(user.id));
    true
}

pub fn unlink_user_teacher(user: &mut User, teacher: &mut Teacher) -> bool {
    let user_side = user.teacher() == Some(teacher.id);
    let teacher_side = teacher.user() == Some(user.id);
    if user_side {
        user.set_teacher(None);
    }
    if teacher_side {
        teacher.set_user(None);
    }
    user_side && teacher_side
}

fn push_unique(ids: &mut Vec<RecordId>, id: RecordId) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}

fn remove_id(ids: &mut Vec<RecordId>, id: RecordId) -> bool {
    let before = ids.len();
    ids.retain(|current| *current != id);
    ids.len() != before
}
