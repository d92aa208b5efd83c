//! Whole-registry consistency scan.
//!
//! # Responsibility
//! - Report every relation whose two sides disagree, or that points at a
//!   missing record.
//!
//! # Invariants
//! - The scan is read-only and reports in a deterministic order
//!   (relation by relation, records in id order).

use crate::model::city::City;
use crate::model::meeting::Meeting;
use crate::model::record::{EntityKind, RecordId};
use crate::model::speciality::Speciality;
use crate::model::student::Student;
use crate::model::teacher::Teacher;
use crate::model::user::User;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Full read of every aggregate, as loaded from one store transaction.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub cities: Vec<City>,
    pub specialities: Vec<Speciality>,
    pub users: Vec<User>,
    pub students: Vec<Student>,
    pub teachers: Vec<Teacher>,
    pub meetings: Vec<Meeting>,
}

/// One broken relation edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// `from` references `to`, but `to` does not exist.
    Dangling {
        from: (EntityKind, RecordId),
        to: (EntityKind, RecordId),
    },
    /// `from` references `to`, but `to` does not reference `from` back.
    OneSided {
        from: (EntityKind, RecordId),
        to: (EntityKind, RecordId),
    },
    /// User is bound to a student and a teacher at once.
    DoublyOwnedUser(RecordId),
}

impl Display for Inconsistency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dangling { from, to } => write!(
                f,
                "{} {} references missing {} {}",
                from.0, from.1, to.0, to.1
            ),
            Self::OneSided { from, to } => write!(
                f,
                "{} {} references {} {} without a reverse link",
                from.0, from.1, to.0, to.1
            ),
            Self::DoublyOwnedUser(id) => {
                write!(f, "user {id} is owned by a student and a teacher")
            }
        }
    }
}

/// Scans `snapshot` and returns every inconsistency found.
pub fn audit(snapshot: &Snapshot) -> Vec<Inconsistency> {
    let cities = index(&snapshot.cities, |city| city.id);
    let specialities = index(&snapshot.specialities, |speciality| speciality.id);
    let users = index(&snapshot.users, |user| user.id);
    let students = index(&snapshot.students, |student| student.id);
    let teachers = index(&snapshot.teachers, |teacher| teacher.id);
    let meetings = index(&snapshot.meetings, |meeting| meeting.id);

    let mut found = Vec::new();

    for city in cities.values() {
        for student_id in city.students() {
            let back = students
                .get(student_id)
                .map(|student| student.city() == Some(city.id));
            check(
                &mut found,
                (EntityKind::City, city.id),
                (EntityKind::Student, *student_id),
                back,
            );
        }
    }
    for speciality in specialities.values() {
        for teacher_id in speciality.teachers() {
            let back = teachers
                .get(teacher_id)
                .map(|teacher| teacher.speciality() == Some(speciality.id));
            check(
                &mut found,
                (EntityKind::Speciality, speciality.id),
                (EntityKind::Teacher, *teacher_id),
                back,
            );
        }
    }

    for student in students.values() {
        let from = (EntityKind::Student, student.id);
        if let Some(city_id) = student.city() {
            let back = cities
                .get(&city_id)
                .map(|city| city.students().contains(&student.id));
            check(&mut found, from, (EntityKind::City, city_id), back);
        }
        if let Some(user_id) = student.user() {
            let back = users
                .get(&user_id)
                .map(|user| user.student() == Some(student.id));
            check(&mut found, from, (EntityKind::User, user_id), back);
        }
        for meeting_id in student.meetings() {
            let back = meetings
                .get(meeting_id)
                .map(|meeting| meeting.students().contains(&student.id));
            check(&mut found, from, (EntityKind::Meeting, *meeting_id), back);
        }
    }

    for teacher in teachers.values() {
        let from = (EntityKind::Teacher, teacher.id);
        if let Some(speciality_id) = teacher.speciality() {
            let back = specialities
                .get(&speciality_id)
                .map(|speciality| speciality.teachers().contains(&teacher.id));
            check(&mut found, from, (EntityKind::Speciality, speciality_id), back);
        }
        if let Some(user_id) = teacher.user() {
            let back = users
                .get(&user_id)
                .map(|user| user.teacher() == Some(teacher.id));
            check(&mut found, from, (EntityKind::User, user_id), back);
        }
        for meeting_id in teacher.meetings() {
            let back = meetings
                .get(meeting_id)
                .map(|meeting| meeting.teacher() == Some(teacher.id));
            check(&mut found, from, (EntityKind::Meeting, *meeting_id), back);
        }
    }

    for meeting in meetings.values() {
        let from = (EntityKind::Meeting, meeting.id);
        if let Some(teacher_id) = meeting.teacher() {
            let back = teachers
                .get(&teacher_id)
                .map(|teacher| teacher.meetings().contains(&meeting.id));
            check(&mut found, from, (EntityKind::Teacher, teacher_id), back);
        }
        for student_id in meeting.students() {
            let back = students
                .get(student_id)
                .map(|student| student.meetings().contains(&meeting.id));
            check(&mut found, from, (EntityKind::Student, *student_id), back);
        }
    }

    for user in users.values() {
        let from = (EntityKind::User, user.id);
        if user.student().is_some() && user.teacher().is_some() {
            found.push(Inconsistency::DoublyOwnedUser(user.id));
        }
        if let Some(student_id) = user.student() {
            let back = students
                .get(&student_id)
                .map(|student| student.user() == Some(user.id));
            check(&mut found, from, (EntityKind::Student, student_id), back);
        }
        if let Some(teacher_id) = user.teacher() {
            let back = teachers
                .get(&teacher_id)
                .map(|teacher| teacher.user() == Some(user.id));
            check(&mut found, from, (EntityKind::Teacher, teacher_id), back);
        }
    }

    found
}

fn check(
    found: &mut Vec<Inconsistency>,
    from: (EntityKind, RecordId),
    to: (EntityKind, RecordId),
    back: Option<bool>,
) {
    match back {
        None => found.push(Inconsistency::Dangling { from, to }),
        Some(false) => found.push(Inconsistency::OneSided { from, to }),
        Some(true) => {}
    }
}

fn index<T>(records: &[T], id_of: impl Fn(&T) -> RecordId) -> BTreeMap<RecordId, &T> {
    records.iter().map(|record| (id_of(record), record)).collect()
}

#[cfg(test)]
mod tests {
    use super::{audit, Inconsistency, Snapshot};
    use crate::model::city::City;
    use crate::model::gender::Gender;
    use crate::model::record::EntityKind;
    use crate::model::student::Student;
    use crate::relation::engine::link_city_student;

    #[test]
    fn linked_pair_is_clean() {
        let mut city = City::with_id(1, "Athens");
        let mut student = Student::with_id(2, "Ana", "Doe", Gender::Female, None);
        link_city_student(&mut city, Some(&mut student));

        let snapshot = Snapshot {
            cities: vec![city],
            students: vec![student],
            ..Snapshot::default()
        };
        assert!(audit(&snapshot).is_empty());
    }

    #[test]
    fn missing_student_is_reported_as_dangling() {
        let mut city = City::with_id(1, "Athens");
        let mut student = Student::with_id(2, "Ana", "Doe", Gender::Female, None);
        link_city_student(&mut city, Some(&mut student));

        let snapshot = Snapshot {
            cities: vec![city],
            ..Snapshot::default()
        };
        assert_eq!(
            audit(&snapshot),
            vec![Inconsistency::Dangling {
                from: (EntityKind::City, 1),
                to: (EntityKind::Student, 2),
            }]
        );
    }
}
