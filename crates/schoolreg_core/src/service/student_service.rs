//! Student use-cases.
//!
//! # Responsibility
//! - Insert, replace and delete students while keeping city, user and meeting
//!   back-references in step.
//! - Resolve city names and usernames given by callers into records.
//!
//! # Invariants
//! - A student's city lists the student; the student's user points back.
//! - Deleting a student deletes its user and removes it from every meeting.

use super::crud::{
    delete_owned_user, insert_new, non_empty, require, resolve_free_user, resolve_key,
};
use super::error::ServiceResult;
use super::registry::SchoolRegistry;
use crate::model::city::City;
use crate::model::gender::Gender;
use crate::model::meeting::Meeting;
use crate::model::record::RecordId;
use crate::model::student::Student;
use crate::model::user::{User, UserOwner};
use crate::relation::engine::{
    link_city_student, link_user_student, unlink_city_student, unlink_meeting_student,
    unlink_user_student,
};
use crate::repo::Store;
use chrono::NaiveDate;
use log::warn;

const SCOPE: &str = "student";

/// Caller input for a student insert or full replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDraft {
    pub firstname: String,
    pub lastname: String,
    pub gender: Gender,
    pub birthdate: Option<NaiveDate>,
    /// City name, resolved to an existing city.
    pub city: Option<String>,
    /// Username of an existing, unowned user.
    pub username: Option<String>,
}

pub struct StudentService<'r, S: Store> {
    registry: &'r SchoolRegistry<S>,
}

impl<'r, S: Store> StudentService<'r, S> {
    pub(crate) fn new(registry: &'r SchoolRegistry<S>) -> Self {
        Self { registry }
    }

    /// Persists a new student and links its city and user.
    ///
    /// # Errors
    /// - `NotFound` naming the city or user that does not exist.
    /// - `UserAlreadyOwned` when the user belongs to someone else.
    /// - `Persistence` when the store assigns no id.
    pub fn insert(&self, draft: StudentDraft) -> ServiceResult<Student> {
        self.registry.run(SCOPE, "insert", |store| {
            let city = resolve_key::<City, S>(store, draft.city.as_deref())?;
            let user = resolve_free_user(store, draft.username.as_deref(), None)?;

            let mut student = insert_new(
                store,
                Student::new(draft.firstname, draft.lastname, draft.gender, draft.birthdate),
            )?;
            move_to_city(store, &mut student, city)?;
            bind_user(store, &mut student, user)?;
            Ok(store.save(student)?)
        })
    }

    /// Replaces every field of student `id`.
    ///
    /// The previous city loses the back-reference; a previous user is
    /// released (not deleted). Meeting membership is kept.
    pub fn update(&self, id: RecordId, draft: StudentDraft) -> ServiceResult<Student> {
        self.registry.run(SCOPE, "update", |store| {
            let mut student = require::<Student, S>(store, id)?;
            let city = resolve_key::<City, S>(store, draft.city.as_deref())?;
            let user = resolve_free_user(
                store,
                draft.username.as_deref(),
                Some(UserOwner::Student(id)),
            )?;

            student.firstname = draft.firstname;
            student.lastname = draft.lastname;
            student.gender = draft.gender;
            student.birthdate = draft.birthdate;
            move_to_city(store, &mut student, city)?;
            bind_user(store, &mut student, user)?;
            Ok(store.save(student)?)
        })
    }

    /// Removes student `id` together with its user.
    ///
    /// Returns the student as it was before deletion.
    pub fn delete(&self, id: RecordId) -> ServiceResult<Student> {
        self.registry.run(SCOPE, "delete", |store| {
            let mut student = require::<Student, S>(store, id)?;
            let snapshot = student.clone();

            move_to_city(store, &mut student, None)?;
            for meeting_id in student.meetings().to_vec() {
                if let Some(mut meeting) = store.find_by_id::<Meeting>(meeting_id)? {
                    unlink_meeting_student(&mut meeting, &mut student);
                    store.save(meeting)?;
                }
            }
            if let Some(user_id) = student.user() {
                delete_owned_user(store, UserOwner::Student(id), user_id)?;
            }
            store.delete_by_id::<Student>(id)?;
            Ok(snapshot)
        })
    }

    pub fn get_by_id(&self, id: RecordId) -> ServiceResult<Student> {
        self.registry
            .run(SCOPE, "get_by_id", |store| require::<Student, S>(store, id))
    }

    /// Students whose lastname starts with `prefix`.
    pub fn find_by_lastname_prefix(&self, prefix: &str) -> ServiceResult<Vec<Student>> {
        self.registry.run(SCOPE, "find_by_lastname_prefix", |store| {
            non_empty(store.find_by_prefix::<Student>(prefix)?)
        })
    }

    pub fn list_all(&self) -> ServiceResult<Vec<Student>> {
        self.registry
            .run(SCOPE, "list_all", |store| non_empty(store.find_all::<Student>()?))
    }
}

/// Re-points `student` from its current city to `target`, saving both cities.
fn move_to_city<S: Store>(
    store: &mut S,
    student: &mut Student,
    target: Option<City>,
) -> ServiceResult<()> {
    let target_id = target.as_ref().map(|city| city.id);
    if student.city() == target_id {
        return Ok(());
    }
    if let Some(current_id) = student.city() {
        match store.find_by_id::<City>(current_id)? {
            Some(mut current) => {
                unlink_city_student(&mut current, student);
                store.save(current)?;
            }
            None => {
                warn!(
                    "event=student_relink module=service status=dangling student_id={} city_id={current_id}",
                    student.id
                );
                student.set_city(None);
            }
        }
    }
    if let Some(mut city) = target {
        link_city_student(&mut city, Some(student));
        store.save(city)?;
    }
    Ok(())
}

/// Releases the current user of `student` and binds `target`, saving both users.
fn bind_user<S: Store>(
    store: &mut S,
    student: &mut Student,
    target: Option<User>,
) -> ServiceResult<()> {
    let target_id = target.as_ref().map(|user| user.id);
    if student.user() == target_id {
        return Ok(());
    }
    if let Some(current_id) = student.user() {
        match store.find_by_id::<User>(current_id)? {
            Some(mut current) => {
                unlink_user_student(&mut current, student);
                store.save(current)?;
            }
            None => student.set_user(None),
        }
    }
    if let Some(mut user) = target {
        link_user_student(&mut user, student);
        store.save(user)?;
    }
    Ok(())
}
