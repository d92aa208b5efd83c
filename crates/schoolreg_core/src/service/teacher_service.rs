//! Teacher use-cases.
//!
//! # Responsibility
//! - Insert, replace and delete teachers keyed by a unique SSN.
//! - Keep speciality, user and meeting back-references in step.
//!
//! # Invariants
//! - SSNs are unique among teachers.
//! - Deleting a teacher deletes its user and unassigns its meetings; the
//!   meetings themselves survive.

use super::crud::{
    delete_owned_user, ensure_unique, insert_new, non_empty, require, require_key,
    resolve_free_user, resolve_key,
};
use super::error::ServiceResult;
use super::registry::SchoolRegistry;
use crate::model::meeting::Meeting;
use crate::model::record::{RecordId, UNPERSISTED_ID};
use crate::model::speciality::Speciality;
use crate::model::teacher::Teacher;
use crate::model::user::{User, UserOwner};
use crate::relation::engine::{
    link_speciality_teacher, link_user_teacher, unlink_meeting_teacher,
    unlink_speciality_teacher, unlink_user_teacher,
};
use crate::repo::Store;
use log::warn;

const SCOPE: &str = "teacher";

/// Caller input for a teacher insert or full replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherDraft {
    pub ssn: String,
    pub firstname: String,
    pub lastname: String,
    /// Speciality name, resolved to an existing speciality.
    pub speciality: Option<String>,
    /// Username of an existing, unowned user.
    pub username: Option<String>,
}

pub struct TeacherService<'r, S: Store> {
    registry: &'r SchoolRegistry<S>,
}

impl<'r, S: Store> TeacherService<'r, S> {
    pub(crate) fn new(registry: &'r SchoolRegistry<S>) -> Self {
        Self { registry }
    }

    /// Persists a new teacher and links its speciality and user.
    ///
    /// # Errors
    /// - `Duplicate` when the SSN is taken.
    /// - `NotFound` naming the speciality or user that does not exist.
    /// - `UserAlreadyOwned` when the user belongs to someone else.
    pub fn insert(&self, draft: TeacherDraft) -> ServiceResult<Teacher> {
        self.registry.run(SCOPE, "insert", |store| {
            ensure_unique::<Teacher, S>(store, &draft.ssn, UNPERSISTED_ID)?;
            let speciality = resolve_key::<Speciality, S>(store, draft.speciality.as_deref())?;
            let user = resolve_free_user(store, draft.username.as_deref(), None)?;

            let mut teacher = insert_new(
                store,
                Teacher::new(draft.ssn, draft.firstname, draft.lastname),
            )?;
            move_to_speciality(store, &mut teacher, speciality)?;
            bind_user(store, &mut teacher, user)?;
            Ok(store.save(teacher)?)
        })
    }

    /// Replaces every field of teacher `id`, SSN included.
    ///
    /// Meeting assignments are kept; a previous user is released.
    pub fn update(&self, id: RecordId, draft: TeacherDraft) -> ServiceResult<Teacher> {
        self.registry.run(SCOPE, "update", |store| {
            let mut teacher = require::<Teacher, S>(store, id)?;
            ensure_unique::<Teacher, S>(store, &draft.ssn, id)?;
            let speciality = resolve_key::<Speciality, S>(store, draft.speciality.as_deref())?;
            let user = resolve_free_user(
                store,
                draft.username.as_deref(),
                Some(UserOwner::Teacher(id)),
            )?;

            teacher.ssn = draft.ssn;
            teacher.firstname = draft.firstname;
            teacher.lastname = draft.lastname;
            move_to_speciality(store, &mut teacher, speciality)?;
            bind_user(store, &mut teacher, user)?;
            Ok(store.save(teacher)?)
        })
    }

    /// Removes teacher `id` together with its user.
    ///
    /// Returns the teacher as it was before deletion.
    pub fn delete(&self, id: RecordId) -> ServiceResult<Teacher> {
        self.registry.run(SCOPE, "delete", |store| {
            let mut teacher = require::<Teacher, S>(store, id)?;
            let snapshot = teacher.clone();

            move_to_speciality(store, &mut teacher, None)?;
            for meeting_id in teacher.meetings().to_vec() {
                if let Some(mut meeting) = store.find_by_id::<Meeting>(meeting_id)? {
                    unlink_meeting_teacher(&mut meeting, &mut teacher);
                    store.save(meeting)?;
                }
            }
            if let Some(user_id) = teacher.user() {
                delete_owned_user(store, UserOwner::Teacher(id), user_id)?;
            }
            store.delete_by_id::<Teacher>(id)?;
            Ok(snapshot)
        })
    }

    pub fn get_by_id(&self, id: RecordId) -> ServiceResult<Teacher> {
        self.registry
            .run(SCOPE, "get_by_id", |store| require::<Teacher, S>(store, id))
    }

    pub fn get_by_ssn(&self, ssn: &str) -> ServiceResult<Teacher> {
        self.registry
            .run(SCOPE, "get_by_ssn", |store| require_key::<Teacher, S>(store, ssn))
    }

    /// Teachers whose lastname starts with `prefix`.
    pub fn find_by_lastname_prefix(&self, prefix: &str) -> ServiceResult<Vec<Teacher>> {
        self.registry.run(SCOPE, "find_by_lastname_prefix", |store| {
            non_empty(store.find_by_prefix::<Teacher>(prefix)?)
        })
    }

    pub fn list_all(&self) -> ServiceResult<Vec<Teacher>> {
        self.registry
            .run(SCOPE, "list_all", |store| non_empty(store.find_all::<Teacher>()?))
    }
}

fn move_to_speciality<S: Store>(
    store: &mut S,
    teacher: &mut Teacher,
    target: Option<Speciality>,
) -> ServiceResult<()> {
    let target_id = target.as_ref().map(|speciality| speciality.id);
    if teacher.speciality() == target_id {
        return Ok(());
    }
    if let Some(current_id) = teacher.speciality() {
        match store.find_by_id::<Speciality>(current_id)? {
            Some(mut current) => {
                unlink_speciality_teacher(&mut current, teacher);
                store.save(current)?;
            }
            None => {
                warn!(
                    "event=teacher_relink module=service status=dangling teacher_id={} speciality_id={current_id}",
                    teacher.id
                );
                teacher.set_speciality(None);
            }
        }
    }
    if let Some(mut speciality) = target {
        link_speciality_teacher(&mut speciality, Some(teacher));
        store.save(speciality)?;
    }
    Ok(())
}

fn bind_user<S: Store>(
    store: &mut S,
    teacher: &mut Teacher,
    target: Option<User>,
) -> ServiceResult<()> {
    let target_id = target.as_ref().map(|user| user.id);
    if teacher.user() == target_id {
        return Ok(());
    }
    if let Some(current_id) = teacher.user() {
        match store.find_by_id::<User>(current_id)? {
            Some(mut current) => {
                unlink_user_teacher(&mut current, teacher);
                store.save(current)?;
            }
            None => teacher.set_user(None),
        }
    }
    if let Some(mut user) = target {
        link_user_teacher(&mut user, teacher);
        store.save(user)?;
    }
    Ok(())
}
