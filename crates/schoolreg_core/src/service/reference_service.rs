//! City and speciality registries.
//!
//! # Responsibility
//! - Keep a flat set of uniquely named lookup values.
//! - Detach holders (students or teachers) when a value is deleted.
//!
//! # Invariants
//! - Names are unique, compared exactly and case-sensitively.
//! - Deleting a value never deletes the records that referenced it.

use super::crud::{ensure_unique, insert_new, non_empty, require, require_key};
use super::error::ServiceResult;
use super::registry::SchoolRegistry;
use crate::model::city::City;
use crate::model::record::{Record, RecordId, UNPERSISTED_ID};
use crate::model::speciality::Speciality;
use crate::model::student::Student;
use crate::model::teacher::Teacher;
use crate::relation::engine::{unlink_city_student, unlink_speciality_teacher};
use crate::repo::{RepoResult, Store};
use log::warn;
use std::marker::PhantomData;

mod sealed {
    pub trait Sealed {}

    impl Sealed for crate::model::city::City {}
    impl Sealed for crate::model::speciality::Speciality {}
}

/// Named lookup value held by a [`ReferenceService`].
pub trait Reference: Record + sealed::Sealed {
    fn named(name: String) -> Self;

    fn name(&self) -> &str;

    fn set_name(&mut self, name: String);

    /// Clears every holder's pointer to this value and saves the holders.
    fn detach_holders<S: Store>(&mut self, store: &mut S) -> RepoResult<()>;
}

impl Reference for City {
    fn named(name: String) -> Self {
        City::new(name)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn detach_holders<S: Store>(&mut self, store: &mut S) -> RepoResult<()> {
        for student_id in self.students().to_vec() {
            match store.find_by_id::<Student>(student_id)? {
                Some(mut student) => {
                    unlink_city_student(self, &mut student);
                    store.save(student)?;
                }
                None => {
                    warn!(
                        "event=city_delete module=service status=dangling city_id={} student_id={student_id}",
                        self.id
                    );
                    self.students_mut().retain(|id| *id != student_id);
                }
            }
        }
        Ok(())
    }
}

impl Reference for Speciality {
    fn named(name: String) -> Self {
        Speciality::new(name)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn detach_holders<S: Store>(&mut self, store: &mut S) -> RepoResult<()> {
        for teacher_id in self.teachers().to_vec() {
            match store.find_by_id::<Teacher>(teacher_id)? {
                Some(mut teacher) => {
                    unlink_speciality_teacher(self, &mut teacher);
                    store.save(teacher)?;
                }
                None => {
                    warn!(
                        "event=speciality_delete module=service status=dangling speciality_id={} teacher_id={teacher_id}",
                        self.id
                    );
                    self.teachers_mut().retain(|id| *id != teacher_id);
                }
            }
        }
        Ok(())
    }
}

/// Use-case facade over one reference kind.
pub struct ReferenceService<'r, S: Store, R: Reference> {
    registry: &'r SchoolRegistry<S>,
    _kind: PhantomData<R>,
}

pub type CityService<'r, S> = ReferenceService<'r, S, City>;
pub type SpecialityService<'r, S> = ReferenceService<'r, S, Speciality>;

impl<'r, S: Store, R: Reference> ReferenceService<'r, S, R> {
    pub(crate) fn new(registry: &'r SchoolRegistry<S>) -> Self {
        Self {
            registry,
            _kind: PhantomData,
        }
    }

    /// Adds a value.
    ///
    /// # Errors
    /// - `Duplicate` when the exact name is already taken.
    /// - `Validation` when the name violates length bounds.
    pub fn create(&self, name: impl Into<String>) -> ServiceResult<R> {
        let name = name.into();
        self.registry.run(R::KIND.label(), "create", |store| {
            ensure_unique::<R, S>(store, &name, UNPERSISTED_ID)?;
            insert_new(store, R::named(name))
        })
    }

    /// Changes the name of an existing value. Holders keep pointing at it.
    ///
    /// # Errors
    /// - `NotFound` when `id` is unknown.
    /// - `Duplicate` when another value already holds `name`.
    pub fn rename(&self, id: RecordId, name: impl Into<String>) -> ServiceResult<R> {
        let name = name.into();
        self.registry.run(R::KIND.label(), "rename", |store| {
            let mut value = require::<R, S>(store, id)?;
            ensure_unique::<R, S>(store, &name, id)?;
            value.set_name(name);
            Ok(store.save(value)?)
        })
    }

    /// Removes a value and clears the references of its holders.
    ///
    /// Returns the value as it was before deletion.
    pub fn delete(&self, id: RecordId) -> ServiceResult<R> {
        self.registry.run(R::KIND.label(), "delete", |store| {
            let mut value = require::<R, S>(store, id)?;
            let snapshot = value.clone();
            value.detach_holders(store)?;
            store.delete_by_id::<R>(id)?;
            Ok(snapshot)
        })
    }

    pub fn get_by_id(&self, id: RecordId) -> ServiceResult<R> {
        self.registry
            .run(R::KIND.label(), "get_by_id", |store| require::<R, S>(store, id))
    }

    pub fn get_by_name(&self, name: &str) -> ServiceResult<R> {
        self.registry.run(R::KIND.label(), "get_by_name", |store| {
            require_key::<R, S>(store, name)
        })
    }

    /// Every value in id order.
    ///
    /// # Errors
    /// - `EmptyCollection` when there are none.
    pub fn list_all(&self) -> ServiceResult<Vec<R>> {
        self.registry
            .run(R::KIND.label(), "list_all", |store| non_empty(store.find_all()?))
    }
}
