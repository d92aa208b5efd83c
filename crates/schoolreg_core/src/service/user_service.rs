//! Authentication identity store.
//!
//! # Responsibility
//! - Register users under a normalized, unique username.
//! - Replace password hashes; usernames never change after registration.
//!
//! # Invariants
//! - Stored usernames are lowercase.
//! - A user owned by a student or teacher cannot be removed directly; it goes
//!   away with its owner.

use super::crud::{ensure_unique, insert_new, non_empty, require, require_key};
use super::error::{ServiceError, ServiceResult};
use super::registry::SchoolRegistry;
use crate::model::record::{Record, RecordId, UNPERSISTED_ID};
use crate::model::user::{normalize_username, User};
use crate::repo::Store;

const SCOPE: &str = "user";

pub struct UserService<'r, S: Store> {
    registry: &'r SchoolRegistry<S>,
}

impl<'r, S: Store> UserService<'r, S> {
    pub(crate) fn new(registry: &'r SchoolRegistry<S>) -> Self {
        Self { registry }
    }

    /// Registers a new identity. `username` is lowercased before the
    /// uniqueness check, so `Alice` and `alice` collide.
    pub fn register(
        &self,
        username: &str,
        password_hash: impl Into<String>,
    ) -> ServiceResult<User> {
        let username = normalize_username(username);
        let password_hash = password_hash.into();
        self.registry.run(SCOPE, "register", |store| {
            ensure_unique::<User, S>(store, &username, UNPERSISTED_ID)?;
            insert_new(store, User::new(username, password_hash))
        })
    }

    /// Replaces the password hash of user `id`.
    pub fn change_password(
        &self,
        id: RecordId,
        password_hash: impl Into<String>,
    ) -> ServiceResult<User> {
        let password_hash = password_hash.into();
        self.registry.run(SCOPE, "change_password", |store| {
            let mut user = require::<User, S>(store, id)?;
            user.password_hash = password_hash;
            Ok(store.save(user)?)
        })
    }

    /// Removes an unowned user and returns it.
    ///
    /// # Errors
    /// - `NotFound` when `id` is unknown.
    /// - `StillOwned` while a student or teacher holds the user.
    pub fn remove(&self, id: RecordId) -> ServiceResult<User> {
        self.registry.run(SCOPE, "remove", |store| {
            let user = require::<User, S>(store, id)?;
            if let Some(owner) = user.owner() {
                return Err(ServiceError::StillOwned {
                    kind: User::KIND,
                    id,
                    owner,
                });
            }
            store.delete_by_id::<User>(id)?;
            Ok(user)
        })
    }

    pub fn get_by_id(&self, id: RecordId) -> ServiceResult<User> {
        self.registry
            .run(SCOPE, "get_by_id", |store| require::<User, S>(store, id))
    }

    /// Exact match on the stored (lowercase) username.
    pub fn find_by_username(&self, username: &str) -> ServiceResult<User> {
        self.registry.run(SCOPE, "find_by_username", |store| {
            require_key::<User, S>(store, username)
        })
    }

    /// Users whose username starts with `prefix`.
    pub fn find_by_prefix(&self, prefix: &str) -> ServiceResult<Vec<User>> {
        self.registry.run(SCOPE, "find_by_prefix", |store| {
            non_empty(store.find_by_prefix::<User>(prefix)?)
        })
    }

    pub fn list_all(&self) -> ServiceResult<Vec<User>> {
        self.registry
            .run(SCOPE, "list_all", |store| non_empty(store.find_all::<User>()?))
    }
}
