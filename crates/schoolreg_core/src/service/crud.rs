//! Pre-condition checks shared by every entity service.
//!
//! Each helper runs against a store that is already inside the caller's
//! transaction, so a check and the write that follows it are atomic.

use super::error::{Lookup, ServiceError, ServiceResult};
use crate::model::record::{Record, RecordId};
use crate::model::user::{User, UserOwner};
use crate::repo::{RepoError, Store};
use log::warn;

/// Loads a record by id or fails with `NotFound`.
pub(crate) fn require<R: Record, S: Store>(store: &S, id: RecordId) -> ServiceResult<R> {
    store
        .find_by_id::<R>(id)?
        .ok_or(ServiceError::NotFound {
            kind: R::KIND,
            lookup: Lookup::Id(id),
        })
}

/// Loads a record by unique key or fails with `NotFound`.
pub(crate) fn require_key<R: Record, S: Store>(store: &S, key: &str) -> ServiceResult<R> {
    store
        .find_by_unique_field::<R>(key)?
        .ok_or_else(|| ServiceError::NotFound {
            kind: R::KIND,
            lookup: Lookup::Key(key.to_string()),
        })
}

/// Resolves an optional foreign reference by unique key.
pub(crate) fn resolve_key<R: Record, S: Store>(
    store: &S,
    key: Option<&str>,
) -> ServiceResult<Option<R>> {
    key.map(|key| require_key::<R, S>(store, key)).transpose()
}

/// Fails with `Duplicate` when a record other than `except` holds `key`.
pub(crate) fn ensure_unique<R: Record, S: Store>(
    store: &S,
    key: &str,
    except: RecordId,
) -> ServiceResult<()> {
    match store.find_by_unique_field::<R>(key)? {
        Some(existing) if existing.record_id() != except => Err(ServiceError::Duplicate {
            kind: R::KIND,
            key: key.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Saves a new record and checks the store assigned an id.
pub(crate) fn insert_new<R: Record, S: Store>(store: &mut S, record: R) -> ServiceResult<R> {
    let saved = store.save(record)?;
    if !saved.is_persisted() {
        return Err(ServiceError::Persistence {
            kind: R::KIND,
            reason: "store returned no id for inserted record".to_string(),
        });
    }
    Ok(saved)
}

/// Turns an empty listing into `EmptyCollection`.
pub(crate) fn non_empty<R: Record>(records: Vec<R>) -> ServiceResult<Vec<R>> {
    if records.is_empty() {
        return Err(ServiceError::EmptyCollection { kind: R::KIND });
    }
    Ok(records)
}

/// Resolves a user by username and checks it is free for `claimant`.
///
/// `claimant` is the person that may already own the user (on update);
/// `None` means the user must be unowned.
pub(crate) fn resolve_free_user<S: Store>(
    store: &S,
    username: Option<&str>,
    claimant: Option<UserOwner>,
) -> ServiceResult<Option<User>> {
    let Some(user) = resolve_key::<User, S>(store, username)? else {
        return Ok(None);
    };
    match user.owner() {
        Some(owner) if Some(owner) != claimant => Err(ServiceError::UserAlreadyOwned {
            username: user.username.clone(),
            owner,
        }),
        _ => Ok(Some(user)),
    }
}

/// Deletes the user of a person that is itself being deleted.
///
/// A user that is already gone is logged and skipped.
pub(crate) fn delete_owned_user<S: Store>(
    store: &mut S,
    owner: UserOwner,
    user_id: RecordId,
) -> ServiceResult<()> {
    match store.delete_by_id::<User>(user_id) {
        Err(RepoError::NotFound { .. }) => {
            warn!(
                "event={}_delete module=service status=dangling owner_id={} user_id={user_id}",
                owner.kind(),
                owner.id()
            );
            Ok(())
        }
        other => other.map_err(ServiceError::from),
    }
}
