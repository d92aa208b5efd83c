//! Registry entry point for all school record use-cases.
//!
//! # Responsibility
//! - Own the record store and serialize access to it.
//! - Run every use-case as one store transaction and log its outcome.
//!
//! # Invariants
//! - At most one operation touches the store at a time.
//! - An operation that returns `Err` or panics leaves no write behind.

use super::error::{ServiceError, ServiceResult};
use super::meeting_service::MeetingService;
use super::reference_service::{CityService, SpecialityService};
use super::student_service::StudentService;
use super::teacher_service::TeacherService;
use super::user_service::UserService;
use crate::config::RegistryConfig;
use crate::db::open_with_config;
use crate::relation::audit::{audit, Inconsistency, Snapshot};
use crate::repo::{MemoryStore, RepoError, SqliteStore, Store};
use log::{debug, error, info, warn};
use parking_lot::{Mutex, MutexGuard};
use std::time::Instant;

/// School record registry over one store.
pub struct SchoolRegistry<S: Store> {
    store: Mutex<S>,
}

impl SchoolRegistry<SqliteStore> {
    /// Opens a SQLite-backed registry as described by `config`.
    pub fn open(config: &RegistryConfig) -> ServiceResult<Self> {
        let conn = open_with_config(config).map_err(RepoError::from)?;
        Ok(Self::new(SqliteStore::try_new(conn)?))
    }
}

impl SchoolRegistry<MemoryStore> {
    /// Registry over a fresh process-local store.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S: Store> SchoolRegistry<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Releases the underlying store.
    pub fn into_inner(self) -> S {
        self.store.into_inner()
    }

    pub fn cities(&self) -> CityService<'_, S> {
        CityService::new(self)
    }

    pub fn specialities(&self) -> SpecialityService<'_, S> {
        SpecialityService::new(self)
    }

    pub fn users(&self) -> UserService<'_, S> {
        UserService::new(self)
    }

    pub fn students(&self) -> StudentService<'_, S> {
        StudentService::new(self)
    }

    pub fn teachers(&self) -> TeacherService<'_, S> {
        TeacherService::new(self)
    }

    pub fn meetings(&self) -> MeetingService<'_, S> {
        MeetingService::new(self)
    }

    /// Reads every record in one transaction.
    pub fn snapshot(&self) -> ServiceResult<Snapshot> {
        self.run("registry", "snapshot", |store| {
            Ok(Snapshot {
                cities: store.find_all()?,
                specialities: store.find_all()?,
                users: store.find_all()?,
                students: store.find_all()?,
                teachers: store.find_all()?,
                meetings: store.find_all()?,
            })
        })
    }

    /// Lists every broken bidirectional relation. Empty means consistent.
    pub fn audit(&self) -> ServiceResult<Vec<Inconsistency>> {
        let snapshot = self.snapshot()?;
        let found = audit(&snapshot);
        if found.is_empty() {
            debug!("event=registry_audit module=service status=ok inconsistencies=0");
        } else {
            warn!(
                "event=registry_audit module=service status=inconsistent inconsistencies={}",
                found.len()
            );
        }
        Ok(found)
    }

    /// Runs `op` as one atomic unit against the locked store.
    ///
    /// Commits on `Ok`, rolls back on `Err` or panic. The error returned is
    /// always the one produced by `op` (or by commit); a failed rollback is
    /// only logged.
    pub(crate) fn run<T>(
        &self,
        scope: &'static str,
        action: &'static str,
        op: impl FnOnce(&mut S) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let started_at = Instant::now();
        let mut tx = OpenTransaction::begin(self.store.lock(), scope, action)?;

        let outcome = op(&mut *tx.store).and_then(|value| {
            tx.commit()?;
            Ok(value)
        });
        let duration_ms = started_at.elapsed().as_millis();

        match outcome {
            Ok(value) => {
                debug!(
                    "event={scope}_{action} module=service status=ok duration_ms={duration_ms}"
                );
                Ok(value)
            }
            Err(err) => {
                tx.rollback();
                log_failure(scope, action, &err, duration_ms);
                Err(err)
            }
        }
    }
}

/// Store transaction held under the registry lock.
///
/// Dropped while still open (an unwinding `op`), it rolls back so the next
/// call can `begin` again.
struct OpenTransaction<'a, S: Store> {
    store: MutexGuard<'a, S>,
    scope: &'static str,
    action: &'static str,
    open: bool,
}

impl<'a, S: Store> OpenTransaction<'a, S> {
    fn begin(
        mut store: MutexGuard<'a, S>,
        scope: &'static str,
        action: &'static str,
    ) -> ServiceResult<Self> {
        store.begin()?;
        Ok(Self {
            store,
            scope,
            action,
            open: true,
        })
    }

    fn commit(&mut self) -> ServiceResult<()> {
        self.store.commit()?;
        self.open = false;
        Ok(())
    }

    fn rollback(&mut self) {
        self.open = false;
        if let Err(rollback_err) = self.store.rollback() {
            error!(
                "event={}_{} module=service status=error stage=rollback error={rollback_err}",
                self.scope, self.action
            );
        }
    }
}

impl<S: Store> Drop for OpenTransaction<'_, S> {
    fn drop(&mut self) {
        if self.open {
            warn!(
                "event={}_{} module=service status=error stage=unwind",
                self.scope, self.action
            );
            self.rollback();
        }
    }
}

fn log_failure(scope: &str, action: &str, err: &ServiceError, duration_ms: u128) {
    if err.is_infrastructure() {
        error!(
            "event={scope}_{action} module=service status=error error_code={} duration_ms={duration_ms} error={err}",
            err.code()
        );
    } else {
        info!(
            "event={scope}_{action} module=service status=rejected error_code={} duration_ms={duration_ms}",
            err.code()
        );
    }
}
