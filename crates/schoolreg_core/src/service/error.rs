//! Orchestrator error taxonomy.
//!
//! # Invariants
//! - `Persistence` and `Repo` mark infrastructure defects; every other
//!   variant is an expected, caller-recoverable outcome.
//! - A returned error means no write of that operation is visible.

use crate::model::record::{EntityKind, RecordId};
use crate::model::user::UserOwner;
use crate::model::validation::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// How a missing record was looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Id(RecordId),
    Key(String),
}

impl Display for Lookup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Key(key) => write!(f, "key `{key}`"),
        }
    }
}

#[derive(Debug)]
pub enum ServiceError {
    /// Another record of `kind` already holds `key`.
    Duplicate { kind: EntityKind, key: String },
    /// No record of `kind` matches `lookup`.
    NotFound { kind: EntityKind, lookup: Lookup },
    /// A listing of `kind` matched zero records.
    EmptyCollection { kind: EntityKind },
    /// Store accepted a write but returned no id.
    Persistence { kind: EntityKind, reason: String },
    /// User identity already belongs to another student or teacher.
    UserAlreadyOwned { username: String, owner: UserOwner },
    /// Record cannot be removed while its owner exists.
    StillOwned {
        kind: EntityKind,
        id: RecordId,
        owner: UserOwner,
    },
    Validation(ValidationError),
    Repo(RepoError),
}

impl ServiceError {
    /// Whether this error signals a storage defect rather than bad input.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Persistence { .. } | Self::Repo(_))
    }

    /// Stable short code for log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Duplicate { .. } => "duplicate",
            Self::NotFound { .. } => "not_found",
            Self::EmptyCollection { .. } => "empty_collection",
            Self::Persistence { .. } => "persistence",
            Self::UserAlreadyOwned { .. } => "user_already_owned",
            Self::StillOwned { .. } => "still_owned",
            Self::Validation(_) => "validation",
            Self::Repo(_) => "repo",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duplicate { kind, key } => write!(f, "{kind} `{key}` already exists"),
            Self::NotFound { kind, lookup } => write!(f, "{kind} with {lookup} does not exist"),
            Self::EmptyCollection { kind } => write!(f, "no {kind} records found"),
            Self::Persistence { kind, reason } => {
                write!(f, "storage error while writing {kind}: {reason}")
            }
            Self::UserAlreadyOwned { username, owner } => write!(
                f,
                "user `{username}` already belongs to {} {}",
                owner.kind(),
                owner.id()
            ),
            Self::StillOwned { kind, id, owner } => write!(
                f,
                "{kind} {id} is still owned by {} {}",
                owner.kind(),
                owner.id()
            ),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UniqueViolation { kind, key } => Self::Duplicate { kind, key },
            RepoError::NotFound { kind, id } => Self::NotFound {
                kind,
                lookup: Lookup::Id(id),
            },
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
