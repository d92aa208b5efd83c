//! Registry use-case services.
//!
//! # Responsibility
//! - Enforce uniqueness, existence and ownership pre-conditions.
//! - Sever or re-point relations through `relation::engine` on every write.
//!
//! # Invariants
//! - Every public operation runs as one store transaction.
//! - Services never bypass store validation.
//!
//! # See also
//! - `relation::audit` for the whole-registry consistency check.

mod crud;
pub mod error;
pub mod meeting_service;
pub mod reference_service;
pub mod registry;
pub mod student_service;
pub mod teacher_service;
pub mod user_service;

pub use error::{Lookup, ServiceError, ServiceResult};
pub use meeting_service::{MeetingDraft, MeetingService};
pub use reference_service::{CityService, Reference, ReferenceService, SpecialityService};
pub use registry::SchoolRegistry;
pub use student_service::{StudentDraft, StudentService};
pub use teacher_service::{TeacherDraft, TeacherService};
pub use user_service::UserService;
