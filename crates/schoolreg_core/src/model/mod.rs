//! Aggregate records for the school registry.
//!
//! # Responsibility
//! - Define the six persisted record shapes and their field invariants.
//! - Expose back-reference collections read-only; mutation is reserved to
//!   `crate::relation`.
//!
//! # Invariants
//! - Relations are stored as record ids, never as nested records.
//! - Every record is identified by a store-assigned `RecordId`.

pub mod city;
pub mod date;
pub mod gender;
pub mod meeting;
pub mod record;
pub mod speciality;
pub mod student;
pub mod teacher;
pub mod user;
pub mod validation;
