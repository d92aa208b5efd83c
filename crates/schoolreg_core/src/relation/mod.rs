//! Relationship engine.
//!
//! # Responsibility
//! - Attach and detach aggregates across every bidirectional relation.
//! - Detect records whose two sides of a relation disagree.
//!
//! # Invariants
//! - A link call never creates a duplicate entry; repeating it returns `false`.
//! - An unlink call always clears both sides, and returns `false` when the
//!   sides disagreed beforehand.

pub mod audit;
pub mod engine;
