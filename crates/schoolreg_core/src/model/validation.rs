//! Field-level invariants shared by every record type.
//!
//! # Responsibility
//! - Define the error returned when a record violates a storage invariant.
//! - Provide small length/blank checks used by `Record::validate`.
//!
//! # Invariants
//! - Lengths are measured in Unicode scalar values, not bytes.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Record-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty or whitespace only.
    Blank { field: &'static str },
    /// Text field length falls outside `min..=max`.
    Length {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },
    /// Text field must be lowercase but is not.
    NotLowercase { field: &'static str },
    /// Gender code other than `M` or `F`.
    UnknownGender(String),
    /// Date or timestamp text does not match the expected pattern.
    InvalidDate {
        value: String,
        expected_format: &'static str,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank { field } => write!(f, "`{field}` must not be blank"),
            Self::Length {
                field,
                min,
                max,
                actual,
            } => {
                if min == max {
                    write!(f, "`{field}` must be exactly {min} characters, got {actual}")
                } else {
                    write!(
                        f,
                        "`{field}` must be between {min} and {max} characters, got {actual}"
                    )
                }
            }
            Self::NotLowercase { field } => write!(f, "`{field}` must be lowercase"),
            Self::UnknownGender(code) => {
                write!(f, "unknown gender code `{code}`; expected M|F")
            }
            Self::InvalidDate {
                value,
                expected_format,
            } => write!(f, "invalid date `{value}`; expected {expected_format}"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_not_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    Ok(())
}

pub(crate) fn require_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual < min || actual > max {
        return Err(ValidationError::Length {
            field,
            min,
            max,
            actual,
        });
    }
    Ok(())
}
