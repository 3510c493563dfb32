//! Typed academic records shared by repositories and services.
//!
//! # Responsibility
//! - Define one explicit record type per persisted entity.
//! - Validate records before they cross the persistence boundary.
//!
//! # Invariants
//! - Every record exposes `validate()`; repositories call it on write and
//!   after parsing rows on read.
//! - Numeric marks are always finite.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod identifier;
pub mod marks;
pub mod result;
pub mod roster;

/// Validation failure for one typed record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValidationError {
    /// Required text field is empty or whitespace.
    EmptyField(&'static str),
    /// Numeric field is NaN/inf or outside its allowed closed range.
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Sequence field has too few or too many entries.
    InvalidCount {
        field: &'static str,
        count: usize,
        min: usize,
        max: usize,
    },
    /// Text field does not match its expected shape.
    InvalidFormat { field: &'static str, value: String },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "field `{field}` cannot be empty"),
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "field `{field}` value {value} is outside [{min}, {max}]"),
            Self::InvalidCount {
                field,
                count,
                min,
                max,
            } => write!(
                f,
                "field `{field}` has {count} entries; expected between {min} and {max}"
            ),
            Self::InvalidFormat { field, value } => {
                write!(f, "field `{field}` has invalid value `{value}`")
            }
        }
    }
}

impl Error for RecordValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), RecordValidationError> {
    if value.trim().is_empty() {
        return Err(RecordValidationError::EmptyField(field));
    }
    Ok(())
}

pub(crate) fn require_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), RecordValidationError> {
    if !value.is_finite() || value < min || value > max {
        return Err(RecordValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
