//! Identifier allocation scopes.
//!
//! # Invariants
//! - Department codes are uppercase alphanumeric, start with a letter and are
//!   never the literal `T` reserved for teacher ids.
//! - Collection names are lowercase snake-case table names.
//! - `counter_key()` is unique per scope and stable across releases.

use super::RecordValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};

static DEPARTMENT_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9]*$").expect("valid department code regex"));
static COLLECTION_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid collection name regex"));

/// Literal scope code embedded in teacher identifiers.
pub const TEACHER_SCOPE_CODE: &str = "T";

/// Grouping within which sequence numbers are unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdScope {
    /// Students of one department: `<year><code><seq:04>`.
    Department(String),
    /// All teachers: `<year>T<seq:04>`.
    Teacher,
    /// Plain incrementing integer per collection.
    Collection(String),
}

impl IdScope {
    pub fn department(code: impl Into<String>) -> Self {
        Self::Department(code.into())
    }

    pub fn collection(name: impl Into<String>) -> Self {
        Self::Collection(name.into())
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        match self {
            Self::Department(code) => {
                if code == TEACHER_SCOPE_CODE || !DEPARTMENT_CODE_RE.is_match(code) {
                    return Err(RecordValidationError::InvalidFormat {
                        field: "departmentCode",
                        value: code.clone(),
                    });
                }
                Ok(())
            }
            Self::Teacher => Ok(()),
            Self::Collection(name) => {
                if !COLLECTION_NAME_RE.is_match(name) {
                    return Err(RecordValidationError::InvalidFormat {
                        field: "collection",
                        value: name.clone(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Key of the persisted counter row for this scope.
    pub fn counter_key(&self) -> String {
        match self {
            Self::Department(code) => format!("student:{code}"),
            Self::Teacher => "teacher".to_string(),
            Self::Collection(name) => format!("collection:{name}"),
        }
    }
}

impl Display for IdScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.counter_key())
    }
}

#[cfg(test)]
mod tests {
    use super::IdScope;

    #[test]
    fn department_codes_are_uppercase_and_not_teacher_literal() {
        assert!(IdScope::department("CS").validate().is_ok());
        assert!(IdScope::department("EC2").validate().is_ok());
        assert!(IdScope::department("cs").validate().is_err());
        assert!(IdScope::department("T").validate().is_err());
        assert!(IdScope::department("").validate().is_err());
    }

    #[test]
    fn collection_names_are_snake_case() {
        assert!(IdScope::collection("subjects").validate().is_ok());
        assert!(IdScope::collection("subjects; DROP TABLE x").validate().is_err());
    }

    #[test]
    fn counter_keys_do_not_collide_across_kinds() {
        assert_eq!(IdScope::department("CS").counter_key(), "student:CS");
        assert_eq!(IdScope::Teacher.counter_key(), "teacher");
        assert_eq!(IdScope::collection("CS").counter_key(), "collection:CS");
    }
}
