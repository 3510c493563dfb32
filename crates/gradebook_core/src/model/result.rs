//! Derived per-subject result record.
//!
//! # Invariants
//! - Keyed by `(student_id, subject_id)`; only the result aggregator writes it.
//! - `grade_point` always equals `grade.point()`.
//! - `total == internal + external` and never exceeds 100.

use super::marks::MAX_RAW_MARKS;
use super::{require_range, require_text, RecordValidationError};
use crate::grading::Grade;
use serde::{Deserialize, Serialize};

const TOTAL_TOLERANCE: f64 = 1e-9;

/// Classification label of a result, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultCategory {
    /// Subject taken in its scheduled semester.
    Regular,
    /// Re-attempt of a previously failed subject.
    Backlog,
    /// Value-added course.
    ValueAdded,
    /// Open elective outside the home department.
    OpenElective,
}

impl ResultCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Backlog => "backlog",
            Self::ValueAdded => "value_added",
            Self::OpenElective => "open_elective",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "regular" => Some(Self::Regular),
            "backlog" => Some(Self::Backlog),
            "value_added" => Some(Self::ValueAdded),
            "open_elective" => Some(Self::OpenElective),
            _ => None,
        }
    }
}

/// Graded outcome of one subject for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResult {
    pub student_id: String,
    pub subject_id: String,
    pub semester: u32,
    pub internal: f64,
    pub external: f64,
    pub total: f64,
    pub grade: Grade,
    pub grade_point: u8,
    pub category: ResultCategory,
}

impl SubjectResult {
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        require_text("studentId", &self.student_id)?;
        require_text("subjectId", &self.subject_id)?;
        if self.semester == 0 {
            return Err(RecordValidationError::OutOfRange {
                field: "semester",
                value: 0.0,
                min: 1.0,
                max: f64::from(u32::MAX),
            });
        }
        require_range("internal", self.internal, 0.0, f64::MAX)?;
        require_range("external", self.external, 0.0, f64::MAX)?;
        require_range("total", self.total, 0.0, MAX_RAW_MARKS + TOTAL_TOLERANCE)?;
        if (self.internal + self.external - self.total).abs() > TOTAL_TOLERANCE {
            return Err(RecordValidationError::InvalidFormat {
                field: "total",
                value: self.total.to_string(),
            });
        }
        if self.grade_point != self.grade.point() {
            return Err(RecordValidationError::InvalidFormat {
                field: "gradePoint",
                value: self.grade_point.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ResultCategory, SubjectResult};
    use crate::grading::Grade;
    use crate::model::RecordValidationError;

    #[test]
    fn category_labels_roundtrip() {
        for category in [
            ResultCategory::Regular,
            ResultCategory::Backlog,
            ResultCategory::ValueAdded,
            ResultCategory::OpenElective,
        ] {
            assert_eq!(ResultCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(ResultCategory::parse("elective"), None);
    }

    #[test]
    fn mismatched_grade_point_is_rejected() {
        let result = SubjectResult {
            student_id: "2024CS0001".to_string(),
            subject_id: "1".to_string(),
            semester: 1,
            internal: 30.0,
            external: 50.0,
            total: 80.0,
            grade: Grade::APlus,
            grade_point: 8,
            category: ResultCategory::Regular,
        };
        assert!(result.validate().is_err());

        let fixed = SubjectResult {
            grade_point: 9,
            ..result
        };
        assert!(fixed.validate().is_ok());
    }

    #[test]
    fn total_above_hundred_is_rejected() {
        let result = SubjectResult {
            student_id: "2024CS0001".to_string(),
            subject_id: "1".to_string(),
            semester: 1,
            internal: 40.0,
            external: 100.0,
            total: 140.0,
            grade: Grade::O,
            grade_point: 10,
            category: ResultCategory::Regular,
        };
        assert!(matches!(
            result.validate(),
            Err(RecordValidationError::OutOfRange { field: "total", .. })
        ));

        let capped = SubjectResult {
            external: 60.0,
            total: 100.0,
            ..result
        };
        assert!(capped.validate().is_ok());
    }
}
