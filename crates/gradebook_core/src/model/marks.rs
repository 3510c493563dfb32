//! Marks records: continuous assessment (FAT) and summative (SAT) scores.
//!
//! # Invariants
//! - `InternalMarks` is keyed by `(student_id, subject_id, fat_number)`;
//!   a write with the same key replaces the previous record.
//! - `SatMarks` is keyed by `(student_id, subject_id)`. `is_submitted` only
//!   moves from `false` to `true`.

use super::{require_range, require_text, RecordValidationError};
use serde::{Deserialize, Serialize};

/// Lowest FAT event number.
pub const MIN_FAT_NUMBER: u8 = 1;
/// Highest FAT event number.
pub const MAX_FAT_NUMBER: u8 = 3;
/// Upper bound of every raw FAT and assignment score.
pub const MAX_RAW_MARKS: f64 = 100.0;
/// Minimum assignment sub-scores per FAT record.
pub const MIN_ASSIGNMENTS: usize = 1;
/// Maximum assignment sub-scores per FAT record.
pub const MAX_ASSIGNMENTS: usize = 5;

/// Continuous-assessment marks for one FAT event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalMarks {
    pub student_id: String,
    pub subject_id: String,
    pub fat_number: u8,
    pub fat_marks: f64,
    /// Ordered assignment sub-scores recorded with this FAT.
    pub assignments: Vec<f64>,
}

impl InternalMarks {
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        require_text("studentId", &self.student_id)?;
        require_text("subjectId", &self.subject_id)?;
        if !(MIN_FAT_NUMBER..=MAX_FAT_NUMBER).contains(&self.fat_number) {
            return Err(RecordValidationError::OutOfRange {
                field: "fatNumber",
                value: f64::from(self.fat_number),
                min: f64::from(MIN_FAT_NUMBER),
                max: f64::from(MAX_FAT_NUMBER),
            });
        }
        require_range("fatMarks", self.fat_marks, 0.0, MAX_RAW_MARKS)?;

        let count = self.assignments.len();
        if !(MIN_ASSIGNMENTS..=MAX_ASSIGNMENTS).contains(&count) {
            return Err(RecordValidationError::InvalidCount {
                field: "assignments",
                count,
                min: MIN_ASSIGNMENTS,
                max: MAX_ASSIGNMENTS,
            });
        }
        for value in &self.assignments {
            require_range("assignments", *value, 0.0, MAX_RAW_MARKS)?;
        }
        Ok(())
    }
}

/// Summative (external) marks for one student in one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SatMarks {
    pub student_id: String,
    pub subject_id: String,
    pub marks: f64,
    pub is_submitted: bool,
}

impl SatMarks {
    /// Creates an unsubmitted SAT record.
    pub fn draft(student_id: impl Into<String>, subject_id: impl Into<String>, marks: f64) -> Self {
        Self {
            student_id: student_id.into(),
            subject_id: subject_id.into(),
            marks,
            is_submitted: false,
        }
    }

    /// Checks shape only; the policy ceiling is enforced by the ledger.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        require_text("studentId", &self.student_id)?;
        require_text("subjectId", &self.subject_id)?;
        require_range("marks", self.marks, 0.0, MAX_RAW_MARKS)
    }
}
