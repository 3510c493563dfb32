//! Marks ledger use-case service.
//!
//! # Responsibility
//! - Record FAT marks with full-replacement upsert semantics.
//! - Record SAT marks and enforce the one-way submission lock.
//!
//! # Invariants
//! - Internal marks are never locked.
//! - Per `(student, subject)` SAT state: `UNSUBMITTED --save--> UNSUBMITTED`,
//!   `UNSUBMITTED --submit(subject)--> SUBMITTED`; `SUBMITTED` is terminal and
//!   every later save fails with `AlreadySubmitted` leaving `marks` unchanged.
//! - Submission is subject-wide and idempotent.
//! - Validation and existence checks run before any write.

use super::error::{ServiceError, ServiceResult};
use crate::model::marks::{InternalMarks, SatMarks};
use crate::repo::marks_repo::MarksRepository;
use crate::repo::roster_repo::RosterRepository;
use crate::repo::EntityKind;
use log::{info, warn};

/// Ledger over FAT and SAT marks.
///
/// Marks are stored raw on a 0..=100 scale; weighting happens when a result
/// is computed.
pub struct MarksLedger<M: MarksRepository, R: RosterRepository> {
    marks: M,
    roster: R,
}

impl<M: MarksRepository, R: RosterRepository> MarksLedger<M, R> {
    pub fn new(marks: M, roster: R) -> Self {
        Self { marks, roster }
    }

    /// Saves one FAT record, replacing any record with the same
    /// `(student, subject, fat_number)`.
    pub fn save_internal(
        &self,
        student_id: &str,
        subject_id: &str,
        fat_number: u8,
        fat_marks: f64,
        assignments: Vec<f64>,
    ) -> ServiceResult<InternalMarks> {
        let record = InternalMarks {
            student_id: student_id.to_string(),
            subject_id: subject_id.to_string(),
            fat_number,
            fat_marks,
            assignments,
        };
        record.validate()?;
        self.ensure_enrolled_pair(student_id, subject_id)?;

        self.marks.upsert_internal_marks(&record)?;
        info!(
            "event=internal_save module=marks_ledger status=ok student_id={} subject_id={} fat_number={}",
            student_id, subject_id, fat_number
        );
        Ok(record)
    }

    /// Saves SAT marks unless the pair is already submitted.
    ///
    /// # Errors
    /// - `Validation` when `marks` is outside `[0, 100]`.
    /// - `NotFound` when the student or subject does not exist.
    /// - `AlreadySubmitted` when the stored record is locked.
    pub fn save_external(
        &self,
        student_id: &str,
        subject_id: &str,
        marks: f64,
    ) -> ServiceResult<SatMarks> {
        let record = SatMarks::draft(student_id, subject_id, marks);
        record.validate()?;
        self.ensure_enrolled_pair(student_id, subject_id)?;

        if !self.marks.save_unsubmitted_sat_marks(&record)? {
            warn!(
                "event=sat_save module=marks_ledger status=rejected student_id={} subject_id={} error_code=already_submitted",
                student_id, subject_id
            );
            return Err(ServiceError::AlreadySubmitted {
                student_id: student_id.to_string(),
                subject_id: subject_id.to_string(),
            });
        }

        info!(
            "event=sat_save module=marks_ledger status=ok student_id={} subject_id={}",
            student_id, subject_id
        );
        Ok(record)
    }

    /// Locks every unsubmitted SAT record of a subject.
    ///
    /// Returns the number of records locked by this call; a repeated call
    /// returns `0` and changes nothing.
    pub fn submit_external(&self, subject_id: &str) -> ServiceResult<usize> {
        if self.roster.get_subject(subject_id)?.is_none() {
            return Err(ServiceError::not_found(EntityKind::Subject, subject_id));
        }

        let locked = self.marks.submit_sat_marks_for_subject(subject_id)?;
        info!(
            "event=sat_submit module=marks_ledger status=ok subject_id={} locked={}",
            subject_id, locked
        );
        Ok(locked)
    }

    /// FAT records of one pair ordered by FAT number.
    pub fn internal_marks(
        &self,
        student_id: &str,
        subject_id: &str,
    ) -> ServiceResult<Vec<InternalMarks>> {
        Ok(self.marks.list_internal_marks(student_id, subject_id)?)
    }

    /// SAT record of one pair, if any.
    pub fn external_marks(
        &self,
        student_id: &str,
        subject_id: &str,
    ) -> ServiceResult<Option<SatMarks>> {
        Ok(self.marks.get_sat_marks(student_id, subject_id)?)
    }

    /// SAT sheet of one subject ordered by student id.
    pub fn subject_external_marks(&self, subject_id: &str) -> ServiceResult<Vec<SatMarks>> {
        Ok(self.marks.list_sat_marks_for_subject(subject_id)?)
    }

    fn ensure_enrolled_pair(&self, student_id: &str, subject_id: &str) -> ServiceResult<()> {
        if self.roster.get_student(student_id)?.is_none() {
            return Err(ServiceError::not_found(EntityKind::Student, student_id));
        }
        if self.roster.get_subject(subject_id)?.is_none() {
            return Err(ServiceError::not_found(EntityKind::Subject, subject_id));
        }
        Ok(())
    }
}
